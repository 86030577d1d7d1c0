//! Stage result record

use super::outcome::OutcomeKind;
use crate::loan::entities::LoanId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable record of one stage attempt for one loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    pub loan_id: LoanId,
    pub outcome: OutcomeKind,
    /// Captured output, already bounded by the runner
    pub output: String,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// Truncated reason for anything other than success
    pub error: Option<String>,
    /// 1-based attempt number
    pub attempt: u32,
    /// Skipped because the stage's completion artifact already existed
    pub resumed: bool,
}

impl StageResult {
    pub fn new(
        stage: impl Into<String>,
        loan_id: impl Into<LoanId>,
        outcome: OutcomeKind,
        output: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            stage: stage.into(),
            loan_id: loan_id.into(),
            outcome,
            output: output.into(),
            duration,
            error: None,
            attempt: 1,
            resumed: false,
        }
    }

    /// Result for a stage skipped on resume.
    pub fn resumed(stage: impl Into<String>, loan_id: impl Into<LoanId>) -> Self {
        let mut result = Self::new(
            stage,
            loan_id,
            OutcomeKind::Success,
            "already completed",
            Duration::ZERO,
        );
        result.resumed = true;
        result
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Short reason for summaries: the error, or the outcome name.
    pub fn reason(&self) -> String {
        match &self.error {
            Some(e) => e.clone(),
            None => self.outcome.as_str().to_string(),
        }
    }
}

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
