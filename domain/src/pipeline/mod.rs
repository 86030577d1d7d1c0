//! Pipeline definition and per-loan outcome

use crate::core::error::DomainError;
use crate::loan::entities::{ArtifactRequirement, LoanId};
use crate::stage::outcome::OutcomeKind;
use crate::stage::result::{StageResult, duration_ms};
use crate::stage::spec::StageSpec;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ordered stages that must all succeed, in order, for one loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub stages: Vec<StageSpec>,
    /// Artifacts a loan must already have to be eligible
    #[serde(default)]
    pub requires: ArtifactRequirement,
}

impl PipelineDefinition {
    pub fn new(name: impl Into<String>, stages: Vec<StageSpec>) -> Result<Self, DomainError> {
        let name = name.into();
        if stages.is_empty() {
            return Err(DomainError::EmptyPipeline(name));
        }
        Ok(Self {
            name,
            stages,
            requires: ArtifactRequirement::none(),
        })
    }

    pub fn with_requirement(mut self, requires: ArtifactRequirement) -> Self {
        self.requires = requires;
        self
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn stage(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Narrow to the named stages, keeping this pipeline's order.
    pub fn subset(&self, name: impl Into<String>, stages: &[&str]) -> Result<Self, DomainError> {
        for wanted in stages {
            if self.stage(wanted).is_none() {
                return Err(DomainError::UnknownStage {
                    pipeline: self.name.clone(),
                    stage: (*wanted).to_string(),
                });
            }
        }
        let kept = self
            .stages
            .iter()
            .filter(|s| stages.contains(&s.name.as_str()))
            .cloned()
            .collect();
        Ok(Self::new(name, kept)?.with_requirement(self.requires.clone()))
    }
}

/// Final outcome for one loan in one orchestration invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOutcome {
    pub loan_id: LoanId,
    pub outcome: OutcomeKind,
    /// Stage that halted the pipeline, if any
    pub stopped_at: Option<String>,
    /// Truncated reason for anything other than success
    pub reason: Option<String>,
    pub stage_results: Vec<StageResult>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl LoanOutcome {
    /// Fold stage results in execution order into the loan's outcome.
    ///
    /// The first non-success result decides the outcome and names the stage.
    pub fn from_results(
        loan_id: impl Into<LoanId>,
        stage_results: Vec<StageResult>,
        duration: Duration,
    ) -> Self {
        let halting = stage_results.iter().find(|r| !r.is_success());
        let (outcome, stopped_at, reason) = match halting {
            Some(r) => (r.outcome, Some(r.stage.clone()), Some(r.reason())),
            None => (OutcomeKind::Success, None, None),
        };
        Self {
            loan_id: loan_id.into(),
            outcome,
            stopped_at,
            reason,
            stage_results,
            duration,
        }
    }

    /// Outcome recorded without running anything (panic, cancellation, abort).
    pub fn failed(loan_id: impl Into<LoanId>, reason: impl Into<String>) -> Self {
        Self {
            loan_id: loan_id.into(),
            outcome: OutcomeKind::Failure,
            stopped_at: None,
            reason: Some(reason.into()),
            stage_results: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Reason tagged with the halting stage, e.g. `classify: exit code 1`.
    pub fn tagged_reason(&self) -> String {
        match (&self.stopped_at, &self.reason) {
            (Some(stage), Some(reason)) => format!("{}: {}", stage, reason),
            (Some(stage), None) => stage.clone(),
            (None, Some(reason)) => reason.clone(),
            (None, None) => self.outcome.as_str().to_string(),
        }
    }
}
