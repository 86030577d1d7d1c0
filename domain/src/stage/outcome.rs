//! Stage outcome classification

use serde::{Deserialize, Serialize};

/// Classified outcome of a stage, a pipeline, or a whole loan.
///
/// Kinds are mutually exclusive. `Timeout` and `Failure` preempt `Success`
/// and `NoData`: once a loan has timed out it is never reported as
/// successful for the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    NoData,
    Timeout,
    Failure,
}

impl OutcomeKind {
    /// All kinds in reporting order.
    pub const ALL: [OutcomeKind; 4] = [
        OutcomeKind::Success,
        OutcomeKind::NoData,
        OutcomeKind::Timeout,
        OutcomeKind::Failure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::NoData => "no_data",
            OutcomeKind::Timeout => "timeout",
            OutcomeKind::Failure => "failure",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "Successful",
            OutcomeKind::NoData => "No Data",
            OutcomeKind::Timeout => "Timed Out",
            OutcomeKind::Failure => "Failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeKind::Success)
    }

    /// Whether this kind halts a pipeline.
    pub fn halts_pipeline(&self) -> bool {
        !self.is_success()
    }

    /// Whether this kind preempts success/no_data reporting.
    pub fn is_preempting(&self) -> bool {
        matches!(self, OutcomeKind::Timeout | OutcomeKind::Failure)
    }

    /// Combine the current status with a newly observed outcome.
    pub fn merge(self, next: OutcomeKind) -> OutcomeKind {
        if self.is_preempting() {
            self
        } else if next > self {
            next
        } else {
            self
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutcomeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(OutcomeKind::Success),
            "no_data" | "nodata" => Ok(OutcomeKind::NoData),
            "timeout" => Ok(OutcomeKind::Timeout),
            "failure" | "failed" | "error" => Ok(OutcomeKind::Failure),
            other => Err(format!(
                "Unknown outcome: {}. Valid: success, no_data, timeout, failure",
                other
            )),
        }
    }
}

/// Typed terminal state a stage reports back to the runner.
///
/// Timeouts are not a verdict: the runner decides those from the deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum StageVerdict {
    Success,
    /// Required input documents are absent
    NoData(String),
    Failure(String),
}

impl StageVerdict {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            StageVerdict::Success => OutcomeKind::Success,
            StageVerdict::NoData(_) => OutcomeKind::NoData,
            StageVerdict::Failure(_) => OutcomeKind::Failure,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            StageVerdict::Success => None,
            StageVerdict::NoData(d) | StageVerdict::Failure(d) => Some(d),
        }
    }
}

/// What a stage returns: its verdict plus whatever it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub verdict: StageVerdict,
    pub transcript: String,
}

impl StageReport {
    pub fn new(verdict: StageVerdict, transcript: impl Into<String>) -> Self {
        Self {
            verdict,
            transcript: transcript.into(),
        }
    }

    pub fn success(transcript: impl Into<String>) -> Self {
        Self::new(StageVerdict::Success, transcript)
    }

    pub fn no_data(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(StageVerdict::NoData(reason.clone()), reason)
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self::new(StageVerdict::Failure(detail.clone()), detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preempting_kinds_stick() {
        assert_eq!(
            OutcomeKind::Timeout.merge(OutcomeKind::Success),
            OutcomeKind::Timeout
        );
        assert_eq!(
            OutcomeKind::Failure.merge(OutcomeKind::NoData),
            OutcomeKind::Failure
        );
        assert_eq!(
            OutcomeKind::Timeout.merge(OutcomeKind::Failure),
            OutcomeKind::Timeout
        );
    }

    #[test]
    fn test_success_is_overridden() {
        assert_eq!(
            OutcomeKind::Success.merge(OutcomeKind::NoData),
            OutcomeKind::NoData
        );
        assert_eq!(
            OutcomeKind::Success.merge(OutcomeKind::Timeout),
            OutcomeKind::Timeout
        );
        assert_eq!(
            OutcomeKind::NoData.merge(OutcomeKind::Success),
            OutcomeKind::NoData
        );
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("no_data".parse::<OutcomeKind>(), Ok(OutcomeKind::NoData));
        assert_eq!("FAILED".parse::<OutcomeKind>(), Ok(OutcomeKind::Failure));
        assert!("maybe".parse::<OutcomeKind>().is_err());
    }

    #[test]
    fn test_verdict_serde_shape() {
        let json = serde_json::to_value(StageVerdict::NoData("no W2".into())).unwrap();
        assert_eq!(json["status"], "no_data");
        assert_eq!(json["detail"], "no W2");

        let parsed: StageVerdict = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert_eq!(parsed, StageVerdict::Success);
    }
}
