//! Domain error types

use crate::stage::outcome::OutcomeKind;
use std::time::Duration;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Concurrency limit must be at least 1")]
    InvalidConcurrency,

    #[error("Sample size must be at least 1")]
    InvalidSampleSize,

    #[error("Loan {0} was not submitted in this batch")]
    UnknownLoan(String),

    #[error("Loan {0} already has a recorded outcome")]
    DuplicateOutcome(String),

    #[error("Pipeline '{pipeline}' has no stage named '{stage}'")]
    UnknownStage { pipeline: String, stage: String },

    #[error("Pipeline '{0}' has no stages")]
    EmptyPipeline(String),
}

/// Per-loan failure taxonomy.
///
/// Every variant is isolated to the loan it happened on: the scheduler records
/// it as that loan's outcome and moves on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    /// Required input documents are absent. Expected, not a defect.
    #[error("No applicable data: {0}")]
    NoApplicableData(String),

    #[error("Stage '{stage}' timed out after {after:?}")]
    Timeout { stage: String, after: Duration },

    #[error("Stage '{stage}' failed: {detail}")]
    StageFailure { stage: String, detail: String },

    #[error("Malformed artifact {path}: {reason}")]
    MalformedArtifact { path: String, reason: String },
}

impl LoanError {
    /// Bucket this error is reported under.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            LoanError::NoApplicableData(_) => OutcomeKind::NoData,
            LoanError::Timeout { .. } => OutcomeKind::Timeout,
            LoanError::StageFailure { .. } | LoanError::MalformedArtifact { .. } => {
                OutcomeKind::Failure
            }
        }
    }
}
