//! Extraction port
//!
//! One call is one sampling run of the non-deterministic extractor.

use async_trait::async_trait;
use loanflow_domain::{ConsistencySample, LoanId};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// The loan has no documents the extractor can work from
    #[error("No applicable data: {0}")]
    NoApplicableData(String),

    #[error("Extraction failed: {0}")]
    Failed(String),

    #[error("Malformed extraction record: {0}")]
    Malformed(String),

    #[error("Extraction run timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces one structured record per call.
#[async_trait]
pub trait ExtractionPort: Send + Sync {
    /// Run extraction once for `loan_id`. `run` is 1-based.
    async fn extract(
        &self,
        loan_id: &LoanId,
        run: u32,
    ) -> Result<ConsistencySample, ExtractionError>;
}
