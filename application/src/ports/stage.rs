//! Stage port
//!
//! Defines the interface every pipeline step implements, whether it runs
//! out of process, in process, or on a remote service.

use async_trait::async_trait;
use loanflow_domain::{LoanId, StageReport};
use thiserror::Error;

/// Errors a stage raises instead of reporting a verdict.
///
/// The runner records any of these as a `failure` for the loan.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Failed to start stage: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote stage error: {0}")]
    Remote(String),

    #[error("{0}")]
    Other(String),
}

/// What a stage is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageContext {
    pub loan_id: LoanId,
    /// Optional numeric argument (e.g. number of sampling runs)
    pub parameter: Option<u32>,
    /// 1-based attempt number for this (loan, stage)
    pub attempt: u32,
}

impl StageContext {
    pub fn new(loan_id: impl Into<LoanId>) -> Self {
        Self {
            loan_id: loan_id.into(),
            parameter: None,
            attempt: 1,
        }
    }

    pub fn with_parameter(mut self, parameter: Option<u32>) -> Self {
        self.parameter = parameter;
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = attempt;
        self
    }
}

/// One named unit of per-loan work.
///
/// Implementations never enforce their own deadline; the runner wraps every
/// call in one and drops the future when it expires.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &StageContext) -> Result<StageReport, StageError>;
}
