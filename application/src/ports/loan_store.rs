//! Loan store port
//!
//! The document store holds one subtree per loan. Stages write into it;
//! the core only discovers loans and reads or writes a few JSON artifacts.

use loanflow_domain::{
    ArtifactRequirement, ConsistencySample, ConsistencySummary, IncomeTimeline, Loan, LoanError,
    LoanId, StageSpec,
};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Batch-level store errors. Fatal for the invocation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document store root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Cannot read document store root {path}: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-loan artifact errors. Never abort a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    Missing(PathBuf),

    #[error("Malformed artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Cannot write artifact {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Store call did not complete: {0}")]
    Interrupted(String),
}

impl ArtifactError {
    pub fn is_missing(&self) -> bool {
        matches!(self, ArtifactError::Missing(_))
    }
}

impl From<ArtifactError> for LoanError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::Missing(path) => LoanError::NoApplicableData(format!(
                "{} not found",
                path.display()
            )),
            ArtifactError::Malformed { path, reason } | ArtifactError::Write { path, reason } => {
                LoanError::MalformedArtifact {
                    path: path.display().to_string(),
                    reason,
                }
            }
            ArtifactError::Interrupted(reason) => LoanError::MalformedArtifact {
                path: String::new(),
                reason,
            },
        }
    }
}

/// Port for the per-loan document store.
pub trait LoanStorePort: Send + Sync {
    /// Sorted ids of loans whose subtree satisfies `requirement`.
    ///
    /// Unreadable or malformed entries are skipped; only a missing or
    /// unreadable root is an error.
    fn discover(&self, requirement: &ArtifactRequirement) -> Result<Vec<LoanId>, StoreError>;

    /// The loan with one artifact flag per stage that has a completion
    /// artifact configured.
    fn inspect(&self, loan_id: &LoanId, stages: &[StageSpec]) -> Loan;

    /// Whether `pattern` matches at least one file in the loan's subtree.
    fn artifact_exists(&self, loan_id: &LoanId, pattern: &str) -> bool;

    fn load_timeline(&self, loan_id: &LoanId) -> Result<IncomeTimeline, ArtifactError>;

    fn load_consistency_summary(
        &self,
        loan_id: &LoanId,
    ) -> Result<ConsistencySummary, ArtifactError>;

    /// Individual run records, ordered by run number.
    fn load_run_records(&self, loan_id: &LoanId) -> Result<Vec<ConsistencySample>, ArtifactError>;

    /// Remove every run record of the loan, returning how many went.
    fn clear_run_records(&self, loan_id: &LoanId) -> Result<usize, ArtifactError>;

    fn save_run_record(
        &self,
        loan_id: &LoanId,
        run: u32,
        sample: &ConsistencySample,
    ) -> Result<PathBuf, ArtifactError>;

    fn save_consistency_summary(
        &self,
        summary: &ConsistencySummary,
    ) -> Result<PathBuf, ArtifactError>;

    /// Classified income type, `None` when never classified.
    fn load_income_type(&self, loan_id: &LoanId) -> Result<Option<String>, ArtifactError>;
}

/// Run a store call on tokio's blocking pool.
///
/// Store adapters do synchronous file I/O; async use cases go through here
/// so a slow disk never stalls the runtime's worker threads.
pub async fn on_blocking_pool<T, F>(store: &Arc<dyn LoanStorePort>, call: F) -> Result<T, ArtifactError>
where
    T: Send + 'static,
    F: FnOnce(&dyn LoanStorePort) -> T + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || call(store.as_ref()))
        .await
        .map_err(|e| ArtifactError::Interrupted(e.to_string()))
}
