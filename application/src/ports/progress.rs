//! Progress notification port
//!
//! Defines the interface for reporting progress during a batch.

use loanflow_domain::{BatchSummary, LoanId, LoanOutcome, StageResult};

/// Callback for progress updates during batch execution
///
/// Implementations live in the presentation layer. Calls arrive from many
/// loan tasks at once, so implementations must be cheap and thread-safe.
pub trait BatchProgressNotifier: Send + Sync {
    /// Called once before any loan is admitted
    fn on_batch_start(&self, pipeline: &str, total_loans: usize, concurrency: usize);

    /// Called when a loan acquires a slot
    fn on_loan_start(&self, _loan_id: &LoanId) {}

    /// Called after every stage attempt
    fn on_stage_complete(&self, _result: &StageResult) {}

    /// Called when a sampling run finishes
    fn on_sample_complete(&self, _loan_id: &LoanId, _run: u32, _success: bool) {}

    /// Called once per loan with its final outcome
    fn on_loan_complete(&self, outcome: &LoanOutcome);

    /// Called once after every loan has an outcome
    fn on_batch_complete(&self, summary: &BatchSummary);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl BatchProgressNotifier for NoProgress {
    fn on_batch_start(&self, _pipeline: &str, _total_loans: usize, _concurrency: usize) {}
    fn on_loan_complete(&self, _outcome: &LoanOutcome) {}
    fn on_batch_complete(&self, _summary: &BatchSummary) {}
}
