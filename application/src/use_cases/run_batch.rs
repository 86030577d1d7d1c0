//! Run Batch use case
//!
//! Concurrency-bounded scheduler: runs many loans' pipelines at once with at
//! most C in flight, and records exactly one outcome per submitted loan.

use crate::ports::event_logger::BatchEvent;
use crate::ports::loan_store::StoreError;
use crate::use_cases::run_pipeline::RunPipelineUseCase;
use futures::FutureExt;
use loanflow_domain::{BatchRun, BatchSummary, DomainError, LoanId, LoanOutcome};
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reason recorded for a loan whose task vanished without an outcome.
const ABORTED_REASON: &str = "task aborted";

/// Errors that can occur during batch execution.
///
/// Only batch-level problems surface here; per-loan problems are outcomes.
#[derive(Error, Debug)]
pub enum RunBatchError {
    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(#[from] DomainError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),
}

/// Input for the RunBatch use case
#[derive(Debug, Clone)]
pub struct RunBatchInput {
    pub loan_ids: Vec<LoanId>,
    pub concurrency: usize,
}

impl RunBatchInput {
    pub fn new<I, T>(loan_ids: I, concurrency: usize) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<LoanId>,
    {
        Self {
            loan_ids: loan_ids.into_iter().map(Into::into).collect(),
            concurrency,
        }
    }
}

/// Output of the RunBatch use case
#[derive(Debug, Clone)]
pub struct RunBatchOutput {
    /// One outcome per distinct submitted id, in submission order
    pub outcomes: Vec<LoanOutcome>,
    pub summary: BatchSummary,
}

/// Use case for running a batch of loans through one pipeline
pub struct RunBatchUseCase {
    pipeline: Arc<RunPipelineUseCase>,
    cancellation_token: Option<CancellationToken>,
}

impl RunBatchUseCase {
    pub fn new(pipeline: Arc<RunPipelineUseCase>) -> Self {
        Self {
            pipeline,
            cancellation_token: None,
        }
    }

    /// Loans not yet finished when the token fires are recorded as failures.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(&self, input: RunBatchInput) -> Result<RunBatchOutput, RunBatchError> {
        let mut run = BatchRun::new(input.loan_ids, input.concurrency)?;
        let pipeline_name = self.pipeline.pipeline().name().to_string();
        let progress = Arc::clone(self.pipeline.progress());
        let logger = Arc::clone(self.pipeline.logger());
        let started = Instant::now();

        info!(
            "Starting batch '{}' with {} loans, concurrency {}",
            pipeline_name,
            run.len(),
            run.concurrency()
        );
        progress.on_batch_start(&pipeline_name, run.len(), run.concurrency());
        logger.log(BatchEvent::new(
            "batch_started",
            json!({
                "pipeline": pipeline_name,
                "loans": run.len(),
                "concurrency": run.concurrency(),
            }),
        ));

        let semaphore = Arc::new(Semaphore::new(run.concurrency()));
        let mut join_set = JoinSet::new();

        for loan_id in run.submitted().to_vec() {
            let semaphore = Arc::clone(&semaphore);
            let pipeline = Arc::clone(&self.pipeline);
            let token = self.cancellation_token.clone();

            join_set.spawn(async move { run_loan(pipeline, semaphore, token, loan_id).await });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    progress.on_loan_complete(&outcome);
                    logger.log(BatchEvent::new(
                        "loan_finished",
                        json!({
                            "pipeline": pipeline_name,
                            "loan_id": outcome.loan_id,
                            "outcome": outcome.outcome,
                            "stopped_at": outcome.stopped_at,
                            "reason": outcome.reason,
                            "duration_ms": outcome.duration.as_millis() as u64,
                        }),
                    ));
                    if let Err(e) = run.record(outcome) {
                        warn!("Discarding outcome: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        if !run.is_complete() {
            warn!(
                "{} loans finished without an outcome; recording as failures",
                run.pending().len()
            );
        }
        let outcomes = run.finalize(ABORTED_REASON);
        let summary = BatchSummary::from_outcomes(&outcomes, started.elapsed());

        info!(
            "Batch '{}' complete: {} succeeded, {} no data, {} timed out, {} failed",
            pipeline_name,
            summary.succeeded.len(),
            summary.no_data.len(),
            summary.timed_out.len(),
            summary.failed.len()
        );
        progress.on_batch_complete(&summary);
        logger.log(BatchEvent::new(
            "batch_finished",
            json!({
                "pipeline": pipeline_name,
                "total": summary.total,
                "success": summary.succeeded.len(),
                "no_data": summary.no_data.len(),
                "timeout": summary.timed_out.len(),
                "failure": summary.failed.len(),
                "duration_ms": summary.duration.as_millis() as u64,
            }),
        ));

        Ok(RunBatchOutput { outcomes, summary })
    }
}

/// One loan's task: acquire a slot, run, release the slot, report.
async fn run_loan(
    pipeline: Arc<RunPipelineUseCase>,
    semaphore: Arc<Semaphore>,
    token: Option<CancellationToken>,
    loan_id: LoanId,
) -> LoanOutcome {
    let token = token.unwrap_or_default();

    let permit = tokio::select! {
        biased;
        _ = token.cancelled() => return LoanOutcome::failed(loan_id, "cancelled before start"),
        permit = semaphore.acquire_owned() => permit,
    };
    let Ok(permit) = permit else {
        return LoanOutcome::failed(loan_id, "scheduler closed");
    };

    pipeline.progress().on_loan_start(&loan_id);
    let execution = AssertUnwindSafe(pipeline.execute(&loan_id)).catch_unwind();
    let result = tokio::select! {
        biased;
        _ = token.cancelled() => None,
        result = execution => Some(result),
    };
    drop(permit);

    match result {
        Some(Ok(outcome)) => outcome,
        Some(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            warn!("Loan {} panicked: {}", loan_id, message);
            LoanOutcome::failed(loan_id, format!("panicked: {}", message))
        }
        None => LoanOutcome::failed(loan_id, "cancelled"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
