//! Retry Failed use case
//!
//! Re-runs an explicit list of loan ids through a sub-pipeline. Manually
//! triggered; knows nothing about the batch the ids came from.

use crate::use_cases::run_batch::{RunBatchError, RunBatchInput, RunBatchUseCase};
use crate::use_cases::run_pipeline::RunPipelineUseCase;
use loanflow_domain::{LoanId, LoanOutcome, RetryReport};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Input for the RetryFailed use case
#[derive(Debug, Clone)]
pub struct RetryFailedInput {
    pub loan_ids: Vec<LoanId>,
    pub concurrency: usize,
}

impl RetryFailedInput {
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

#[derive(Debug, Clone)]
pub struct RetryFailedOutput {
    pub report: RetryReport,
    pub outcomes: Vec<LoanOutcome>,
}

/// Use case for retrying named loans through a sub-pipeline
pub struct RetryFailedUseCase {
    pipeline: Arc<RunPipelineUseCase>,
    cancellation_token: Option<CancellationToken>,
}

impl RetryFailedUseCase {
    /// `pipeline` is already narrowed to the stages worth retrying.
    pub fn new(pipeline: Arc<RunPipelineUseCase>) -> Self {
        Self {
            pipeline,
            cancellation_token: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(&self, input: RetryFailedInput) -> Result<RetryFailedOutput, RunBatchError> {
        let pipeline_name = self.pipeline.pipeline().name().to_string();
        info!(
            "Retrying {} loans through '{}'",
            input.loan_ids.len(),
            pipeline_name
        );

        let mut batch = RunBatchUseCase::new(Arc::clone(&self.pipeline));
        if let Some(token) = &self.cancellation_token {
            batch = batch.with_cancellation(token.clone());
        }
        let output = batch
            .execute(RunBatchInput {
                loan_ids: input.loan_ids,
                concurrency: input.concurrency,
            })
            .await?;

        let report = RetryReport::from_outcomes(pipeline_name, &output.outcomes);
        info!(
            "Retry complete: {} succeeded, {} still failing",
            report.succeeded.len(),
            report.still_failed.len()
        );
        Ok(RetryFailedOutput {
            report,
            outcomes: output.outcomes,
        })
    }
}
