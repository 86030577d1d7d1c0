//! Summarize use case
//!
//! Rebuilds a loan's consistency summary from what is already in the store,
//! without calling the extractor.

use crate::config::SamplingParams;
use crate::ports::loan_store::{ArtifactError, LoanStorePort, on_blocking_pool};
use crate::ports::stage::{Stage, StageContext, StageError};
use crate::use_cases::sample_consistency::render_transcript;
use async_trait::async_trait;
use loanflow_domain::{ConsistencySummary, DomainError, LoanId, StageReport};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SummarizeError {
    #[error("No stored runs for loan {0}")]
    NoRuns(LoanId),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("Invalid summary: {0}")]
    Domain(#[from] DomainError),
}

/// Use case for recomputing a consistency summary offline
pub struct SummarizeUseCase {
    store: Arc<dyn LoanStorePort>,
    params: SamplingParams,
}

impl SummarizeUseCase {
    pub fn new(store: Arc<dyn LoanStorePort>, params: SamplingParams) -> Self {
        Self { store, params }
    }

    /// The stored summary's `results` win: they hold every run of the last
    /// session, errored ones included. Run records are read only when no
    /// summary exists.
    pub async fn execute(&self, loan_id: &LoanId) -> Result<ConsistencySummary, SummarizeError> {
        let id = loan_id.clone();
        let existing = match on_blocking_pool(&self.store, move |s| {
            s.load_consistency_summary(&id)
        })
        .await?
        {
            Ok(summary) if !summary.results.is_empty() => Some(summary),
            Ok(_) => None,
            Err(e) if e.is_missing() => None,
            Err(e) => return Err(e.into()),
        };

        let summary = match existing {
            Some(mut existing) => {
                debug!(
                    "Loan {}: recomputing {} stored results",
                    loan_id,
                    existing.results.len()
                );
                existing.loan_id = loan_id.clone();
                existing.recompute(&self.params.tracked_fields, self.params.tolerance)?
            }
            None => {
                let id = loan_id.clone();
                let records =
                    match on_blocking_pool(&self.store, move |s| s.load_run_records(&id)).await? {
                        Ok(records) => records,
                        Err(e) if e.is_missing() => Vec::new(),
                        Err(e) => return Err(e.into()),
                    };
                if records.is_empty() {
                    return Err(SummarizeError::NoRuns(loan_id.clone()));
                }
                debug!("Loan {}: summarizing {} run records", loan_id, records.len());
                ConsistencySummary::build(
                    loan_id.clone(),
                    records,
                    &self.params.tracked_fields,
                    self.params.tolerance,
                )?
            }
        };

        if self.params.persist {
            let snapshot = summary.clone();
            let path =
                on_blocking_pool(&self.store, move |s| s.save_consistency_summary(&snapshot))
                    .await??;
            info!("Loan {}: summary written to {}", loan_id, path.display());
        }
        Ok(summary)
    }
}

/// In-process stage wrapping [`SummarizeUseCase`].
pub struct SummarizeStage {
    name: String,
    summarizer: SummarizeUseCase,
}

impl SummarizeStage {
    pub fn new(name: impl Into<String>, summarizer: SummarizeUseCase) -> Self {
        Self {
            name: name.into(),
            summarizer,
        }
    }
}

#[async_trait]
impl Stage for SummarizeStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StageContext) -> Result<StageReport, StageError> {
        match self.summarizer.execute(&ctx.loan_id).await {
            Ok(summary) => Ok(StageReport::success(render_transcript(&summary))),
            Err(SummarizeError::NoRuns(id)) => {
                Ok(StageReport::no_data(format!("No stored runs for loan {}", id)))
            }
            Err(e) => Ok(StageReport::failure(e.to_string())),
        }
    }
}
