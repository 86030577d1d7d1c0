//! Sample Consistency use case
//!
//! Calls the extractor K times for one loan, concurrently, and reconciles the
//! runs by agreement counting. [`ConsistencyStage`] wraps it as a pipeline
//! stage so the scheduler sees a single classified outcome.

use crate::config::SamplingParams;
use crate::ports::extractor::{ExtractionError, ExtractionPort};
use crate::ports::loan_store::{ArtifactError, LoanStorePort, on_blocking_pool};
use crate::ports::progress::{BatchProgressNotifier, NoProgress};
use crate::ports::stage::{Stage, StageContext, StageError};
use async_trait::async_trait;
use loanflow_domain::{
    ConsistencySample, ConsistencySummary, DomainError, LoanId, StageReport,
};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that can occur while sampling one loan
#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Invalid sampling configuration: {0}")]
    InvalidConfig(#[from] DomainError),

    #[error("No applicable data: {0}")]
    NoApplicableData(String),

    #[error("All {runs} extraction runs failed: {first_error}")]
    AllRunsFailed { runs: usize, first_error: String },

    #[error("Failed to persist consistency artifact: {0}")]
    Persist(#[from] ArtifactError),
}

/// Use case for sampling the extractor K times for one loan
pub struct SampleConsistencyUseCase<E: ExtractionPort + 'static> {
    extractor: Arc<E>,
    store: Option<Arc<dyn LoanStorePort>>,
    params: SamplingParams,
    progress: Arc<dyn BatchProgressNotifier>,
}

impl<E: ExtractionPort + 'static> SampleConsistencyUseCase<E> {
    pub fn new(extractor: Arc<E>, params: SamplingParams) -> Self {
        Self {
            extractor,
            store: None,
            params,
            progress: Arc::new(NoProgress),
        }
    }

    /// Store the run records and summary are written to.
    pub fn with_store(mut self, store: Arc<dyn LoanStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn BatchProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn params(&self) -> &SamplingParams {
        &self.params
    }

    pub async fn execute(&self, loan_id: &LoanId) -> Result<ConsistencySummary, SampleError> {
        self.execute_with_size(loan_id, self.params.sample_size).await
    }

    /// Sample with an explicit K.
    pub async fn execute_with_size(
        &self,
        loan_id: &LoanId,
        sample_size: usize,
    ) -> Result<ConsistencySummary, SampleError> {
        if sample_size == 0 {
            return Err(DomainError::InvalidSampleSize.into());
        }
        info!("Sampling loan {} with {} runs", loan_id, sample_size);

        // Records from an earlier session must not leak into this one.
        if let Some(store) = self.persisting_store() {
            let id = loan_id.clone();
            let cleared = on_blocking_pool(store, move |s| s.clear_run_records(&id)).await??;
            if cleared > 0 {
                debug!("Loan {}: cleared {} earlier run records", loan_id, cleared);
            }
        }

        let runs = self.collect_runs(loan_id, sample_size).await;

        let errors: Vec<&ExtractionError> =
            runs.iter().filter_map(|(_, r)| r.as_ref().err()).collect();
        if errors.len() == runs.len() {
            return Err(all_failed(&errors, sample_size));
        }

        let samples: Vec<ConsistencySample> = runs
            .into_iter()
            .map(|(run, result)| match result {
                Ok(sample) => sample.with_run_number(run),
                Err(e) => ConsistencySample::failed(run, e.to_string()),
            })
            .collect();

        let summary = ConsistencySummary::build(
            loan_id.clone(),
            samples,
            &self.params.tracked_fields,
            self.params.tolerance,
        )?;
        if let Some(store) = self.persisting_store() {
            let snapshot = summary.clone();
            let path = on_blocking_pool(store, move |s| {
                for (index, sample) in snapshot.results.iter().enumerate() {
                    s.save_run_record(&snapshot.loan_id, index as u32 + 1, sample)?;
                }
                s.save_consistency_summary(&snapshot)
            })
            .await??;
            debug!("Saved consistency summary to {}", path.display());
        }
        Ok(summary)
    }

    fn persisting_store(&self) -> Option<&Arc<dyn LoanStorePort>> {
        self.store.as_ref().filter(|_| self.params.persist)
    }

    /// Run the extractor K times concurrently; results ordered by run number.
    async fn collect_runs(
        &self,
        loan_id: &LoanId,
        sample_size: usize,
    ) -> Vec<(u32, Result<ConsistencySample, ExtractionError>)> {
        let mut join_set = JoinSet::new();
        let run_timeout = self.params.run_timeout;

        for run in 1..=sample_size as u32 {
            let extractor = Arc::clone(&self.extractor);
            let loan_id = loan_id.clone();

            join_set.spawn(async move {
                let future = extractor.extract(&loan_id, run);
                let result = if let Some(timeout) = run_timeout {
                    match tokio::time::timeout(timeout, future).await {
                        Ok(r) => r,
                        Err(_) => Err(ExtractionError::Timeout(timeout)),
                    }
                } else {
                    future.await
                };
                (run, result)
            });
        }

        let mut runs = Vec::with_capacity(sample_size);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((run, result)) => {
                    if let Err(e) = &result {
                        warn!("Loan {} run {} failed: {}", loan_id, run, e);
                    }
                    self.progress
                        .on_sample_complete(loan_id, run, result.is_ok());
                    runs.push((run, result));
                }
                Err(e) => {
                    warn!("Task join error: {}", e);
                }
            }
        }

        // A run whose task died still counts towards K.
        for run in 1..=sample_size as u32 {
            if !runs.iter().any(|(r, _)| *r == run) {
                runs.push((run, Err(ExtractionError::Failed("run aborted".to_string()))));
            }
        }
        runs.sort_by_key(|(run, _)| *run);
        runs
    }
}

/// No-data when every run said so, otherwise a hard failure.
fn all_failed(errors: &[&ExtractionError], sample_size: usize) -> SampleError {
    let no_data: Vec<&String> = errors
        .iter()
        .filter_map(|e| match e {
            ExtractionError::NoApplicableData(reason) => Some(reason),
            _ => None,
        })
        .collect();
    if !no_data.is_empty() && no_data.len() == errors.len() {
        return SampleError::NoApplicableData(no_data[0].clone());
    }
    SampleError::AllRunsFailed {
        runs: sample_size,
        first_error: errors
            .iter()
            .find(|e| !matches!(e, ExtractionError::NoApplicableData(_)))
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no runs completed".to_string()),
    }
}

/// Pipeline stage that performs K-fold sampling.
///
/// The stage parameter, when given, overrides K.
pub struct ConsistencyStage<E: ExtractionPort + 'static> {
    name: String,
    sampler: SampleConsistencyUseCase<E>,
}

impl<E: ExtractionPort + 'static> ConsistencyStage<E> {
    pub fn new(name: impl Into<String>, sampler: SampleConsistencyUseCase<E>) -> Self {
        Self {
            name: name.into(),
            sampler,
        }
    }
}

#[async_trait]
impl<E: ExtractionPort + 'static> Stage for ConsistencyStage<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &StageContext) -> Result<StageReport, StageError> {
        let sample_size = ctx
            .parameter
            .map(|k| k as usize)
            .unwrap_or(self.sampler.params().sample_size);

        match self.sampler.execute_with_size(&ctx.loan_id, sample_size).await {
            Ok(summary) => Ok(StageReport::success(render_transcript(&summary))),
            Err(SampleError::NoApplicableData(reason)) => Ok(StageReport::no_data(reason)),
            Err(e) => Ok(StageReport::failure(e.to_string())),
        }
    }
}

/// Plain-text transcript of a summary, as a stage would print it.
pub fn render_transcript(summary: &ConsistencySummary) -> String {
    let mut lines = vec![
        "CONSISTENCY SUMMARY".to_string(),
        format!("Loan: {}", summary.loan_id),
        format!("Total Runs: {}", summary.total_runs),
    ];
    for agreement in &summary.agreement {
        lines.push(format!(
            "Agreement on {}: {}/{} ({})",
            agreement.field, agreement.high_confidence_count, agreement.sample_size, agreement.tier
        ));
    }
    if let Some(stats) = &summary.statistics {
        lines.push(format!(
            "Income: mean {:.2}, median {:.2}, range {:.2} - {:.2} ({:.2}%)",
            stats.mean, stats.median, stats.min, stats.max, stats.spread_pct
        ));
    }
    if let Some(decision) = &summary.underwriter_decision {
        lines.push(format!(
            "Authoritative Income: {:.2} ({} confidence)",
            decision.authoritative_income, decision.confidence_in_result
        ));
        lines.push(format!("Recommendation: {}", decision.recommendation));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use loanflow_domain::{ConfidenceTier, INCOME_FIELD, OutcomeKind, StageVerdict};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the configured incomes in call order.
    struct ScriptedExtractor {
        incomes: Vec<Option<f64>>,
        calls: AtomicUsize,
    }

    impl ScriptedExtractor {
        fn new(incomes: Vec<Option<f64>>) -> Arc<Self> {
            Arc::new(Self {
                incomes,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ExtractionPort for ScriptedExtractor {
        async fn extract(
            &self,
            _loan_id: &LoanId,
            run: u32,
        ) -> Result<ConsistencySample, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.incomes.get(run as usize - 1).copied().flatten() {
                Some(income) => Ok(ConsistencySample::new(run)
                    .with_field(INCOME_FIELD, json!(income))
                    .with_field("confidence_level", json!("high"))),
                None => Err(ExtractionError::Failed("model error".to_string())),
            }
        }
    }

    struct NoDocuments;

    #[async_trait]
    impl ExtractionPort for NoDocuments {
        async fn extract(
            &self,
            _loan_id: &LoanId,
            _run: u32,
        ) -> Result<ConsistencySample, ExtractionError> {
            Err(ExtractionError::NoApplicableData(
                "No paystub or W2 documents found".to_string(),
            ))
        }
    }

    struct SlowExtractor;

    #[async_trait]
    impl ExtractionPort for SlowExtractor {
        async fn extract(
            &self,
            _loan_id: &LoanId,
            run: u32,
        ) -> Result<ConsistencySample, ExtractionError> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(ConsistencySample::new(run))
        }
    }

    fn params() -> SamplingParams {
        SamplingParams::default().without_persistence()
    }

    #[tokio::test]
    async fn test_unanimous_runs() {
        let extractor = ScriptedExtractor::new(vec![Some(5000.0), Some(5000.0), Some(5000.0)]);
        let summary = SampleConsistencyUseCase::new(extractor.clone(), params())
            .execute(&LoanId::new("L1"))
            .await
            .unwrap();
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 3);
        let agreement = summary.income_agreement();
        assert_eq!(agreement.high_confidence_count, 3);
        assert_eq!(agreement.tier, ConfidenceTier::AllAgree);
    }

    #[tokio::test]
    async fn test_disagreeing_runs() {
        let extractor = ScriptedExtractor::new(vec![Some(5000.0), Some(5200.0), Some(4800.0)]);
        let summary = SampleConsistencyUseCase::new(extractor, params())
            .execute(&LoanId::new("L1"))
            .await
            .unwrap();
        assert_eq!(summary.income_agreement().high_confidence_count, 1);
        assert_eq!(summary.income_agreement().tier, ConfidenceTier::Low);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_k() {
        let extractor = ScriptedExtractor::new(vec![Some(5000.0), None, Some(5000.0)]);
        let summary = SampleConsistencyUseCase::new(extractor, params())
            .execute(&LoanId::new("L1"))
            .await
            .unwrap();
        let agreement = summary.income_agreement();
        assert_eq!(agreement.sample_size, 3);
        assert_eq!(agreement.high_confidence_count, 2);
        assert!(summary.results[1].is_error());
        assert_eq!(summary.results[1].run_number(), Some(2));
    }

    #[tokio::test]
    async fn test_all_runs_failed() {
        let extractor = ScriptedExtractor::new(vec![None, None]);
        let err = SampleConsistencyUseCase::new(extractor, params().with_sample_size(2))
            .execute(&LoanId::new("L1"))
            .await
            .unwrap_err();
        assert!(matches!(err, SampleError::AllRunsFailed { runs: 2, .. }));
    }

    #[tokio::test]
    async fn test_sub_second_run_timeout_is_reported_exactly() {
        let params = params()
            .with_sample_size(2)
            .with_run_timeout(Some(std::time::Duration::from_millis(50)));
        let err = SampleConsistencyUseCase::new(Arc::new(SlowExtractor), params)
            .execute(&LoanId::new("L1"))
            .await
            .unwrap_err();
        match err {
            SampleError::AllRunsFailed { first_error, .. } => {
                assert_eq!(first_error, "Extraction run timed out after 50ms");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_sample_size_rejected() {
        let extractor = ScriptedExtractor::new(vec![]);
        let err = SampleConsistencyUseCase::new(extractor, params().with_sample_size(0))
            .execute(&LoanId::new("L1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SampleError::InvalidConfig(DomainError::InvalidSampleSize)
        ));
    }

    #[tokio::test]
    async fn test_stage_reports_no_data() {
        let stage = ConsistencyStage::new(
            "analysis",
            SampleConsistencyUseCase::new(Arc::new(NoDocuments), params()),
        );
        let report = stage.execute(&StageContext::new("L1")).await.unwrap();
        assert_eq!(report.verdict.kind(), OutcomeKind::NoData);
    }

    #[tokio::test]
    async fn test_stage_parameter_overrides_k() {
        let extractor = ScriptedExtractor::new(vec![Some(1.0); 5]);
        let stage = ConsistencyStage::new(
            "analysis",
            SampleConsistencyUseCase::new(extractor.clone(), params()),
        );
        let report = stage
            .execute(&StageContext::new("L1").with_parameter(Some(5)))
            .await
            .unwrap();
        assert_eq!(report.verdict, StageVerdict::Success);
        assert!(report.transcript.starts_with("CONSISTENCY SUMMARY"));
        assert!(report.transcript.contains("5/5 (all_agree)"));
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 5);
    }
}
