//! Run Pipeline use case
//!
//! Executes one pipeline for one loan: stages strictly in order, stopping at
//! the first stage that does not succeed.

use crate::config::BatchParams;
use crate::ports::event_logger::{BatchEvent, BatchEventLogger, NoEventLogger};
use crate::ports::loan_store::{LoanStorePort, on_blocking_pool};
use crate::ports::progress::{BatchProgressNotifier, NoProgress};
use crate::ports::stage::{Stage, StageContext};
use crate::use_cases::run_stage::StageRunner;
use loanflow_domain::{DomainError, Loan, LoanId, LoanOutcome, PipelineDefinition, StageResult};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A pipeline definition bound to stage implementations.
#[derive(Clone)]
pub struct Pipeline {
    definition: PipelineDefinition,
    stages: Vec<Arc<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Bind `stages` to `definition`, matched by name.
    pub fn new(
        definition: PipelineDefinition,
        available: &[Arc<dyn Stage>],
    ) -> Result<Self, DomainError> {
        let stages = definition
            .stages
            .iter()
            .map(|spec| {
                available
                    .iter()
                    .find(|s| s.name() == spec.name)
                    .cloned()
                    .ok_or_else(|| DomainError::UnknownStage {
                        pipeline: definition.name.clone(),
                        stage: spec.name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { definition, stages })
    }

    /// Narrow to the named stages, keeping order.
    pub fn subset(&self, name: impl Into<String>, stage_names: &[&str]) -> Result<Self, DomainError> {
        let definition = self.definition.subset(name, stage_names)?;
        Self::new(definition, &self.stages)
    }

    pub fn definition(&self) -> &PipelineDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Use case for running one loan through a pipeline
pub struct RunPipelineUseCase {
    pipeline: Pipeline,
    runner: StageRunner,
    params: BatchParams,
    store: Option<Arc<dyn LoanStorePort>>,
    progress: Arc<dyn BatchProgressNotifier>,
    logger: Arc<dyn BatchEventLogger>,
}

impl RunPipelineUseCase {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            runner: StageRunner::default(),
            params: BatchParams::default(),
            store: None,
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoEventLogger),
        }
    }

    pub fn with_params(mut self, params: BatchParams) -> Self {
        self.runner = StageRunner::from_params(&params);
        self.params = params;
        self
    }

    /// Store consulted for completion artifacts when resuming.
    pub fn with_store(mut self, store: Arc<dyn LoanStorePort>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn BatchProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn BatchEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn params(&self) -> &BatchParams {
        &self.params
    }

    pub fn progress(&self) -> &Arc<dyn BatchProgressNotifier> {
        &self.progress
    }

    pub fn logger(&self) -> &Arc<dyn BatchEventLogger> {
        &self.logger
    }

    /// Run every stage for `loan_id`. Never fails: every problem is folded
    /// into the returned outcome.
    pub async fn execute(&self, loan_id: &LoanId) -> LoanOutcome {
        let started = Instant::now();
        let definition = &self.pipeline.definition;
        let mut loan = self.initial_loan(loan_id).await;
        let mut results: Vec<StageResult> = Vec::with_capacity(definition.stages.len());

        for (spec, stage) in definition.stages.iter().zip(&self.pipeline.stages) {
            let result = if self.params.resume && loan.has_artifact(&spec.name) {
                debug!("Loan {}: {} already complete, skipping", loan_id, spec.name);
                StageResult::resumed(&spec.name, loan_id.clone())
            } else {
                let ctx = StageContext::new(loan_id.clone())
                    .with_parameter(self.params.stage_parameter);
                self.runner.run(spec, stage.as_ref(), &ctx).await
            };

            loan.record(&result);
            self.progress.on_stage_complete(&result);
            self.logger.log(BatchEvent::new(
                "stage_finished",
                json!({
                    "pipeline": definition.name,
                    "loan_id": loan_id,
                    "stage": result.stage,
                    "outcome": result.outcome,
                    "duration_ms": result.duration.as_millis() as u64,
                    "resumed": result.resumed,
                    "error": result.error,
                }),
            ));

            let halts = result.outcome.halts_pipeline();
            results.push(result);
            if halts {
                break;
            }
        }

        let outcome = LoanOutcome::from_results(loan_id.clone(), results, started.elapsed());
        debug_assert_eq!(Some(outcome.outcome), loan.status());
        info!(
            "Loan {} finished as {} ({})",
            loan_id,
            outcome.outcome,
            outcome.tagged_reason()
        );
        outcome
    }

    async fn initial_loan(&self, loan_id: &LoanId) -> Loan {
        let store = match (&self.store, self.params.resume) {
            (Some(store), true) => store,
            _ => return Loan::new(loan_id.clone()),
        };
        let id = loan_id.clone();
        let stages = self.pipeline.definition.stages.clone();
        match on_blocking_pool(store, move |s| s.inspect(&id, &stages)).await {
            Ok(loan) => loan,
            Err(e) => {
                warn!("Loan {}: cannot inspect artifacts, running every stage: {}", loan_id, e);
                Loan::new(loan_id.clone())
            }
        }
    }
}
