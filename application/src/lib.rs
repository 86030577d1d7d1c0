//! Application layer for loanflow
//!
//! This crate contains use cases, port definitions, and execution parameters.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BatchParams, SamplingParams};
pub use ports::{
    event_logger::{BatchEvent, BatchEventLogger, NoEventLogger},
    extractor::{ExtractionError, ExtractionPort},
    loan_store::{ArtifactError, LoanStorePort, StoreError},
    progress::{BatchProgressNotifier, NoProgress},
    stage::{Stage, StageContext, StageError},
};
pub use use_cases::audit_timelines::AuditTimelinesUseCase;
pub use use_cases::compare_income::CompareIncomeUseCase;
pub use use_cases::retry_failed::{RetryFailedInput, RetryFailedOutput, RetryFailedUseCase};
pub use use_cases::run_batch::{RunBatchError, RunBatchInput, RunBatchOutput, RunBatchUseCase};
pub use use_cases::run_pipeline::{Pipeline, RunPipelineUseCase};
pub use use_cases::run_stage::StageRunner;
pub use use_cases::sample_consistency::{
    ConsistencyStage, SampleConsistencyUseCase, SampleError, render_transcript,
};
pub use use_cases::summarize::{SummarizeError, SummarizeStage, SummarizeUseCase};
