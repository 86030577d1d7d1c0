//! Domain layer for loanflow
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Batch orchestration
//!
//! - **Stage**: one step of a per-loan pipeline, classified into an [`OutcomeKind`]
//! - **Pipeline**: ordered stages that must all succeed for a loan
//! - **BatchRun**: one outcome per submitted loan, aggregated into a [`BatchSummary`]
//!
//! ## Consistency scoring
//!
//! The extraction step is a non-deterministic oracle. It is sampled K times and
//! the runs are reconciled by agreement counting ([`FieldAgreement`]) rather
//! than by asserting equal values.

pub mod batch;
pub mod comparison;
pub mod consistency;
pub mod core;
pub mod loan;
pub mod pipeline;
pub mod stage;
pub mod timeline;

// Re-export commonly used types
pub use batch::{
    retry::RetryReport,
    run::BatchRun,
    summary::{BatchSummary, BucketEntry},
};
pub use comparison::{ArtifactIssue, ComparisonRow, ComparisonTable, UNKNOWN_INCOME_TYPE};
pub use consistency::{
    agreement::{AgreementTolerance, ConfidenceTier, FieldAgreement, SampleValue},
    sample::{ConsistencySample, INCOME_FIELD, RunConfidence},
    statistics::{ConfidenceDistribution, RunStatistics, UnderwriterDecision},
    summary::ConsistencySummary,
};
pub use core::{
    error::{DomainError, LoanError},
    output_format::OutputFormat,
    string::truncate_detail,
};
pub use loan::entities::{ArtifactRequirement, Loan, LoanId};
pub use pipeline::{LoanOutcome, PipelineDefinition};
pub use stage::{
    markers::{RawStageOutput, SentinelMarkers},
    outcome::{OutcomeKind, StageReport, StageVerdict},
    result::StageResult,
    spec::StageSpec,
};
pub use timeline::{
    audit::{TimelineAudit, TimelineAuditEntry},
    borrower::{BorrowerConsistency, BorrowerConsistencyCheck},
    entities::{FormSnapshot, IncomeTimeline, normalize_name},
    income_change::IncomeChange,
};
