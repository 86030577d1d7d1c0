//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod audit_timelines;
pub mod compare_income;
pub mod retry_failed;
pub mod run_batch;
pub mod run_pipeline;
pub mod run_stage;
pub mod sample_consistency;
pub mod summarize;

#[cfg(test)]
pub(crate) mod test_support;
