//! Batch subdomain: one orchestration invocation over many loans.
//!
//! - [`run::BatchRun`]: submitted ids and the accumulated outcome mapping
//! - [`summary::BatchSummary`]: per-bucket counts and reasons
//! - [`retry::RetryReport`]: succeeded / still-failed partition of a retry

pub mod retry;
pub mod run;
pub mod summary;
