//! Consistency subdomain: reconciling K runs of a non-deterministic extractor.
//!
//! - [`sample::ConsistencySample`]: one run's record
//! - [`agreement::FieldAgreement`]: modal agreement count and tier per field
//! - [`statistics`]: run statistics and the underwriter decision
//! - [`summary::ConsistencySummary`]: the persisted per-loan artifact

pub mod agreement;
pub mod sample;
pub mod statistics;
pub mod summary;
