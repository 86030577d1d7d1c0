//! Stage subdomain: one step of a per-loan pipeline and how its outcome is
//! classified.
//!
//! - [`spec::StageSpec`]: name, deadline, resume artifact
//! - [`outcome::OutcomeKind`]: the four mutually exclusive buckets
//! - [`outcome::StageVerdict`]: typed result a stage hands back to the runner
//! - [`markers::SentinelMarkers`]: transcript sniffing for out-of-process stages
//! - [`result::StageResult`]: immutable record of one attempt

pub mod markers;
pub mod outcome;
pub mod result;
pub mod spec;
