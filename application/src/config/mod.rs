//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`BatchParams`]: scheduler and stage runner control
//! - [`SamplingParams`]: consistency sampler control

pub mod batch_params;
pub mod sampling_params;

pub use batch_params::BatchParams;
pub use sampling_params::SamplingParams;
