//! Sampling parameters for the consistency sampler.

use loanflow_domain::{AgreementTolerance, INCOME_FIELD};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many times to call the extractor and how to reconcile the runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// K, the number of independent runs.
    pub sample_size: usize,
    /// Fields whose agreement is tracked.
    pub tracked_fields: Vec<String>,
    pub tolerance: AgreementTolerance,
    /// Deadline for a single run; `None` leaves it to the stage deadline.
    pub run_timeout: Option<Duration>,
    /// Write each run record and the summary back to the store.
    pub persist: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            sample_size: 3,
            tracked_fields: vec![INCOME_FIELD.to_string()],
            tolerance: AgreementTolerance::Exact,
            run_timeout: None,
            persist: true,
        }
    }
}

impl SamplingParams {
    pub fn with_sample_size(mut self, k: usize) -> Self {
        self.sample_size = k;
        self
    }

    pub fn with_tracked_fields(mut self, fields: Vec<String>) -> Self {
        self.tracked_fields = fields;
        self
    }

    pub fn with_tolerance(mut self, tolerance: AgreementTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }
}
