//! Batch parameters: scheduler and stage runner control.
//!
//! [`BatchParams`] groups the static parameters that control a batch run in
//! [`RunBatchUseCase`](crate::use_cases::run_batch::RunBatchUseCase) and the
//! stage runner. These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};

/// Batch execution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchParams {
    /// Maximum loans in flight at once.
    pub concurrency: usize,
    /// Numeric argument handed to every stage (`{param}`), e.g. run count.
    pub stage_parameter: Option<u32>,
    /// Maximum characters kept from an error detail.
    pub detail_limit: usize,
    /// Maximum characters kept from a stage transcript.
    pub output_limit: usize,
    /// Skip stages whose completion artifact already exists.
    pub resume: bool,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            concurrency: 5,
            stage_parameter: None,
            detail_limit: 200,
            output_limit: 4000,
            resume: false,
        }
    }
}

impl BatchParams {
    // ==================== Builder Methods ====================

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_stage_parameter(mut self, parameter: Option<u32>) -> Self {
        self.stage_parameter = parameter;
        self
    }

    pub fn with_detail_limit(mut self, limit: usize) -> Self {
        self.detail_limit = limit;
        self
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
}
