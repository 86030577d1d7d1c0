//! Batch configuration from TOML (`[batch]` section)
//!
//! ```toml
//! [batch]
//! concurrency = 5
//! resume = false
//! pipeline = "main"
//! retry_pipeline = "retry"
//! ```

use loanflow_application::BatchParams;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBatchConfig {
    /// Maximum loans in flight at once
    pub concurrency: usize,
    /// Skip stages whose completion artifact already exists
    pub resume: bool,
    /// Pipeline used by `run`
    pub pipeline: String,
    /// Pipeline used by `retry`
    pub retry_pipeline: String,
    /// Characters kept of a failure reason
    pub detail_limit: usize,
    /// Characters kept of a stage transcript
    pub output_limit: usize,
}

impl Default for FileBatchConfig {
    fn default() -> Self {
        let params = BatchParams::default();
        Self {
            concurrency: params.concurrency,
            resume: params.resume,
            pipeline: "main".to_string(),
            retry_pipeline: "retry".to_string(),
            detail_limit: params.detail_limit,
            output_limit: params.output_limit,
        }
    }
}

impl FileBatchConfig {
    pub fn to_batch_params(&self) -> BatchParams {
        BatchParams::default()
            .with_concurrency(self.concurrency)
            .with_resume(self.resume)
            .with_detail_limit(self.detail_limit)
            .with_output_limit(self.output_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_batch_params() {
        let config = FileBatchConfig {
            concurrency: 8,
            resume: true,
            ..Default::default()
        };
        let params = config.to_batch_params();
        assert_eq!(params.concurrency, 8);
        assert!(params.resume);
        assert_eq!(params.detail_limit, 200);
    }
}
