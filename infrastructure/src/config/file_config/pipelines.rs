//! Pipeline configuration from TOML (`[pipelines.<name>]` tables)
//!
//! ```toml
//! [pipelines.retry]
//! stages = ["scenario", "analysis"]
//! requires = ["income_analysis/form_1003_income_timeline.json"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePipelineConfig {
    /// Stage names, in execution order
    pub stages: Vec<String>,
    /// Globs a loan must match to be discovered for this pipeline
    pub requires: Vec<String>,
}

impl FilePipelineConfig {
    fn of(stages: &[&str]) -> Self {
        Self {
            stages: stages.iter().map(|s| s.to_string()).collect(),
            requires: Vec::new(),
        }
    }
}

/// `main` runs a loan end to end; `retry` re-runs the model-driven tail.
pub fn default_pipelines() -> BTreeMap<String, FilePipelineConfig> {
    BTreeMap::from([
        (
            "main".to_string(),
            FilePipelineConfig::of(&[
                "harvest_ocr",
                "semantic",
                "classify",
                "form1003",
                "employment",
                "analysis",
            ]),
        ),
        (
            "retry".to_string(),
            FilePipelineConfig::of(&["scenario", "analysis"]),
        ),
    ])
}
