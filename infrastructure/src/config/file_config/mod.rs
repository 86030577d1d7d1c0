//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod batch;
mod extractor;
mod logging;
mod output;
mod pipelines;
mod stages;
mod store;

pub use batch::FileBatchConfig;
pub use extractor::FileExtractorConfig;
pub use logging::FileLoggingConfig;
pub use output::{ColorMode, FileOutputConfig};
pub use pipelines::{FilePipelineConfig, default_pipelines};
pub use stages::{FileStageConfig, StageKind, default_stages};
pub use store::FileStoreConfig;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("batch.concurrency cannot be 0")]
    ZeroConcurrency,

    #[error("extractor.sample_size cannot be 0")]
    ZeroSampleSize,

    #[error("extractor.timeout_seconds cannot be 0")]
    ZeroExtractorTimeout,

    #[error("stage name cannot be empty")]
    EmptyStageName,

    #[error("stage '{0}' is defined more than once")]
    DuplicateStage(String),

    #[error("stage '{0}': timeout_seconds cannot be 0")]
    ZeroStageTimeout(String),

    #[error("stage '{0}': command stages need a program")]
    MissingProgram(String),

    #[error("stage '{0}': http stages need a url")]
    MissingUrl(String),

    #[error("pipeline '{0}' has no stages")]
    EmptyPipeline(String),

    #[error("pipeline '{pipeline}' references unknown stage '{stage}'")]
    UnknownStage { pipeline: String, stage: String },

    #[error("batch.{field} names unknown pipeline '{pipeline}'")]
    UnknownPipeline { field: &'static str, pipeline: String },
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub batch: FileBatchConfig,
    pub store: FileStoreConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
    pub extractor: FileExtractorConfig,
    pub stages: Vec<FileStageConfig>,
    pub pipelines: BTreeMap<String, FilePipelineConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            batch: FileBatchConfig::default(),
            store: FileStoreConfig::default(),
            logging: FileLoggingConfig::default(),
            output: FileOutputConfig::default(),
            extractor: FileExtractorConfig::default(),
            stages: default_stages(),
            pipelines: default_pipelines(),
        }
    }
}

impl FileConfig {
    pub fn stage(&self, name: &str) -> Option<&FileStageConfig> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Validate the entire configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.batch.concurrency == 0 {
            issues.push(ConfigValidationError::ZeroConcurrency);
        }
        if self.extractor.sample_size == 0 {
            issues.push(ConfigValidationError::ZeroSampleSize);
        }
        if self.extractor.timeout_seconds == Some(0) {
            issues.push(ConfigValidationError::ZeroExtractorTimeout);
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                issues.push(ConfigValidationError::EmptyStageName);
                continue;
            }
            if !seen.insert(stage.name.as_str()) {
                issues.push(ConfigValidationError::DuplicateStage(stage.name.clone()));
            }
            if stage.timeout_seconds == 0 {
                issues.push(ConfigValidationError::ZeroStageTimeout(stage.name.clone()));
            }
            match stage.kind {
                StageKind::Command if stage.program.trim().is_empty() => {
                    issues.push(ConfigValidationError::MissingProgram(stage.name.clone()))
                }
                StageKind::Http if stage.url.as_deref().is_none_or(|u| u.trim().is_empty()) => {
                    issues.push(ConfigValidationError::MissingUrl(stage.name.clone()))
                }
                _ => {}
            }
        }

        for (name, pipeline) in &self.pipelines {
            if pipeline.stages.is_empty() {
                issues.push(ConfigValidationError::EmptyPipeline(name.clone()));
            }
            for stage in &pipeline.stages {
                if !seen.contains(stage.as_str()) {
                    issues.push(ConfigValidationError::UnknownStage {
                        pipeline: name.clone(),
                        stage: stage.clone(),
                    });
                }
            }
        }

        for (field, pipeline) in [
            ("pipeline", &self.batch.pipeline),
            ("retry_pipeline", &self.batch.retry_pipeline),
        ] {
            if !self.pipelines.contains_key(pipeline) {
                issues.push(ConfigValidationError::UnknownPipeline {
                    field,
                    pipeline: pipeline.clone(),
                });
            }
        }

        issues
    }
}
