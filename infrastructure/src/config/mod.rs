//! Configuration file loading for loanflow
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `LOANFLOW_` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./loanflow.toml` or `./.loanflow.toml`
//! 4. Global: `$XDG_CONFIG_HOME/loanflow/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ColorMode, ConfigValidationError, FileBatchConfig, FileConfig, FileExtractorConfig, FileLoggingConfig,
    FileOutputConfig, FilePipelineConfig, FileStageConfig, FileStoreConfig, StageKind,
    default_pipelines, default_stages,
};
pub use loader::ConfigLoader;
