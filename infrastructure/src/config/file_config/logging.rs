//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving structured batch events
    pub events_file: Option<PathBuf>,
    /// Diagnostic log file, in addition to stderr
    pub log_file: Option<PathBuf>,
}
