//! Output format value object

use serde::{Deserialize, Serialize};

/// How reports are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable, colored when the terminal allows
    #[default]
    Text,
    /// One JSON document on stdout
    Json,
}
