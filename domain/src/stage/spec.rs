//! Stage specification

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Static description of a stage within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    /// Wall-clock deadline for one invocation
    pub timeout: Duration,
    /// Glob (relative to the loan directory) whose presence means this stage
    /// already completed; consulted only when resuming
    pub completion_artifact: Option<String>,
}

impl StageSpec {
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            timeout,
            completion_artifact: None,
        }
    }

    pub fn with_completion_artifact(mut self, pattern: impl Into<String>) -> Self {
        self.completion_artifact = Some(pattern.into());
        self
    }
}
