//! Sentinel markers for out-of-process stages
//!
//! An external stage only hands back its exit status and transcript, so the
//! terminal states that are not plain success have to be signalled with fixed
//! phrases. [`SentinelMarkers::classify`] turns that transcript into a typed
//! [`StageVerdict`].

use super::outcome::StageVerdict;
use serde::{Deserialize, Serialize};

/// Raw result of running an external process to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStageOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RawStageOutput {
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn exited_successfully(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Both streams, stdout first.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() {
                combined.push_str("\n--- stderr ---\n");
            }
            combined.push_str(&self.stderr);
        }
        combined
    }
}

/// Phrases a stage prints to signal non-error terminal states.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelMarkers {
    /// Any of these means "required documents absent"
    pub no_data: Vec<String>,
    /// Any of these means success even with a non-zero exit code
    pub success: Vec<String>,
}

impl SentinelMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_no_data(mut self, marker: impl Into<String>) -> Self {
        self.no_data.push(marker.into());
        self
    }

    pub fn with_success(mut self, marker: impl Into<String>) -> Self {
        self.success.push(marker.into());
        self
    }

    /// Classify a completed process.
    ///
    /// Priority: abnormal termination, then no-data marker, then success
    /// marker or zero exit, then failure.
    pub fn classify(&self, output: &RawStageOutput) -> StageVerdict {
        let Some(code) = output.exit_code else {
            return StageVerdict::Failure(
                failure_detail(output).unwrap_or_else(|| "terminated by signal".to_string()),
            );
        };

        let transcript = output.combined();

        if let Some(marker) = self.no_data.iter().find(|m| transcript.contains(m.as_str())) {
            return StageVerdict::NoData(marker.clone());
        }

        if code == 0 || self.success.iter().any(|m| transcript.contains(m.as_str())) {
            return StageVerdict::Success;
        }

        StageVerdict::Failure(
            failure_detail(output).unwrap_or_else(|| format!("exit code {}", code)),
        )
    }
}

/// Prefer stderr, fall back to the tail of stdout.
fn failure_detail(output: &RawStageOutput) -> Option<String> {
    let stderr = output.stderr.trim();
    if !stderr.is_empty() {
        return Some(stderr.to_string());
    }
    output
        .stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> SentinelMarkers {
        SentinelMarkers::new()
            .with_no_data("No Form 1003 documents found")
            .with_success("CONSISTENCY SUMMARY")
    }

    #[test]
    fn test_zero_exit_is_success() {
        let out = RawStageOutput::new(Some(0), "done", "");
        assert_eq!(markers().classify(&out), StageVerdict::Success);
    }

    #[test]
    fn test_no_data_marker_beats_zero_exit() {
        let out = RawStageOutput::new(Some(0), "No Form 1003 documents found for loan", "");
        assert_eq!(
            markers().classify(&out),
            StageVerdict::NoData("No Form 1003 documents found".to_string())
        );
    }

    #[test]
    fn test_success_marker_rescues_nonzero_exit() {
        let out = RawStageOutput::new(Some(1), "...\nCONSISTENCY SUMMARY\n...", "warning");
        assert_eq!(markers().classify(&out), StageVerdict::Success);
    }

    #[test]
    fn test_nonzero_exit_without_marker_fails_with_stderr() {
        let out = RawStageOutput::new(Some(2), "starting", "Traceback: KeyError 'income'");
        assert_eq!(
            markers().classify(&out),
            StageVerdict::Failure("Traceback: KeyError 'income'".to_string())
        );
    }

    #[test]
    fn test_nonzero_exit_with_empty_streams() {
        let out = RawStageOutput::new(Some(3), "", "");
        assert_eq!(
            markers().classify(&out),
            StageVerdict::Failure("exit code 3".to_string())
        );
    }

    #[test]
    fn test_signal_termination_is_failure_even_with_marker() {
        let out = RawStageOutput::new(None, "CONSISTENCY SUMMARY", "");
        assert!(matches!(markers().classify(&out), StageVerdict::Failure(_)));
    }

    #[test]
    fn test_combined_streams() {
        let out = RawStageOutput::new(Some(0), "out", "err");
        assert_eq!(out.combined(), "out\n--- stderr ---\nerr");
    }
}
