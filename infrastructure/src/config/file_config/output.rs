//! Report configuration from TOML (`[output]` section)
//!
//! ```toml
//! [output]
//! format = "text"     # or "json"
//! color = "auto"      # "always" | "never"
//! progress = true
//! ```

use loanflow_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// When to paint reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Report format when `--output` is not given
    pub format: OutputFormat,
    pub color: ColorMode,
    /// Progress bars on stderr while a batch runs
    pub progress: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: ColorMode::Auto,
            progress: true,
        }
    }
}

impl FileOutputConfig {
    pub fn use_color(&self, stdout_is_terminal: bool) -> bool {
        match self.color {
            ColorMode::Auto => stdout_is_terminal,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    /// Progress would interleave with a JSON report, so only text reports
    /// get it.
    pub fn show_progress(&self, format: OutputFormat, quiet: bool) -> bool {
        self.progress && !quiet && format == OutputFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_section_deserialize() {
        let toml_str = r#"
[output]
format = "json"
color = "never"
progress = false
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.color, ColorMode::Never);
        assert!(!config.output.progress);
    }

    #[test]
    fn test_color_mode() {
        let mut output = FileOutputConfig::default();
        assert!(output.use_color(true));
        assert!(!output.use_color(false));
        output.color = ColorMode::Always;
        assert!(output.use_color(false));
        output.color = ColorMode::Never;
        assert!(!output.use_color(true));
    }

    #[test]
    fn test_progress_only_for_text_reports() {
        let output = FileOutputConfig::default();
        assert!(output.show_progress(OutputFormat::Text, false));
        assert!(!output.show_progress(OutputFormat::Text, true));
        assert!(!output.show_progress(OutputFormat::Json, false));
    }
}
