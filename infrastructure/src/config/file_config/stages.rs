//! Stage configuration from TOML (`[[stages]]` array)
//!
//! ```toml
//! [[stages]]
//! name = "form1003"
//! program = "python3"
//! args = ["agents/form_1003_income_tracker.py", "{loan_id}"]
//! timeout_seconds = 180
//! no_data_markers = ["No Form 1003 documents found"]
//! completion_artifact = "income_analysis/form_1003_income_timeline.json"
//! ```

use loanflow_domain::{SentinelMarkers, StageSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How a stage is carried out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// External program, classified from exit status and transcript
    #[default]
    Command,
    /// In-process K-fold sampling of the `[extractor]`
    Consistency,
    /// In-process recomputation of a stored consistency summary
    Summarize,
    /// Remote service speaking the JSON stage contract
    Http,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStageConfig {
    pub name: String,
    pub kind: StageKind,
    pub program: String,
    /// Argument template; `{loan_id}` and `{param}` are substituted
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_seconds: u64,
    pub no_data_markers: Vec<String>,
    pub success_markers: Vec<String>,
    /// Glob relative to the loan directory marking the stage as done
    pub completion_artifact: Option<String>,
    /// Kill the process when the deadline expires
    pub kill_on_timeout: bool,
    /// Endpoint for `kind = "http"`
    pub url: Option<String>,
}

impl Default for FileStageConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: StageKind::Command,
            program: String::new(),
            args: Vec::new(),
            working_dir: None,
            timeout_seconds: 300,
            no_data_markers: Vec::new(),
            success_markers: Vec::new(),
            completion_artifact: None,
            kill_on_timeout: true,
            url: None,
        }
    }
}

impl FileStageConfig {
    /// A `python3 <script> {loan_id}` stage.
    fn script(name: &str, script: &str, timeout_seconds: u64) -> Self {
        Self {
            name: name.to_string(),
            program: "python3".to_string(),
            args: vec![script.to_string(), "{loan_id}".to_string()],
            timeout_seconds,
            ..Default::default()
        }
    }

    fn with_arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    fn with_no_data(mut self, marker: &str) -> Self {
        self.no_data_markers.push(marker.to_string());
        self
    }

    fn with_success(mut self, marker: &str) -> Self {
        self.success_markers.push(marker.to_string());
        self
    }

    fn completed_by(mut self, pattern: &str) -> Self {
        self.completion_artifact = Some(pattern.to_string());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn to_spec(&self) -> StageSpec {
        let spec = StageSpec::new(&self.name, self.timeout());
        match &self.completion_artifact {
            Some(pattern) => spec.with_completion_artifact(pattern),
            None => spec,
        }
    }

    pub fn markers(&self) -> SentinelMarkers {
        SentinelMarkers {
            no_data: self.no_data_markers.clone(),
            success: self.success_markers.clone(),
        }
    }
}

/// The document pipeline's stages.
pub fn default_stages() -> Vec<FileStageConfig> {
    vec![
        FileStageConfig {
            name: "harvest_ocr".to_string(),
            program: "python3".to_string(),
            args: vec![
                "pipeline/process_from_harvest_api.py".to_string(),
                "loan_files_inputs/loan_{loan_id}_tree.json".to_string(),
                "{loan_id}".to_string(),
            ],
            timeout_seconds: 1800,
            ..Default::default()
        }
        .completed_by("raw_json/*.json"),
        FileStageConfig::script("semantic", "pipeline/process_semantic_compression.py", 900)
            .completed_by("semantic_json/*.json"),
        FileStageConfig::script("classify", "pipeline/classify_income_documents.py", 600),
        FileStageConfig::script("form1003", "agents/form_1003_income_tracker.py", 180)
            .with_no_data("No Form 1003 documents found")
            .completed_by("income_analysis/form_1003_income_timeline.json"),
        FileStageConfig::script("employment", "agents/employment_history_agent.py", 300)
            .completed_by("employment_history/employment_history.json"),
        FileStageConfig::script("scenario", "agents/income_scenario_classifier.py", 120),
        FileStageConfig::script("analysis", "agents/income_analysis_agent.py", 600)
            .with_arg("{param}")
            .with_success("CONSISTENCY SUMMARY")
            .with_no_data("No paystub or W2 documents found")
            .completed_by("income_analysis/consistency_summary_*.json"),
        FileStageConfig {
            name: "summarize".to_string(),
            kind: StageKind::Summarize,
            timeout_seconds: 60,
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analysis_stage() {
        let stages = default_stages();
        let analysis = stages.iter().find(|s| s.name == "analysis").unwrap();
        assert_eq!(analysis.args, vec!["agents/income_analysis_agent.py", "{loan_id}", "{param}"]);
        assert_eq!(analysis.timeout(), Duration::from_secs(600));

        let markers = analysis.markers();
        assert_eq!(markers.success, vec!["CONSISTENCY SUMMARY"]);
        assert_eq!(markers.no_data, vec!["No paystub or W2 documents found"]);
    }

    #[test]
    fn test_to_spec_carries_completion_artifact() {
        let stages = default_stages();
        let form = stages.iter().find(|s| s.name == "form1003").unwrap().to_spec();
        assert_eq!(form.timeout, Duration::from_secs(180));
        assert_eq!(
            form.completion_artifact.as_deref(),
            Some("income_analysis/form_1003_income_timeline.json")
        );
    }

    #[test]
    fn test_deserialize_minimal_stage() {
        let stage: FileStageConfig = toml::from_str(
            r#"
name = "remote"
kind = "http"
url = "http://localhost:8080/stage"
"#,
        )
        .unwrap();
        assert_eq!(stage.kind, StageKind::Http);
        assert_eq!(stage.timeout_seconds, 300);
        assert!(stage.kill_on_timeout);
    }
}
