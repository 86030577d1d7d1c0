//! Extractor configuration from TOML (`[extractor]` section)
//!
//! The extractor is the non-deterministic program sampled K times per loan.
//!
//! ```toml
//! [extractor]
//! program = "python3"
//! args = ["agents/income_analysis_agent.py", "{loan_id}", "--run", "{run}"]
//! sample_size = 3
//! tracked_fields = ["monthly_gross_income"]
//! tolerance = 0.0
//! ```

use loanflow_application::SamplingParams;
use loanflow_domain::{AgreementTolerance, INCOME_FIELD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExtractorConfig {
    pub program: String,
    /// Argument template; `{loan_id}` and `{run}` are substituted
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Deadline for a single run
    pub timeout_seconds: Option<u64>,
    /// K
    pub sample_size: usize,
    pub tracked_fields: Vec<String>,
    /// Absolute band within which numbers agree; 0 means exact equality
    pub tolerance: f64,
    /// Write run records and the summary into the store
    pub persist: bool,
    /// Output meaning the loan has no documents to extract from
    pub no_data_markers: Vec<String>,
}

impl Default for FileExtractorConfig {
    fn default() -> Self {
        Self {
            program: "python3".to_string(),
            args: vec![
                "agents/income_analysis_agent.py".to_string(),
                "{loan_id}".to_string(),
                "--run".to_string(),
                "{run}".to_string(),
            ],
            working_dir: None,
            timeout_seconds: Some(300),
            sample_size: 3,
            tracked_fields: vec![INCOME_FIELD.to_string()],
            tolerance: 0.0,
            persist: true,
            no_data_markers: vec!["No paystub or W2 documents found".to_string()],
        }
    }
}

impl FileExtractorConfig {
    pub fn agreement_tolerance(&self) -> AgreementTolerance {
        if self.tolerance > 0.0 {
            AgreementTolerance::Absolute(self.tolerance)
        } else {
            AgreementTolerance::Exact
        }
    }

    pub fn to_sampling_params(&self) -> SamplingParams {
        let params = SamplingParams::default()
            .with_sample_size(self.sample_size)
            .with_tracked_fields(self.tracked_fields.clone())
            .with_tolerance(self.agreement_tolerance())
            .with_run_timeout(self.timeout_seconds.map(Duration::from_secs));
        if self.persist {
            params
        } else {
            params.without_persistence()
        }
    }
}
