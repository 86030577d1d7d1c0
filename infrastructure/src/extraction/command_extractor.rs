//! Extractor that runs one external process per sampling run
//!
//! The process prints its run record as a JSON object on stdout. Anything
//! else it prints before that line is treated as log noise.

use crate::config::FileExtractorConfig;
use crate::process::run_to_completion;
use async_trait::async_trait;
use loanflow_application::ports::extractor::{ExtractionError, ExtractionPort};
use loanflow_domain::{ConsistencySample, LoanId, SentinelMarkers, StageVerdict};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    /// `{loan_id}` and `{run}` are substituted
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    markers: SentinelMarkers,
}

impl CommandExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            markers: SentinelMarkers::default(),
        }
    }

    pub fn from_config(config: &FileExtractorConfig) -> Self {
        let markers = config
            .no_data_markers
            .iter()
            .fold(SentinelMarkers::new(), |m, marker| m.with_no_data(marker));
        let mut extractor = Self::new(&config.program, config.args.clone()).with_markers(markers);
        extractor.working_dir = config.working_dir.clone();
        extractor
    }

    pub fn with_markers(mut self, markers: SentinelMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn render_args(&self, loan_id: &LoanId, run: u32) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{loan_id}", loan_id.as_str())
                    .replace("{run}", &run.to_string())
            })
            .collect()
    }
}

/// The last stdout line that parses as a JSON object, else all of stdout.
fn parse_record(stdout: &str) -> Result<Map<String, Value>, ExtractionError> {
    let from_line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| l.starts_with('{'))
        .find_map(|l| serde_json::from_str::<Map<String, Value>>(l).ok());
    if let Some(record) = from_line {
        return Ok(record);
    }
    serde_json::from_str(stdout.trim()).map_err(|e| ExtractionError::Malformed(e.to_string()))
}

#[async_trait]
impl ExtractionPort for CommandExtractor {
    async fn extract(
        &self,
        loan_id: &LoanId,
        run: u32,
    ) -> Result<ConsistencySample, ExtractionError> {
        let args = self.render_args(loan_id, run);
        debug!("Extractor run {} for loan {}: {} {}", run, loan_id, self.program, args.join(" "));

        let raw = run_to_completion(&self.program, &args, self.working_dir.as_deref(), true)
            .await
            .map_err(|e| ExtractionError::Failed(format!("{}: {}", self.program, e)))?;

        match self.markers.classify(&raw) {
            StageVerdict::NoData(marker) => Err(ExtractionError::NoApplicableData(marker)),
            StageVerdict::Failure(detail) => Err(ExtractionError::Failed(detail)),
            StageVerdict::Success => {
                let record = parse_record(&raw.stdout)?;
                Ok(ConsistencySample::from_record(record).with_run_number(run))
            }
        }
    }
}
