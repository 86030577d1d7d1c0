//! Filesystem document store: one directory per loan under a root

use super::artifacts::{
    EMPLOYMENT_PATH, EmploymentArtifact, RUN_PREFIX, RUNS_DIR, SUMMARY_GLOB, SUMMARY_PATH,
    TIMELINE_PATH, TimelineArtifact, run_number_from_stem,
};
use loanflow_application::ports::loan_store::{ArtifactError, LoanStorePort, StoreError};
use loanflow_domain::{
    ArtifactRequirement, ConsistencySample, ConsistencySummary, IncomeTimeline, Loan, LoanId,
    StageSpec,
};
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loan store backed by `<root>/<loan_id>/...`.
#[derive(Debug, Clone)]
pub struct FsLoanStore {
    root: PathBuf,
}

impl FsLoanStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn loan_dir(&self, loan_id: &LoanId) -> PathBuf {
        self.root.join(loan_id.as_str())
    }

    /// Files under `dir` matching the relative glob `pattern`, sorted.
    fn matches(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, glob::PatternError> {
        let base = glob::Pattern::escape(&dir.to_string_lossy());
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        let mut paths: Vec<PathBuf> = glob::glob(&full)?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn has_match(dir: &Path, pattern: &str) -> bool {
        match Self::matches(dir, pattern) {
            Ok(paths) => !paths.is_empty(),
            Err(e) => {
                debug!("Invalid artifact pattern '{}': {}", pattern, e);
                false
            }
        }
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ArtifactError::Missing(path.to_path_buf()));
            }
            Err(e) => {
                return Err(ArtifactError::Malformed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        serde_json::from_str(&content).map_err(|e| ArtifactError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<PathBuf, ArtifactError> {
        let write_error = |reason: String| ArtifactError::Write {
            path: path.to_path_buf(),
            reason,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(value).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, json).map_err(|e| write_error(e.to_string()))?;
        Ok(path.to_path_buf())
    }
}

impl LoanStorePort for FsLoanStore {
    fn discover(&self, requirement: &ArtifactRequirement) -> Result<Vec<LoanId>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StoreError::RootNotFound(self.root.clone())
            } else {
                StoreError::RootUnreadable {
                    path: self.root.clone(),
                    source: e,
                }
            }
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable store entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                debug!("Skipping non-directory {}", path.display());
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non UTF-8 entry {}", path.display());
                continue;
            };
            if let Some(missing) = requirement
                .patterns()
                .iter()
                .find(|p| !Self::has_match(&path, p))
            {
                debug!("Loan {} lacks '{}', excluded", name, missing);
                continue;
            }
            ids.push(LoanId::new(name));
        }

        ids.sort();
        debug!("Discovered {} loans under {}", ids.len(), self.root.display());
        Ok(ids)
    }

    fn inspect(&self, loan_id: &LoanId, stages: &[StageSpec]) -> Loan {
        let dir = self.loan_dir(loan_id);
        stages
            .iter()
            .filter_map(|s| s.completion_artifact.as_ref().map(|p| (&s.name, p)))
            .fold(Loan::new(loan_id.clone()), |loan, (stage, pattern)| {
                loan.with_artifact(stage.as_str(), Self::has_match(&dir, pattern))
            })
    }

    fn artifact_exists(&self, loan_id: &LoanId, pattern: &str) -> bool {
        Self::has_match(&self.loan_dir(loan_id), pattern)
    }

    fn load_timeline(&self, loan_id: &LoanId) -> Result<IncomeTimeline, ArtifactError> {
        let path = self.loan_dir(loan_id).join(TIMELINE_PATH);
        Ok(Self::read_json::<TimelineArtifact>(&path)?.into_timeline())
    }

    /// `consistency_summary_all.json`, else the last other summary by name.
    fn load_consistency_summary(
        &self,
        loan_id: &LoanId,
    ) -> Result<ConsistencySummary, ArtifactError> {
        let dir = self.loan_dir(loan_id);
        let preferred = dir.join(SUMMARY_PATH);
        let path = if preferred.is_file() {
            preferred
        } else {
            Self::matches(&dir, SUMMARY_GLOB)
                .ok()
                .and_then(|paths| paths.into_iter().last())
                .ok_or(ArtifactError::Missing(preferred))?
        };

        let mut summary: ConsistencySummary = Self::read_json(&path)?;
        if summary.loan_id.as_str().is_empty() {
            summary.loan_id = loan_id.clone();
        }
        Ok(summary)
    }

    fn load_run_records(&self, loan_id: &LoanId) -> Result<Vec<ConsistencySample>, ArtifactError> {
        let dir = self.loan_dir(loan_id).join(RUNS_DIR);
        if !dir.is_dir() {
            return Err(ArtifactError::Missing(dir));
        }
        let pattern = format!("{}*.json", RUN_PREFIX);
        let paths = Self::matches(&dir, &pattern).map_err(|e| ArtifactError::Malformed {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        let mut runs = Vec::new();
        for path in paths {
            let Some(run) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(run_number_from_stem)
            else {
                debug!("Ignoring {}", path.display());
                continue;
            };
            let record: serde_json::Map<String, serde_json::Value> = Self::read_json(&path)?;
            runs.push((run, ConsistencySample::from_record(record).with_run_number(run)));
        }
        runs.sort_by_key(|(run, _)| *run);
        Ok(runs.into_iter().map(|(_, sample)| sample).collect())
    }

    fn clear_run_records(&self, loan_id: &LoanId) -> Result<usize, ArtifactError> {
        let dir = self.loan_dir(loan_id).join(RUNS_DIR);
        if !dir.is_dir() {
            return Ok(0);
        }
        let pattern = format!("{}*.json", RUN_PREFIX);
        let paths = Self::matches(&dir, &pattern).map_err(|e| ArtifactError::Write {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        let mut removed = 0;
        for path in paths {
            let is_run = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(run_number_from_stem)
                .is_some();
            if !is_run {
                continue;
            }
            fs::remove_file(&path).map_err(|e| ArtifactError::Write {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            removed += 1;
        }
        debug!("Cleared {} run records for loan {}", removed, loan_id);
        Ok(removed)
    }

    fn save_run_record(
        &self,
        loan_id: &LoanId,
        run: u32,
        sample: &ConsistencySample,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self
            .loan_dir(loan_id)
            .join(RUNS_DIR)
            .join(format!("{}{}.json", RUN_PREFIX, run));
        Self::write_json(&path, sample)
    }

    fn save_consistency_summary(
        &self,
        summary: &ConsistencySummary,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.loan_dir(&summary.loan_id).join(SUMMARY_PATH);
        Self::write_json(&path, summary)
    }

    fn load_income_type(&self, loan_id: &LoanId) -> Result<Option<String>, ArtifactError> {
        let path = self.loan_dir(loan_id).join(EMPLOYMENT_PATH);
        match Self::read_json::<EmploymentArtifact>(&path) {
            Ok(artifact) => Ok(artifact
                .income_scenario_classification
                .and_then(|c| c.income_type)
                .filter(|t| !t.trim().is_empty())),
            Err(e) if e.is_missing() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
