//! On-disk artifact layouts written by the document stages

use loanflow_domain::{FormSnapshot, IncomeTimeline};
use serde::Deserialize;

/// Relative paths inside a loan directory.
pub const TIMELINE_PATH: &str = "income_analysis/form_1003_income_timeline.json";
pub const SUMMARY_PATH: &str = "income_analysis/consistency_summary_all.json";
pub const SUMMARY_GLOB: &str = "income_analysis/consistency_summary_*.json";
pub const RUNS_DIR: &str = "income_analysis";
pub const RUN_PREFIX: &str = "income_analysis_run";
pub const EMPLOYMENT_PATH: &str = "employment_history/employment_history.json";

/// `form_1003_income_timeline.json`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TimelineArtifact {
    pub borrower_consistency: Option<RecordedConsistency>,
    pub summary: Option<RecordedIncomeSummary>,
    pub income_by_version: Vec<VersionEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordedConsistency {
    pub is_consistent: Option<bool>,
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordedIncomeSummary {
    pub initial_combined_income: Option<f64>,
    pub final_combined_income: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VersionEntry {
    pub version_number: Option<u32>,
    pub upload_date: Option<String>,
    pub primary_borrower: Option<BorrowerEntry>,
    pub co_borrower: Option<BorrowerEntry>,
    pub combined_monthly_income: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BorrowerEntry {
    pub name: Option<String>,
}

impl TimelineArtifact {
    pub fn into_timeline(self) -> IncomeTimeline {
        let snapshots = self
            .income_by_version
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_snapshot(index as u32 + 1))
            .collect();

        let (is_consistent, explanation) = self
            .borrower_consistency
            .map(|c| (c.is_consistent, c.explanation))
            .unwrap_or((None, None));
        let (initial, final_income) = self
            .summary
            .map(|s| (s.initial_combined_income, s.final_combined_income))
            .unwrap_or((None, None));

        IncomeTimeline::new(snapshots)
            .with_recorded_consistency(is_consistent, explanation)
            .with_recorded_incomes(initial, final_income)
    }
}

impl VersionEntry {
    fn into_snapshot(self, fallback_version: u32) -> FormSnapshot {
        let upload_date = self.upload_date.filter(|d| !d.trim().is_empty());
        let mut snapshot =
            FormSnapshot::new(self.version_number.unwrap_or(fallback_version), upload_date);
        for borrower in [self.primary_borrower, self.co_borrower].into_iter().flatten() {
            if let Some(name) = borrower.name.filter(|n| !n.trim().is_empty()) {
                snapshot = snapshot.with_borrower(&name);
            }
        }
        match self.combined_monthly_income {
            Some(income) => snapshot.with_income(income),
            None => snapshot,
        }
    }
}

/// `employment_history.json`, only the part the comparison needs.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmploymentArtifact {
    pub income_scenario_classification: Option<ScenarioClassification>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioClassification {
    pub income_type: Option<String>,
}

/// Run number from an `income_analysis_run<N>.json` file stem.
pub fn run_number_from_stem(stem: &str) -> Option<u32> {
    stem.strip_prefix(RUN_PREFIX)?.parse().ok()
}
