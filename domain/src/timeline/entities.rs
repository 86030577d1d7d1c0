//! Form snapshots and the income timeline

use super::borrower::BorrowerConsistency;
use super::income_change::IncomeChange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Normalize a borrower name for comparison: trimmed, single-spaced,
/// upper case.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// One uploaded version of the loan application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub version: u32,
    pub upload_date: Option<String>,
    /// Normalized borrower names
    pub borrowers: BTreeSet<String>,
    pub combined_income: Option<f64>,
}

impl FormSnapshot {
    pub fn new(version: u32, upload_date: Option<String>) -> Self {
        Self {
            version,
            upload_date: upload_date.filter(|d| !d.trim().is_empty()),
            borrowers: BTreeSet::new(),
            combined_income: None,
        }
    }

    /// Add a borrower; blank names are ignored.
    pub fn with_borrower(mut self, name: &str) -> Self {
        let normalized = normalize_name(name);
        if !normalized.is_empty() {
            self.borrowers.insert(normalized);
        }
        self
    }

    pub fn with_income(mut self, income: f64) -> Self {
        self.combined_income = Some(income);
        self
    }
}

/// Ordered form snapshots for one loan.
///
/// Snapshots are ordered by upload date; undated snapshots sort first and keep
/// their relative order. An artifact may also carry its own verdict and
/// income summary, used when it has no snapshots to compute from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeTimeline {
    snapshots: Vec<FormSnapshot>,
    recorded_consistency: Option<bool>,
    recorded_explanation: Option<String>,
    recorded_initial_income: Option<f64>,
    recorded_final_income: Option<f64>,
}

impl IncomeTimeline {
    pub fn new(mut snapshots: Vec<FormSnapshot>) -> Self {
        snapshots.sort_by(|a, b| a.upload_date.cmp(&b.upload_date));
        Self {
            snapshots,
            ..Self::default()
        }
    }

    pub fn with_recorded_consistency(
        mut self,
        is_consistent: Option<bool>,
        explanation: Option<String>,
    ) -> Self {
        self.recorded_consistency = is_consistent;
        self.recorded_explanation = explanation;
        self
    }

    pub fn with_recorded_incomes(mut self, initial: Option<f64>, final_income: Option<f64>) -> Self {
        self.recorded_initial_income = initial;
        self.recorded_final_income = final_income;
        self
    }

    pub fn snapshots(&self) -> &[FormSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn earliest(&self) -> Option<&FormSnapshot> {
        self.snapshots.first()
    }

    pub fn latest(&self) -> Option<&FormSnapshot> {
        self.snapshots.last()
    }

    /// Borrower consistency.
    ///
    /// Computed from the snapshots when there are at least two to compare.
    /// With fewer, the artifact's own verdict is used; a timeline that
    /// recorded none is undetermined.
    pub fn borrower_consistency(&self) -> BorrowerConsistency {
        if self.snapshots.len() >= 2 {
            return super::borrower::BorrowerConsistencyCheck::evaluate(&self.snapshots).result;
        }
        match self.recorded_consistency {
            Some(true) => BorrowerConsistency::Consistent,
            Some(false) => BorrowerConsistency::Inconsistent {
                explanation: self
                    .recorded_explanation
                    .clone()
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "borrower set changed".to_string()),
            },
            None => BorrowerConsistency::Undetermined,
        }
    }

    /// Income of the first snapshot, else the recorded initial income.
    pub fn initial_income(&self) -> Option<f64> {
        self.earliest()
            .and_then(|s| s.combined_income)
            .or(self.recorded_initial_income)
    }

    /// Income of the latest snapshot, else the recorded final income.
    pub fn final_income(&self) -> Option<f64> {
        self.latest()
            .and_then(|s| s.combined_income)
            .or(self.recorded_final_income)
    }

    pub fn income_change(&self) -> Option<IncomeChange> {
        Some(IncomeChange::compute(self.initial_income()?, self.final_income()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  john   doe "), "JOHN DOE");
    }

    #[test]
    fn test_snapshots_sorted_by_upload_date() {
        let timeline = IncomeTimeline::new(vec![
            FormSnapshot::new(2, Some("2025-05-20T19:58:12".into())),
            FormSnapshot::new(3, None),
            FormSnapshot::new(1, Some("2025-03-01T10:00:00".into())),
        ]);
        let versions: Vec<u32> = timeline.snapshots().iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![3, 1, 2]);
    }

    #[test]
    fn test_recorded_verdict_used_without_snapshots() {
        let timeline = IncomeTimeline::new(vec![])
            .with_recorded_consistency(Some(false), Some("co-borrower removed".into()));
        assert_eq!(
            timeline.borrower_consistency(),
            BorrowerConsistency::Inconsistent {
                explanation: "co-borrower removed".to_string()
            }
        );
        let unknown = IncomeTimeline::new(vec![]).with_recorded_consistency(None, None);
        assert_eq!(unknown.borrower_consistency(), BorrowerConsistency::Undetermined);
    }

    #[test]
    fn test_single_snapshot_uses_recorded_verdict() {
        let snapshot = FormSnapshot::new(1, Some("2025-03-01".into())).with_borrower("John Doe");
        let recorded = IncomeTimeline::new(vec![snapshot.clone()])
            .with_recorded_consistency(Some(true), None);
        assert_eq!(recorded.borrower_consistency(), BorrowerConsistency::Consistent);

        let unrecorded = IncomeTimeline::new(vec![snapshot]);
        assert_eq!(unrecorded.borrower_consistency(), BorrowerConsistency::Undetermined);
    }

    #[test]
    fn test_income_falls_back_to_recorded_summary() {
        let timeline = IncomeTimeline::new(vec![]).with_recorded_incomes(Some(4000.0), Some(5000.0));
        let change = timeline.income_change().unwrap();
        assert_eq!(change.percent, 25.0);
    }

    #[test]
    fn test_income_change_from_snapshots() {
        let timeline = IncomeTimeline::new(vec![
            FormSnapshot::new(1, Some("2025-01-01".into())).with_income(4000.0),
            FormSnapshot::new(2, Some("2025-02-01".into())).with_income(5000.0),
        ]);
        assert_eq!(timeline.final_income(), Some(5000.0));
        assert_eq!(timeline.income_change().unwrap().net_change, 1000.0);
    }
}
