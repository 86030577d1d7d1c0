//! Store-wide timeline audit

use super::borrower::BorrowerConsistency;
use super::income_change::IncomeChange;
use crate::comparison::ArtifactIssue;
use crate::loan::entities::LoanId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineAuditEntry {
    pub loan_id: LoanId,
    pub borrowers: BorrowerConsistency,
    pub income_change: Option<IncomeChange>,
}

/// Borrower consistency and income movement for every loan with a timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineAudit {
    pub entries: Vec<TimelineAuditEntry>,
    /// Loans in the store with no timeline artifact
    pub without_timeline: usize,
    pub malformed: Vec<ArtifactIssue>,
}

impl TimelineAudit {
    pub fn consistent(&self) -> usize {
        self.count(|b| matches!(b, BorrowerConsistency::Consistent))
    }

    pub fn inconsistent(&self) -> usize {
        self.count(|b| matches!(b, BorrowerConsistency::Inconsistent { .. }))
    }

    pub fn undetermined(&self) -> usize {
        self.count(|b| matches!(b, BorrowerConsistency::Undetermined))
    }

    /// Loans whose combined income moved between first and last version.
    pub fn income_changed(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.income_change.is_some_and(|c| c.changed()))
            .count()
    }

    pub fn income_unchanged(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.income_change.is_some_and(|c| !c.changed()))
            .count()
    }

    /// Entries with an income change, largest absolute percentage first.
    pub fn largest_changes(&self, limit: usize) -> Vec<&TimelineAuditEntry> {
        let mut changed: Vec<&TimelineAuditEntry> = self
            .entries
            .iter()
            .filter(|e| e.income_change.is_some_and(|c| c.changed()))
            .collect();
        changed.sort_by(|a, b| {
            let pa = a.income_change.map(|c| c.percent.abs()).unwrap_or(0.0);
            let pb = b.income_change.map(|c| c.percent.abs()).unwrap_or(0.0);
            pb.total_cmp(&pa)
        });
        changed.truncate(limit);
        changed
    }

    fn count(&self, pred: impl Fn(&BorrowerConsistency) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.borrowers)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, borrowers: BorrowerConsistency, change: Option<(f64, f64)>) -> TimelineAuditEntry {
        TimelineAuditEntry {
            loan_id: LoanId::new(id),
            borrowers,
            income_change: change.map(|(a, b)| IncomeChange::compute(a, b)),
        }
    }

    #[test]
    fn test_counts() {
        let audit = TimelineAudit {
            entries: vec![
                entry("A", BorrowerConsistency::Consistent, Some((4000.0, 5000.0))),
                entry(
                    "B",
                    BorrowerConsistency::Inconsistent {
                        explanation: "added JANE DOE".into(),
                    },
                    Some((5000.0, 5000.0)),
                ),
                entry("C", BorrowerConsistency::Undetermined, None),
                entry("D", BorrowerConsistency::Consistent, Some((1000.0, 3000.0))),
            ],
            ..TimelineAudit::default()
        };
        assert_eq!(audit.consistent(), 2);
        assert_eq!(audit.inconsistent(), 1);
        assert_eq!(audit.undetermined(), 1);
        assert_eq!(audit.income_changed(), 2);
        assert_eq!(audit.income_unchanged(), 1);

        let top = audit.largest_changes(1);
        assert_eq!(top[0].loan_id.as_str(), "D");
    }
}
