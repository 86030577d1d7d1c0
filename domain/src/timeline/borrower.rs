//! Borrower consistency check

use super::entities::FormSnapshot;
use serde::{Deserialize, Serialize};

/// Whether the borrowers on a loan stayed the same across form versions.
///
/// `Undetermined` is a distinct state and is never read as consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BorrowerConsistency {
    Consistent,
    Inconsistent { explanation: String },
    /// Fewer than two snapshots to compare
    Undetermined,
}

impl BorrowerConsistency {
    /// `Some(true)`, `Some(false)`, or `None` when undetermined.
    pub fn is_consistent(&self) -> Option<bool> {
        match self {
            BorrowerConsistency::Consistent => Some(true),
            BorrowerConsistency::Inconsistent { .. } => Some(false),
            BorrowerConsistency::Undetermined => None,
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            BorrowerConsistency::Inconsistent { explanation } => Some(explanation),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BorrowerConsistency::Consistent => "consistent",
            BorrowerConsistency::Inconsistent { .. } => "inconsistent",
            BorrowerConsistency::Undetermined => "undetermined",
        }
    }
}

/// Comparison of the earliest and latest snapshot's borrower sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerConsistencyCheck {
    /// On the latest snapshot but not the earliest
    pub added: Vec<String>,
    /// On the earliest snapshot but not the latest
    pub removed: Vec<String>,
    pub result: BorrowerConsistency,
}

impl BorrowerConsistencyCheck {
    /// Evaluate ordered snapshots (earliest first).
    pub fn evaluate(snapshots: &[FormSnapshot]) -> Self {
        let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
            return Self::undetermined();
        };
        if snapshots.len() < 2 {
            return Self::undetermined();
        }

        let added: Vec<String> = last.borrowers.difference(&first.borrowers).cloned().collect();
        let removed: Vec<String> = first.borrowers.difference(&last.borrowers).cloned().collect();

        let result = if added.is_empty() && removed.is_empty() {
            BorrowerConsistency::Consistent
        } else {
            let mut changes = Vec::new();
            if !added.is_empty() {
                changes.push(format!("added {}", added.join(", ")));
            }
            if !removed.is_empty() {
                changes.push(format!("removed {}", removed.join(", ")));
            }
            BorrowerConsistency::Inconsistent {
                explanation: format!(
                    "Borrowers changed between version {} and version {}: {}",
                    first.version,
                    last.version,
                    changes.join("; ")
                ),
            }
        };

        Self {
            added,
            removed,
            result,
        }
    }

    fn undetermined() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            result: BorrowerConsistency::Undetermined,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(version: u32, names: &[&str]) -> FormSnapshot {
        names
            .iter()
            .fold(FormSnapshot::new(version, None), |s, n| s.with_borrower(n))
    }

    #[test]
    fn test_added_co_borrower_is_inconsistent() {
        let check = BorrowerConsistencyCheck::evaluate(&[
            snapshot(1, &["John Doe"]),
            snapshot(2, &["John Doe", "Jane Doe"]),
        ]);
        assert_eq!(check.added, vec!["JANE DOE".to_string()]);
        assert!(check.removed.is_empty());
        assert_eq!(check.result.is_consistent(), Some(false));
        let explanation = check.result.explanation().unwrap();
        assert!(!explanation.is_empty());
        assert!(explanation.contains("added JANE DOE"));
    }

    #[test]
    fn test_same_names_is_consistent() {
        let check = BorrowerConsistencyCheck::evaluate(&[
            snapshot(1, &["John Doe", "Jane Doe"]),
            snapshot(2, &["Jane Doe", "John Doe"]),
            snapshot(3, &["jane  doe", "JOHN DOE "]),
        ]);
        assert_eq!(check.result, BorrowerConsistency::Consistent);
    }

    #[test]
    fn test_single_snapshot_is_undetermined() {
        let check = BorrowerConsistencyCheck::evaluate(&[snapshot(1, &["John Doe"])]);
        assert_eq!(check.result, BorrowerConsistency::Undetermined);
        assert_eq!(check.result.is_consistent(), None);
        let empty = BorrowerConsistencyCheck::evaluate(&[]);
        assert_eq!(empty.result, BorrowerConsistency::Undetermined);
    }

    #[test]
    fn test_removed_borrower() {
        let check = BorrowerConsistencyCheck::evaluate(&[
            snapshot(1, &["John Doe", "Jane Doe"]),
            snapshot(4, &["John Doe"]),
        ]);
        assert_eq!(check.removed, vec!["JANE DOE".to_string()]);
        assert!(
            check
                .result
                .explanation()
                .unwrap()
                .contains("version 1 and version 4")
        );
    }
}
