//! Result aggregation

use crate::loan::entities::LoanId;
use crate::pipeline::LoanOutcome;
use crate::stage::outcome::OutcomeKind;
use crate::stage::result::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One non-success loan in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub loan_id: LoanId,
    pub stage: Option<String>,
    pub reason: String,
}

impl BucketEntry {
    pub fn from_outcome(outcome: &LoanOutcome) -> Self {
        Self {
            loan_id: outcome.loan_id.clone(),
            stage: outcome.stopped_at.clone(),
            reason: outcome
                .reason
                .clone()
                .unwrap_or_else(|| outcome.outcome.as_str().to_string()),
        }
    }
}

/// Per-bucket view of a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: Vec<LoanId>,
    pub no_data: Vec<BucketEntry>,
    pub timed_out: Vec<BucketEntry>,
    pub failed: Vec<BucketEntry>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl BatchSummary {
    pub fn from_outcomes<'a, I>(outcomes: I, duration: Duration) -> Self
    where
        I: IntoIterator<Item = &'a LoanOutcome>,
    {
        let mut summary = Self {
            duration,
            ..Self::default()
        };
        for outcome in outcomes {
            summary.total += 1;
            match outcome.outcome {
                OutcomeKind::Success => summary.succeeded.push(outcome.loan_id.clone()),
                OutcomeKind::NoData => summary.no_data.push(BucketEntry::from_outcome(outcome)),
                OutcomeKind::Timeout => summary.timed_out.push(BucketEntry::from_outcome(outcome)),
                OutcomeKind::Failure => summary.failed.push(BucketEntry::from_outcome(outcome)),
            }
        }
        summary
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        match kind {
            OutcomeKind::Success => self.succeeded.len(),
            OutcomeKind::NoData => self.no_data.len(),
            OutcomeKind::Timeout => self.timed_out.len(),
            OutcomeKind::Failure => self.failed.len(),
        }
    }

    /// Share of the batch in `kind`, 0.0 for an empty batch.
    pub fn percentage(&self, kind: OutcomeKind) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(kind) as f64 / self.total as f64 * 100.0
    }

    /// Non-success entries for `kind`; empty for success.
    pub fn entries(&self, kind: OutcomeKind) -> &[BucketEntry] {
        match kind {
            OutcomeKind::Success => &[],
            OutcomeKind::NoData => &self.no_data,
            OutcomeKind::Timeout => &self.timed_out,
            OutcomeKind::Failure => &self.failed,
        }
    }

    /// Loan ids that did not succeed, in bucket order. Feed these to a retry.
    pub fn unsuccessful_ids(&self) -> Vec<LoanId> {
        self.timed_out
            .iter()
            .chain(&self.failed)
            .chain(&self.no_data)
            .map(|e| e.loan_id.clone())
            .collect()
    }

    /// `success + no_data + timeout + failure == total`
    pub fn is_balanced(&self) -> bool {
        OutcomeKind::ALL.iter().map(|k| self.count(*k)).sum::<usize>() == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, kind: OutcomeKind) -> LoanOutcome {
        let mut outcome = LoanOutcome::failed(id, "x".repeat(10));
        outcome.outcome = kind;
        if kind == OutcomeKind::Success {
            outcome.reason = None;
        } else {
            outcome.stopped_at = Some("analysis".to_string());
        }
        outcome
    }

    #[test]
    fn test_buckets_sum_to_total() {
        let outcomes = vec![
            outcome("A", OutcomeKind::Success),
            outcome("B", OutcomeKind::NoData),
            outcome("C", OutcomeKind::Timeout),
            outcome("D", OutcomeKind::Failure),
            outcome("E", OutcomeKind::Success),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes, Duration::from_secs(9));
        assert_eq!(summary.total, 5);
        assert_eq!(summary.count(OutcomeKind::Success), 2);
        assert_eq!(summary.count(OutcomeKind::Timeout), 1);
        assert!(summary.is_balanced());
        assert!((summary.percentage(OutcomeKind::Success) - 40.0).abs() < f64::EPSILON);
        assert_eq!(summary.entries(OutcomeKind::Failure)[0].loan_id.as_str(), "D");
        assert_eq!(
            summary.entries(OutcomeKind::NoData)[0].stage.as_deref(),
            Some("analysis")
        );
    }

    #[test]
    fn test_empty_batch_percentages_are_zero() {
        let summary = BatchSummary::from_outcomes(&Vec::<LoanOutcome>::new(), Duration::ZERO);
        assert_eq!(summary.total, 0);
        for kind in OutcomeKind::ALL {
            assert_eq!(summary.count(kind), 0);
            assert_eq!(summary.percentage(kind), 0.0);
        }
        assert!(summary.is_balanced());
    }

    #[test]
    fn test_unsuccessful_ids() {
        let outcomes = vec![
            outcome("A", OutcomeKind::Success),
            outcome("B", OutcomeKind::Failure),
            outcome("C", OutcomeKind::Timeout),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes, Duration::ZERO);
        let ids: Vec<String> = summary
            .unsuccessful_ids()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(ids, vec!["C", "B"]);
    }
}
