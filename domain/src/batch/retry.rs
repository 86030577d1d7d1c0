//! Retry report

use super::summary::BucketEntry;
use crate::loan::entities::LoanId;
use crate::pipeline::LoanOutcome;
use serde::{Deserialize, Serialize};

/// Partition produced by re-running a named set of loans through a
/// sub-pipeline. Independent of the batch the ids came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryReport {
    pub pipeline: String,
    pub succeeded: Vec<LoanId>,
    pub still_failed: Vec<BucketEntry>,
}

impl RetryReport {
    pub fn from_outcomes<'a, I>(pipeline: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a LoanOutcome>,
    {
        let mut report = Self {
            pipeline: pipeline.into(),
            ..Self::default()
        };
        for outcome in outcomes {
            if outcome.is_success() {
                report.succeeded.push(outcome.loan_id.clone());
            } else {
                report.still_failed.push(BucketEntry::from_outcome(outcome));
            }
        }
        report
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.still_failed.len()
    }

    pub fn loan_ids(&self) -> Vec<&LoanId> {
        self.succeeded
            .iter()
            .chain(self.still_failed.iter().map(|e| &e.loan_id))
            .collect()
    }
}
