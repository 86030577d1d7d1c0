//! Batch run entity

use super::summary::BatchSummary;
use crate::core::error::DomainError;
use crate::loan::entities::LoanId;
use crate::pipeline::LoanOutcome;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// One orchestration invocation (Entity)
///
/// Holds the submitted loan ids, the concurrency limit, and the mapping from
/// loan id to final outcome. Each submitted id ends up in the mapping exactly
/// once: [`BatchRun::record`] refuses unknown and duplicate ids, and
/// [`BatchRun::finalize`] fills in anything still missing.
#[derive(Debug, Clone)]
pub struct BatchRun {
    submitted: Vec<LoanId>,
    concurrency: usize,
    outcomes: BTreeMap<LoanId, LoanOutcome>,
}

impl BatchRun {
    /// Create a run. Duplicate ids are collapsed, first occurrence wins.
    pub fn new<I, T>(loan_ids: I, concurrency: usize) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = T>,
        T: Into<LoanId>,
    {
        if concurrency == 0 {
            return Err(DomainError::InvalidConcurrency);
        }
        let mut seen = BTreeSet::new();
        let submitted = loan_ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &LoanId| seen.insert(id.clone()))
            .collect();
        Ok(Self {
            submitted,
            concurrency,
            outcomes: BTreeMap::new(),
        })
    }

    pub fn submitted(&self) -> &[LoanId] {
        &self.submitted
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn len(&self) -> usize {
        self.submitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.submitted.is_empty()
    }

    pub fn outcome(&self, loan_id: &LoanId) -> Option<&LoanOutcome> {
        self.outcomes.get(loan_id)
    }

    pub fn record(&mut self, outcome: LoanOutcome) -> Result<(), DomainError> {
        if !self.submitted.contains(&outcome.loan_id) {
            return Err(DomainError::UnknownLoan(outcome.loan_id.to_string()));
        }
        if self.outcomes.contains_key(&outcome.loan_id) {
            return Err(DomainError::DuplicateOutcome(outcome.loan_id.to_string()));
        }
        self.outcomes.insert(outcome.loan_id.clone(), outcome);
        Ok(())
    }

    /// Submitted ids without a recorded outcome, in submission order.
    pub fn pending(&self) -> Vec<&LoanId> {
        self.submitted
            .iter()
            .filter(|id| !self.outcomes.contains_key(*id))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.len() == self.submitted.len()
    }

    /// Close the run: every pending id is recorded as a failure with
    /// `missing_reason`, then outcomes are returned in submission order.
    pub fn finalize(mut self, missing_reason: &str) -> Vec<LoanOutcome> {
        let pending: Vec<LoanId> = self.pending().into_iter().cloned().collect();
        for id in pending {
            self.outcomes
                .insert(id.clone(), LoanOutcome::failed(id, missing_reason));
        }
        let mut outcomes = self.outcomes;
        self.submitted
            .iter()
            .filter_map(|id| outcomes.remove(id))
            .collect()
    }

    pub fn summary(&self, duration: Duration) -> BatchSummary {
        let ordered: Vec<&LoanOutcome> = self
            .submitted
            .iter()
            .filter_map(|id| self.outcomes.get(id))
            .collect();
        BatchSummary::from_outcomes(ordered, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::outcome::OutcomeKind;

    fn ok(id: &str) -> LoanOutcome {
        LoanOutcome::from_results(id, vec![], Duration::ZERO)
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = BatchRun::new(["A"], 0).unwrap_err();
        assert_eq!(err, DomainError::InvalidConcurrency);
    }

    #[test]
    fn test_duplicate_ids_collapsed() {
        let run = BatchRun::new(["A", "B", "A", "C", "B"], 2).unwrap();
        let ids: Vec<&str> = run.submitted().iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_record_rejects_unknown_and_duplicate() {
        let mut run = BatchRun::new(["A"], 1).unwrap();
        assert!(run.record(ok("A")).is_ok());
        assert_eq!(
            run.record(ok("A")),
            Err(DomainError::DuplicateOutcome("A".to_string()))
        );
        assert_eq!(
            run.record(ok("Z")),
            Err(DomainError::UnknownLoan("Z".to_string()))
        );
    }

    #[test]
    fn test_finalize_fills_missing_ids() {
        let mut run = BatchRun::new(["A", "B", "C"], 2).unwrap();
        run.record(ok("C")).unwrap();
        assert!(!run.is_complete());

        let outcomes = run.finalize("task aborted");
        let ids: Vec<&str> = outcomes.iter().map(|o| o.loan_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(outcomes[0].outcome, OutcomeKind::Failure);
        assert_eq!(outcomes[0].reason.as_deref(), Some("task aborted"));
        assert_eq!(outcomes[2].outcome, OutcomeKind::Success);
    }

    #[test]
    fn test_empty_batch() {
        let run = BatchRun::new(Vec::<String>::new(), 4).unwrap();
        assert!(run.is_empty());
        assert!(run.is_complete());
        let summary = run.summary(Duration::ZERO);
        assert_eq!(summary.total, 0);
    }
}
