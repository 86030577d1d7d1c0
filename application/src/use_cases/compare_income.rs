//! Compare Income use case
//!
//! Builds the store-wide table of extracted income against the final
//! application form.

use crate::ports::loan_store::{ArtifactError, LoanStorePort, StoreError};
use loanflow_domain::{ArtifactIssue, ArtifactRequirement, ComparisonRow, ComparisonTable, LoanId};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct CompareIncomeUseCase {
    store: Arc<dyn LoanStorePort>,
}

impl CompareIncomeUseCase {
    pub fn new(store: Arc<dyn LoanStorePort>) -> Self {
        Self { store }
    }

    /// Only a missing or unreadable store root fails the whole comparison.
    pub fn execute(&self) -> Result<ComparisonTable, StoreError> {
        let loan_ids = self.store.discover(&ArtifactRequirement::none())?;
        info!("Comparing income for {} loans", loan_ids.len());

        let mut table = ComparisonTable::default();
        for loan_id in loan_ids {
            self.compare_one(loan_id, &mut table);
        }

        info!(
            "Comparison built: {} rows, {} without consistency data, {} without form income, {} malformed",
            table.rows.len(),
            table.skipped_no_ai,
            table.skipped_no_form,
            table.malformed.len()
        );
        Ok(table)
    }

    fn compare_one(&self, loan_id: LoanId, table: &mut ComparisonTable) {
        let summary = match self.store.load_consistency_summary(&loan_id) {
            Ok(summary) => summary,
            Err(e) if e.is_missing() => {
                table.skipped_no_ai += 1;
                return;
            }
            Err(e) => return record_issue(table, loan_id, e),
        };

        let timeline = match self.store.load_timeline(&loan_id) {
            Ok(timeline) => timeline,
            Err(e) if e.is_missing() => {
                table.skipped_no_form += 1;
                return;
            }
            Err(e) => return record_issue(table, loan_id, e),
        };
        let Some(form_final) = timeline.final_income() else {
            debug!("Loan {}: timeline has no final income", loan_id);
            table.skipped_no_form += 1;
            return;
        };

        let income_type = self.store.load_income_type(&loan_id).unwrap_or_else(|e| {
            debug!("Loan {}: income type unavailable: {}", loan_id, e);
            None
        });

        match ComparisonRow::build(loan_id.clone(), income_type, &summary, form_final) {
            Some(row) => table.rows.push(row),
            None => {
                debug!("Loan {}: no run reported an income", loan_id);
                table.skipped_no_ai += 1;
            }
        }
    }
}

fn record_issue(table: &mut ComparisonTable, loan_id: LoanId, err: ArtifactError) {
    warn!("Loan {}: {}", loan_id, err);
    table.malformed.push(ArtifactIssue {
        loan_id,
        reason: err.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{FixtureStore, LoanFixture};
    use loanflow_domain::{
        AgreementTolerance, ConsistencySample, ConsistencySummary, FormSnapshot, INCOME_FIELD,
        IncomeTimeline, UNKNOWN_INCOME_TYPE,
    };
    use serde_json::json;

    fn summary(incomes: &[f64]) -> ConsistencySummary {
        let samples = incomes
            .iter()
            .enumerate()
            .map(|(i, v)| ConsistencySample::new(i as u32 + 1).with_field(INCOME_FIELD, json!(v)))
            .collect();
        ConsistencySummary::build(
            "L",
            samples,
            &[INCOME_FIELD.to_string()],
            AgreementTolerance::Exact,
        )
        .unwrap()
    }

    fn timeline(final_income: f64) -> IncomeTimeline {
        IncomeTimeline::new(vec![
            FormSnapshot::new(1, Some("2024-01-01".into())).with_income(4000.0),
            FormSnapshot::new(2, Some("2024-02-01".into())).with_income(final_income),
        ])
    }

    #[test]
    fn test_builds_row_per_complete_loan() {
        let store = FixtureStore::default()
            .with_loan(
                "L1",
                LoanFixture {
                    summary: Some(Ok(summary(&[5000.0, 5000.0, 5200.0]))),
                    timeline: Some(Ok(timeline(4800.0))),
                    income_type: Some("W2".into()),
                    ..Default::default()
                },
            )
            .with_loan(
                "L2",
                LoanFixture {
                    summary: Some(Ok(summary(&[3000.0]))),
                    timeline: Some(Ok(timeline(0.0))),
                    income_type: None,
                    ..Default::default()
                },
            );

        let table = CompareIncomeUseCase::new(Arc::new(store)).execute().unwrap();
        assert_eq!(table.rows.len(), 2);

        let first = &table.rows[0];
        assert_eq!(first.loan_id, LoanId::new("L1"));
        assert_eq!(first.income_type, "W2");
        assert_eq!(first.ai_median, 5000.0);
        assert_eq!(first.form_1003_final, 4800.0);
        assert_eq!(first.median_vs_1003_diff, 200.0);
        assert_eq!(first.high_confidence_count, 2);

        let second = &table.rows[1];
        assert_eq!(second.income_type, UNKNOWN_INCOME_TYPE);
        assert_eq!(second.median_vs_1003_pct, 0.0);
    }

    #[test]
    fn test_missing_and_malformed_artifacts() {
        let store = FixtureStore::default()
            .with_loan("no_ai", LoanFixture::default())
            .with_loan(
                "no_form",
                LoanFixture {
                    summary: Some(Ok(summary(&[1.0]))),
                    ..Default::default()
                },
            )
            .with_loan(
                "broken",
                LoanFixture {
                    summary: Some(Err("expected value at line 1".into())),
                    ..Default::default()
                },
            );

        let table = CompareIncomeUseCase::new(Arc::new(store)).execute().unwrap();
        assert!(table.rows.is_empty());
        assert_eq!(table.skipped_no_ai, 1);
        assert_eq!(table.skipped_no_form, 1);
        assert_eq!(table.malformed.len(), 1);
        assert_eq!(table.malformed[0].loan_id, LoanId::new("broken"));
    }
}
