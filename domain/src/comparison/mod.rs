//! Income comparison: extracted income against the final application form

use crate::consistency::statistics::{median, round2};
use crate::consistency::summary::ConsistencySummary;
use crate::loan::entities::LoanId;
use serde::{Deserialize, Serialize};

/// Income type used when none was classified.
pub const UNKNOWN_INCOME_TYPE: &str = "UNKNOWN";

/// One row of the aggregate comparison table. Money figures are in cents
/// precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub loan_id: LoanId,
    pub income_type: String,
    pub ai_mean: f64,
    pub ai_median: f64,
    pub form_1003_final: f64,
    pub median_vs_1003_diff: f64,
    /// 0 when the form's final income is 0
    pub median_vs_1003_pct: f64,
    /// Size of the largest group of agreeing runs
    pub high_confidence_count: usize,
    /// Runs that self-reported high confidence
    pub high_confidence_runs: usize,
}

impl ComparisonRow {
    /// Column order of the CSV artifact.
    pub const COLUMNS: [&'static str; 9] = [
        "loan_id",
        "income_type",
        "ai_mean",
        "ai_median",
        "form_1003_final",
        "median_vs_1003_diff",
        "median_vs_1003_pct",
        "high_confidence_count",
        "high_confidence_runs",
    ];

    /// `None` when no run produced an income.
    pub fn build(
        loan_id: impl Into<LoanId>,
        income_type: Option<String>,
        summary: &ConsistencySummary,
        form_final: f64,
    ) -> Option<Self> {
        let values = summary.income_values();
        let ai_median = median(&values)?;
        let ai_mean = values.iter().sum::<f64>() / values.len() as f64;
        let diff = ai_median - form_final;
        let pct = if form_final != 0.0 {
            diff / form_final * 100.0
        } else {
            0.0
        };

        Some(Self {
            loan_id: loan_id.into(),
            income_type: income_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_INCOME_TYPE.to_string()),
            ai_mean: round2(ai_mean),
            ai_median: round2(ai_median),
            form_1003_final: round2(form_final),
            median_vs_1003_diff: round2(diff),
            median_vs_1003_pct: round2(pct),
            high_confidence_count: summary.income_agreement().high_confidence_count,
            high_confidence_runs: summary.high_confidence_runs(),
        })
    }

    /// Field values in [`ComparisonRow::COLUMNS`] order.
    pub fn values(&self) -> Vec<String> {
        vec![
            self.loan_id.to_string(),
            self.income_type.clone(),
            format!("{:.2}", self.ai_mean),
            format!("{:.2}", self.ai_median),
            format!("{:.2}", self.form_1003_final),
            format!("{:.2}", self.median_vs_1003_diff),
            format!("{:.2}", self.median_vs_1003_pct),
            self.high_confidence_count.to_string(),
            self.high_confidence_runs.to_string(),
        ]
    }
}

/// Loan whose artifact could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIssue {
    pub loan_id: LoanId,
    pub reason: String,
}

/// All comparison rows for a store, plus what was left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
    /// Loans without a usable consistency summary
    pub skipped_no_ai: usize,
    /// Loans with a summary but no final form income
    pub skipped_no_form: usize,
    pub malformed: Vec<ArtifactIssue>,
}

impl ComparisonTable {
    pub fn skipped(&self) -> usize {
        self.skipped_no_ai + self.skipped_no_form
    }

    /// Mean of `|median_vs_1003_pct|`, 0 for an empty table.
    pub fn mean_abs_pct(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(|r| r.median_vs_1003_pct.abs()).sum::<f64>() / self.rows.len() as f64
    }

    /// Rows where every run agreed.
    pub fn full_agreement_count(&self, sample_size: usize) -> usize {
        self.rows
            .iter()
            .filter(|r| r.high_confidence_count == sample_size)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::agreement::AgreementTolerance;
    use crate::consistency::sample::{ConsistencySample, INCOME_FIELD};
    use serde_json::json;

    fn summary(values: &[f64]) -> ConsistencySummary {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                ConsistencySample::new(i as u32 + 1)
                    .with_field(INCOME_FIELD, json!(v))
                    .with_field("confidence_level", json!("high"))
            })
            .collect();
        ConsistencySummary::build(
            "L1",
            samples,
            &[INCOME_FIELD.to_string()],
            AgreementTolerance::Exact,
        )
        .unwrap()
    }

    #[test]
    fn test_row_figures() {
        let row = ComparisonRow::build(
            "L1",
            Some("W2".into()),
            &summary(&[5000.0, 5200.0, 4800.0]),
            4000.0,
        )
        .unwrap();
        assert_eq!(row.ai_mean, 5000.0);
        assert_eq!(row.ai_median, 5000.0);
        assert_eq!(row.median_vs_1003_diff, 1000.0);
        assert_eq!(row.median_vs_1003_pct, 25.0);
        assert_eq!(row.high_confidence_count, 1);
        assert_eq!(row.high_confidence_runs, 3);
    }

    #[test]
    fn test_zero_final_income_and_unknown_type() {
        let row = ComparisonRow::build("L1", None, &summary(&[5000.0]), 0.0).unwrap();
        assert_eq!(row.median_vs_1003_pct, 0.0);
        assert_eq!(row.income_type, UNKNOWN_INCOME_TYPE);
    }

    #[test]
    fn test_values_match_columns() {
        let row = ComparisonRow::build("L1", None, &summary(&[5000.0]), 5000.0).unwrap();
        let values = row.values();
        assert_eq!(values.len(), ComparisonRow::COLUMNS.len());
        assert_eq!(values[2], "5000.00");
    }

    #[test]
    fn test_mean_abs_pct() {
        let mut table = ComparisonTable::default();
        assert_eq!(table.mean_abs_pct(), 0.0);
        let mut a = ComparisonRow::build("A", None, &summary(&[5000.0]), 4000.0).unwrap();
        a.median_vs_1003_pct = -10.0;
        let mut b = a.clone();
        b.median_vs_1003_pct = 20.0;
        table.rows = vec![a, b];
        assert_eq!(table.mean_abs_pct(), 15.0);
    }
}
