//! Consistency summary (the persisted per-loan artifact)

use super::agreement::{AgreementTolerance, ConfidenceTier, FieldAgreement};
use super::sample::{ConsistencySample, INCOME_FIELD, RunConfidence};
use super::statistics::{RunStatistics, UnderwriterDecision};
use crate::core::error::DomainError;
use crate::loan::entities::LoanId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// K runs of the extractor reconciled for one loan.
///
/// Serializes to the `consistency_summary_all.json` layout: the raw run
/// records live under `results`, derived figures beside them. Derived figures
/// are optional on read so older artifacts that only carry `results` load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencySummary {
    #[serde(default)]
    pub loan_id: LoanId,
    #[serde(default)]
    pub total_runs: usize,
    #[serde(default)]
    pub run_range: String,
    #[serde(default)]
    pub documents_analyzed: Value,
    #[serde(default)]
    pub income_documents: Vec<Value>,
    pub results: Vec<ConsistencySample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<RunStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underwriter_decision: Option<UnderwriterDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agreement: Vec<FieldAgreement>,
}

impl ConsistencySummary {
    /// Reconcile `samples` for the tracked `fields`.
    ///
    /// Statistics and the decision are computed over the income field.
    pub fn build(
        loan_id: impl Into<LoanId>,
        samples: Vec<ConsistencySample>,
        fields: &[String],
        tolerance: AgreementTolerance,
    ) -> Result<Self, DomainError> {
        if samples.is_empty() {
            return Err(DomainError::InvalidSampleSize);
        }
        let agreement = fields
            .iter()
            .map(|f| FieldAgreement::compute(f, &samples, tolerance))
            .collect();
        let values = income_values(&samples);
        let documents_analyzed = samples[0]
            .record()
            .get("documents_analyzed")
            .cloned()
            .unwrap_or(Value::from(0));

        Ok(Self {
            loan_id: loan_id.into(),
            total_runs: samples.len(),
            run_range: format!("1-{}", samples.len()),
            documents_analyzed,
            income_documents: Vec::new(),
            statistics: RunStatistics::from_values(&values),
            underwriter_decision: UnderwriterDecision::from_samples(INCOME_FIELD, &samples),
            agreement,
            results: samples,
        })
    }

    /// Recompute every derived figure from the stored `results`.
    pub fn recompute(
        self,
        fields: &[String],
        tolerance: AgreementTolerance,
    ) -> Result<Self, DomainError> {
        let loan_id = self.loan_id.clone();
        let income_documents = self.income_documents.clone();
        let mut rebuilt = Self::build(loan_id, self.results, fields, tolerance)?;
        rebuilt.income_documents = income_documents;
        Ok(rebuilt)
    }

    pub fn sample_size(&self) -> usize {
        self.results.len()
    }

    pub fn agreement_for(&self, field: &str) -> Option<&FieldAgreement> {
        self.agreement.iter().find(|a| a.field == field)
    }

    /// Modal agreement of the income field, computed on demand when the
    /// artifact predates agreement tracking.
    pub fn income_agreement(&self) -> FieldAgreement {
        match self.agreement_for(INCOME_FIELD) {
            Some(a) => a.clone(),
            None => FieldAgreement::compute(INCOME_FIELD, &self.results, AgreementTolerance::Exact),
        }
    }

    pub fn tier(&self) -> ConfidenceTier {
        self.income_agreement().tier
    }

    /// Valid income values in run order.
    pub fn income_values(&self) -> Vec<f64> {
        income_values(&self.results)
    }

    /// Runs that self-reported high confidence.
    pub fn high_confidence_runs(&self) -> usize {
        self.results
            .iter()
            .filter(|s| !s.is_error() && s.value(INCOME_FIELD).is_some())
            .filter(|s| s.confidence() == RunConfidence::High)
            .count()
    }
}

fn income_values(samples: &[ConsistencySample]) -> Vec<f64> {
    samples
        .iter()
        .filter(|s| !s.is_error())
        .filter_map(|s| s.number(INCOME_FIELD))
        .collect()
}
