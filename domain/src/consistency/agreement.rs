//! Agreement counting across sampling runs
//!
//! Runs of the extractor are not expected to return identical values. We
//! count how many runs agree with the modal value and derive a tier from that
//! count, the same way a quorum counts votes.

use super::sample::ConsistencySample;
use serde::{Deserialize, Serialize};

/// One observed value of a tracked field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Number(f64),
    Text(String),
}

impl SampleValue {
    /// Read a JSON value. `null` counts as absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Number(n) => n.as_f64().map(SampleValue::Number),
            serde_json::Value::String(s) => Some(SampleValue::Text(s.trim().to_string())),
            other => Some(SampleValue::Text(other.to_string())),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Number(n) => Some(*n),
            SampleValue::Text(_) => None,
        }
    }

    fn agrees_with(&self, other: &SampleValue, tolerance: AgreementTolerance) -> bool {
        match (self, other) {
            (SampleValue::Number(a), SampleValue::Number(b)) => match tolerance {
                AgreementTolerance::Exact => a == b,
                AgreementTolerance::Absolute(band) => (a - b).abs() <= band,
            },
            (SampleValue::Text(a), SampleValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for SampleValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SampleValue::Number(n) => write!(f, "{:.2}", n),
            SampleValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// When two numeric samples count as agreeing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "band")]
pub enum AgreementTolerance {
    /// Bit-for-bit equal values only
    #[default]
    Exact,
    /// Values within this absolute distance of each other
    Absolute(f64),
}

/// Confidence tier derived from the agreement count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    AllAgree,
    Majority,
    Low,
}

impl ConfidenceTier {
    /// `all_agree` when every run agrees, `majority` at `ceil(K/2) + 1`,
    /// otherwise `low`. K = 0 is always `low`.
    pub fn from_count(count: usize, sample_size: usize) -> Self {
        if sample_size > 0 && count == sample_size {
            ConfidenceTier::AllAgree
        } else if sample_size > 0 && count >= sample_size.div_ceil(2) + 1 {
            ConfidenceTier::Majority
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::AllAgree => "all_agree",
            ConfidenceTier::Majority => "majority",
            ConfidenceTier::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Agreement of one tracked field across K runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAgreement {
    pub field: String,
    /// K, including runs that errored or lacked the field
    pub sample_size: usize,
    /// Distinct values in first-seen order
    pub distinct_values: Vec<SampleValue>,
    /// Size of the largest agreeing group, in `0..=sample_size`
    pub high_confidence_count: usize,
    pub tier: ConfidenceTier,
    /// Runs that errored or did not report the field
    pub unmatched: usize,
}

impl FieldAgreement {
    pub fn compute(
        field: &str,
        samples: &[ConsistencySample],
        tolerance: AgreementTolerance,
    ) -> Self {
        let sample_size = samples.len();
        let values: Vec<SampleValue> = samples
            .iter()
            .filter(|s| !s.is_error())
            .filter_map(|s| s.value(field))
            .collect();

        let high_confidence_count = values
            .iter()
            .map(|v| values.iter().filter(|o| v.agrees_with(o, tolerance)).count())
            .max()
            .unwrap_or(0);

        let mut distinct_values: Vec<SampleValue> = Vec::new();
        for value in &values {
            if !distinct_values.contains(value) {
                distinct_values.push(value.clone());
            }
        }

        Self {
            field: field.to_string(),
            sample_size,
            distinct_values,
            high_confidence_count,
            tier: ConfidenceTier::from_count(high_confidence_count, sample_size),
            unmatched: sample_size - values.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELD: &str = "monthly_gross_income";

    fn samples(values: &[serde_json::Value]) -> Vec<ConsistencySample> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                ConsistencySample::new((i + 1) as u32).with_field(FIELD, v.clone())
            })
            .collect()
    }

    #[test]
    fn test_all_runs_agree() {
        let agreement = FieldAgreement::compute(
            FIELD,
            &samples(&[json!(5000), json!(5000), json!(5000)]),
            AgreementTolerance::Exact,
        );
        assert_eq!(agreement.high_confidence_count, 3);
        assert_eq!(agreement.tier, ConfidenceTier::AllAgree);
        assert_eq!(agreement.distinct_values, vec![SampleValue::Number(5000.0)]);
    }

    #[test]
    fn test_all_runs_differ() {
        let agreement = FieldAgreement::compute(
            FIELD,
            &samples(&[json!(5000), json!(5200), json!(4800)]),
            AgreementTolerance::Exact,
        );
        assert_eq!(agreement.high_confidence_count, 1);
        assert_eq!(agreement.tier, ConfidenceTier::Low);
        assert_eq!(agreement.distinct_values.len(), 3);
    }

    #[test]
    fn test_errored_and_missing_runs_join_no_group() {
        let mut runs = samples(&[json!(5000), json!(5000), json!(null)]);
        runs.push(ConsistencySample::failed(4, "rate limited"));
        let agreement = FieldAgreement::compute(FIELD, &runs, AgreementTolerance::Exact);
        assert_eq!(agreement.sample_size, 4);
        assert_eq!(agreement.high_confidence_count, 2);
        assert_eq!(agreement.unmatched, 2);
        assert_eq!(agreement.tier, ConfidenceTier::Low);
    }

    #[test]
    fn test_tolerance_band() {
        let runs = samples(&[json!(5000.0), json!(5000.4), json!(4999.8)]);
        let exact = FieldAgreement::compute(FIELD, &runs, AgreementTolerance::Exact);
        let banded = FieldAgreement::compute(FIELD, &runs, AgreementTolerance::Absolute(0.5));
        assert_eq!(exact.high_confidence_count, 1);
        assert_eq!(banded.high_confidence_count, 3);
    }

    #[test]
    fn test_count_is_bounded_by_k() {
        let runs = samples(&[json!(1), json!(1), json!(1), json!(1), json!(1)]);
        let agreement = FieldAgreement::compute(FIELD, &runs, AgreementTolerance::Exact);
        assert!(agreement.high_confidence_count <= agreement.sample_size);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(ConfidenceTier::from_count(5, 5), ConfidenceTier::AllAgree);
        assert_eq!(ConfidenceTier::from_count(4, 5), ConfidenceTier::Majority);
        assert_eq!(ConfidenceTier::from_count(3, 5), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_count(3, 4), ConfidenceTier::Majority);
        assert_eq!(ConfidenceTier::from_count(0, 0), ConfidenceTier::Low);
    }

    #[test]
    fn test_text_values() {
        let runs = samples(&[json!("W2"), json!(" W2 "), json!("SELF_EMPLOYED")]);
        let agreement = FieldAgreement::compute(FIELD, &runs, AgreementTolerance::Exact);
        assert_eq!(agreement.high_confidence_count, 2);
    }
}
