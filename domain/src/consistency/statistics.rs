//! Run statistics and the underwriter decision

use super::sample::{ConsistencySample, RunConfidence};
use serde::{Deserialize, Serialize};

/// Round to cents.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Median of a non-empty slice; mean of the middle pair for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Descriptive statistics over the valid runs of one numeric field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    #[serde(rename = "average_income")]
    pub mean: f64,
    #[serde(rename = "median_income", default)]
    pub median: f64,
    #[serde(rename = "min_income")]
    pub min: f64,
    #[serde(rename = "max_income")]
    pub max: f64,
    /// `max - min`
    #[serde(rename = "variance")]
    pub spread: f64,
    /// Spread relative to the mean, 0 when the mean is not positive
    #[serde(rename = "variance_percentage")]
    pub spread_pct: f64,
    /// 1-based position among valid runs
    pub min_run_number: usize,
    pub max_run_number: usize,
}

impl RunStatistics {
    /// `None` when there are no values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let median = median(values)?;
        let mean = values.iter().sum::<f64>() / values.len() as f64;

        // First occurrence wins on ties.
        let (mut min_idx, mut max_idx) = (0, 0);
        for (i, v) in values.iter().enumerate() {
            if *v < values[min_idx] {
                min_idx = i;
            }
            if *v > values[max_idx] {
                max_idx = i;
            }
        }
        let (min, max) = (values[min_idx], values[max_idx]);
        let spread = max - min;

        Some(Self {
            mean,
            median,
            min,
            max,
            spread,
            spread_pct: if mean > 0.0 { spread / mean * 100.0 } else { 0.0 },
            min_run_number: min_idx + 1,
            max_run_number: max_idx + 1,
        })
    }
}

/// How many runs self-reported each confidence level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceDistribution {
    fn add(&mut self, confidence: RunConfidence) {
        match confidence {
            RunConfidence::High => self.high += 1,
            RunConfidence::Medium => self.medium += 1,
            RunConfidence::Low => self.low += 1,
        }
    }
}

/// Single figure an underwriter should use, with how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwriterDecision {
    pub authoritative_income: f64,
    pub confidence_weighted_avg: f64,
    pub high_confidence_only_avg: f64,
    pub simple_average: f64,
    pub confidence_distribution: ConfidenceDistribution,
    pub confidence_in_result: RunConfidence,
    pub rationale: String,
    pub recommendation: String,
}

impl UnderwriterDecision {
    /// Build the decision for `field` over all runs.
    ///
    /// The high-confidence share is taken over every run, errored ones
    /// included. `None` when no run reported the field.
    pub fn from_samples(field: &str, samples: &[ConsistencySample]) -> Option<Self> {
        let valid: Vec<(f64, RunConfidence)> = samples
            .iter()
            .filter(|s| !s.is_error())
            .filter_map(|s| s.number(field).map(|v| (v, s.confidence())))
            .collect();
        let values: Vec<f64> = valid.iter().map(|(v, _)| *v).collect();
        let stats = RunStatistics::from_values(&values)?;

        let mut distribution = ConfidenceDistribution::default();
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut high_only = Vec::new();
        for (value, confidence) in &valid {
            distribution.add(*confidence);
            weighted_sum += value * confidence.weight();
            weight_total += confidence.weight();
            if *confidence == RunConfidence::High {
                high_only.push(*value);
            }
        }

        let weighted_avg = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            stats.mean
        };
        let high_avg = if high_only.is_empty() {
            stats.mean
        } else {
            high_only.iter().sum::<f64>() / high_only.len() as f64
        };

        let total = samples.len();
        let high_pct = distribution.high as f64 / total as f64 * 100.0;
        let (confidence_in_result, rationale, recommendation) = if high_pct >= 80.0 {
            (
                RunConfidence::High,
                format!(
                    "{}/{} runs achieved high confidence with {:.2}% variance",
                    distribution.high, total, stats.spread_pct
                ),
                if stats.spread_pct < 1.0 {
                    "USE authoritative_income value - high confidence with strong consistency"
                } else {
                    "USE authoritative_income value - high confidence but review variance"
                },
            )
        } else if high_pct >= 50.0 {
            (
                RunConfidence::Medium,
                format!(
                    "{}/{} runs achieved high confidence; {} medium, {} low",
                    distribution.high, total, distribution.medium, distribution.low
                ),
                "REVIEW authoritative_income value - moderate confidence, consider manual verification",
            )
        } else {
            (
                RunConfidence::Low,
                format!(
                    "Only {}/{} runs achieved high confidence; variance {:.2}%",
                    distribution.high, total, stats.spread_pct
                ),
                "MANUAL REVIEW REQUIRED - low confidence across runs or high variance detected",
            )
        };

        Some(Self {
            authoritative_income: round2(weighted_avg),
            confidence_weighted_avg: round2(weighted_avg),
            high_confidence_only_avg: round2(high_avg),
            simple_average: round2(stats.mean),
            confidence_distribution: distribution,
            confidence_in_result,
            rationale,
            recommendation: recommendation.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::sample::INCOME_FIELD;
    use serde_json::json;

    fn run(n: u32, income: f64, confidence: &str) -> ConsistencySample {
        ConsistencySample::new(n)
            .with_field(INCOME_FIELD, json!(income))
            .with_field("confidence_level", json!(confidence))
    }

    #[test]
    fn test_statistics() {
        let stats = RunStatistics::from_values(&[5000.0, 5200.0, 4800.0]).unwrap();
        assert_eq!(stats.mean, 5000.0);
        assert_eq!(stats.median, 5000.0);
        assert_eq!(stats.spread, 400.0);
        assert!((stats.spread_pct - 8.0).abs() < 1e-9);
        assert_eq!(stats.min_run_number, 3);
        assert_eq!(stats.max_run_number, 2);
    }

    #[test]
    fn test_statistics_empty_and_zero_mean() {
        assert!(RunStatistics::from_values(&[]).is_none());
        let stats = RunStatistics::from_values(&[0.0, 0.0]).unwrap();
        assert_eq!(stats.spread_pct, 0.0);
    }

    #[test]
    fn test_even_median() {
        assert_eq!(median(&[1.0, 4.0, 2.0, 3.0]), Some(2.5));
    }

    #[test]
    fn test_decision_all_high() {
        let samples = vec![
            run(1, 5000.0, "high"),
            run(2, 5000.0, "high"),
            run(3, 5000.0, "high"),
        ];
        let decision = UnderwriterDecision::from_samples(INCOME_FIELD, &samples).unwrap();
        assert_eq!(decision.confidence_in_result, RunConfidence::High);
        assert_eq!(decision.authoritative_income, 5000.0);
        assert!(decision.recommendation.contains("strong consistency"));
    }

    #[test]
    fn test_decision_weighting_and_low_confidence() {
        let samples = vec![
            run(1, 6000.0, "high"),
            run(2, 4000.0, "low"),
            ConsistencySample::failed(3, "rate limited"),
        ];
        let decision = UnderwriterDecision::from_samples(INCOME_FIELD, &samples).unwrap();
        // (6000 * 1.0 + 4000 * 0.4) / 1.4
        assert_eq!(decision.confidence_weighted_avg, 5428.57);
        assert_eq!(decision.high_confidence_only_avg, 6000.0);
        assert_eq!(decision.simple_average, 5000.0);
        assert_eq!(decision.confidence_in_result, RunConfidence::Low);
        assert!(decision.rationale.starts_with("Only 1/3"));
    }

    #[test]
    fn test_decision_needs_a_value() {
        let samples = vec![ConsistencySample::failed(1, "boom")];
        assert!(UnderwriterDecision::from_samples(INCOME_FIELD, &samples).is_none());
    }
}
