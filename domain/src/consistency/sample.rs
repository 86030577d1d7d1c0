//! One extraction run's record

use super::agreement::SampleValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field the extractor reports the monthly income under.
pub const INCOME_FIELD: &str = "monthly_gross_income";

/// Confidence the extractor self-reports for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunConfidence {
    High,
    #[default]
    Medium,
    Low,
}

impl RunConfidence {
    /// Weight used for the confidence-weighted average.
    pub fn weight(&self) -> f64 {
        match self {
            RunConfidence::High => 1.0,
            RunConfidence::Medium => 0.7,
            RunConfidence::Low => 0.4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunConfidence::High => "high",
            RunConfidence::Medium => "medium",
            RunConfidence::Low => "low",
        }
    }

    /// Lenient parse, anything unrecognised is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(RunConfidence::High),
            "medium" => Some(RunConfidence::Medium),
            "low" => Some(RunConfidence::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record produced by one sampling run.
///
/// Kept as an open JSON object: the extractor decides which fields it
/// reports, and the stored artifact must round-trip whatever it wrote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsistencySample(Map<String, Value>);

impl ConsistencySample {
    pub fn new(run_number: u32) -> Self {
        let mut record = Map::new();
        record.insert("run_number".to_string(), Value::from(run_number));
        Self(record)
    }

    pub fn from_record(record: Map<String, Value>) -> Self {
        Self(record)
    }

    /// A run that did not produce a record.
    pub fn failed(run_number: u32, error: impl Into<String>) -> Self {
        Self::new(run_number).with_field("error", Value::String(error.into()))
    }

    pub fn with_field(mut self, field: impl Into<String>, value: Value) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    /// Stamp the run number, keeping any the extractor already reported.
    pub fn with_run_number(mut self, run_number: u32) -> Self {
        self.0
            .entry("run_number")
            .or_insert_with(|| Value::from(run_number));
        self
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn run_number(&self) -> Option<u32> {
        self.0
            .get("run_number")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    }

    pub fn value(&self, field: &str) -> Option<SampleValue> {
        self.0.get(field).and_then(SampleValue::from_json)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.value(field).and_then(|v| v.as_f64())
    }

    pub fn is_error(&self) -> bool {
        self.0.contains_key("error")
    }

    pub fn error(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    /// Self-reported confidence, `medium` when absent or unrecognised.
    pub fn confidence(&self) -> RunConfidence {
        self.0
            .get("confidence_level")
            .and_then(Value::as_str)
            .and_then(RunConfidence::parse)
            .unwrap_or_default()
    }
}
