//! Loan entities and identifiers

use crate::stage::outcome::OutcomeKind;
use crate::stage::result::StageResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a loan (the case number in the document store).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(String);

impl LoanId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for LoanId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for LoanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prerequisite artifacts a loan must have before a pipeline may run.
///
/// Each pattern is a glob relative to the loan's directory and must match at
/// least one file (e.g. `semantic_json/*.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRequirement {
    patterns: Vec<String>,
}

impl ArtifactRequirement {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// A requirement every loan directory satisfies.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// A loan being processed (Entity)
///
/// Created at discovery time with the artifacts already present, then updated
/// only by recording stage results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    id: LoanId,
    /// Stage name -> whether that stage's artifact is present
    artifacts: BTreeMap<String, bool>,
    status: Option<OutcomeKind>,
}

impl Loan {
    pub fn new(id: impl Into<LoanId>) -> Self {
        Self {
            id: id.into(),
            artifacts: BTreeMap::new(),
            status: None,
        }
    }

    pub fn with_artifact(mut self, stage: impl Into<String>, present: bool) -> Self {
        self.artifacts.insert(stage.into(), present);
        self
    }

    pub fn id(&self) -> &LoanId {
        &self.id
    }

    pub fn has_artifact(&self, stage: &str) -> bool {
        self.artifacts.get(stage).copied().unwrap_or(false)
    }

    pub fn artifacts(&self) -> &BTreeMap<String, bool> {
        &self.artifacts
    }

    /// Final status, once a stage result has been recorded.
    pub fn status(&self) -> Option<OutcomeKind> {
        self.status
    }

    /// Record one stage result.
    ///
    /// A successful stage marks its artifact present. The status never moves
    /// from a preempting kind (timeout, failure) back to success or no_data.
    pub fn record(&mut self, result: &StageResult) {
        if result.outcome == OutcomeKind::Success {
            self.artifacts.insert(result.stage.clone(), true);
        }
        self.status = Some(match self.status {
            Some(current) => current.merge(result.outcome),
            None => result.outcome,
        });
    }
}
