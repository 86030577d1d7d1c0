//! Map-backed store shared by the use case tests.

use crate::ports::loan_store::{ArtifactError, LoanStorePort, StoreError};
use loanflow_domain::{
    ArtifactRequirement, ConsistencySample, ConsistencySummary, IncomeTimeline, Loan, LoanId,
    StageSpec,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// What the store holds for one loan. `Err` entries simulate a broken file.
#[derive(Default, Clone)]
pub struct LoanFixture {
    pub summary: Option<Result<ConsistencySummary, String>>,
    pub timeline: Option<Result<IncomeTimeline, String>>,
    pub income_type: Option<String>,
    /// Run records keyed by run number
    pub runs: BTreeMap<u32, ConsistencySample>,
    /// Stages whose completion artifact is present
    pub completed: Vec<String>,
}

impl LoanFixture {
    pub fn with_runs(mut self, runs: Vec<ConsistencySample>) -> Self {
        for (index, sample) in runs.into_iter().enumerate() {
            self.runs.insert(index as u32 + 1, sample);
        }
        self
    }

    pub fn with_completed(mut self, stages: &[&str]) -> Self {
        self.completed = stages.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn saved_summary(&self) -> Option<&ConsistencySummary> {
        self.summary.as_ref().and_then(|s| s.as_ref().ok())
    }
}

#[derive(Default)]
pub struct FixtureStore {
    loans: Mutex<BTreeMap<String, LoanFixture>>,
}

impl FixtureStore {
    pub fn with_loan(self, id: &str, fixture: LoanFixture) -> Self {
        self.loans.lock().unwrap().insert(id.to_string(), fixture);
        self
    }

    /// Current state of one loan, after whatever the use case wrote.
    pub fn loan(&self, id: &str) -> LoanFixture {
        self.loans.lock().unwrap().get(id).cloned().unwrap_or_default()
    }

    fn update(&self, loan_id: &LoanId, f: impl FnOnce(&mut LoanFixture)) {
        let mut loans = self.loans.lock().unwrap();
        f(loans.entry(loan_id.to_string()).or_default());
    }
}

fn lookup<T>(entry: Option<Result<T, String>>, file: &str) -> Result<T, ArtifactError> {
    match entry {
        None => Err(ArtifactError::Missing(PathBuf::from(file))),
        Some(Ok(value)) => Ok(value),
        Some(Err(reason)) => Err(ArtifactError::Malformed {
            path: PathBuf::from(file),
            reason,
        }),
    }
}

impl LoanStorePort for FixtureStore {
    fn discover(&self, _requirement: &ArtifactRequirement) -> Result<Vec<LoanId>, StoreError> {
        Ok(self.loans.lock().unwrap().keys().map(LoanId::new).collect())
    }

    fn inspect(&self, loan_id: &LoanId, stages: &[StageSpec]) -> Loan {
        let fixture = self.loan(loan_id.as_str());
        stages.iter().fold(Loan::new(loan_id.clone()), |loan, s| {
            let done = fixture.completed.contains(&s.name);
            loan.with_artifact(s.name.clone(), done)
        })
    }

    fn artifact_exists(&self, loan_id: &LoanId, pattern: &str) -> bool {
        self.loan(loan_id.as_str())
            .completed
            .iter()
            .any(|s| s == pattern)
    }

    fn load_timeline(&self, loan_id: &LoanId) -> Result<IncomeTimeline, ArtifactError> {
        lookup(
            self.loan(loan_id.as_str()).timeline,
            "form_1003_income_timeline.json",
        )
    }

    fn load_consistency_summary(
        &self,
        loan_id: &LoanId,
    ) -> Result<ConsistencySummary, ArtifactError> {
        lookup(
            self.loan(loan_id.as_str()).summary,
            "consistency_summary_all.json",
        )
    }

    fn load_run_records(&self, loan_id: &LoanId) -> Result<Vec<ConsistencySample>, ArtifactError> {
        Ok(self.loan(loan_id.as_str()).runs.into_values().collect())
    }

    fn clear_run_records(&self, loan_id: &LoanId) -> Result<usize, ArtifactError> {
        let mut cleared = 0;
        self.update(loan_id, |fixture| {
            cleared = fixture.runs.len();
            fixture.runs.clear();
        });
        Ok(cleared)
    }

    fn save_run_record(
        &self,
        loan_id: &LoanId,
        run: u32,
        sample: &ConsistencySample,
    ) -> Result<PathBuf, ArtifactError> {
        self.update(loan_id, |fixture| {
            fixture.runs.insert(run, sample.clone());
        });
        Ok(PathBuf::from(format!("income_analysis_run{}.json", run)))
    }

    fn save_consistency_summary(
        &self,
        summary: &ConsistencySummary,
    ) -> Result<PathBuf, ArtifactError> {
        self.update(&summary.loan_id, |fixture| {
            fixture.summary = Some(Ok(summary.clone()));
        });
        Ok(PathBuf::from("consistency_summary_all.json"))
    }

    fn load_income_type(&self, loan_id: &LoanId) -> Result<Option<String>, ArtifactError> {
        Ok(self.loan(loan_id.as_str()).income_type)
    }
}
