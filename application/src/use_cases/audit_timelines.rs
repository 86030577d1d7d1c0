//! Audit Timelines use case
//!
//! Checks borrower consistency and income movement across the form versions
//! of every loan in the store.

use crate::ports::loan_store::{LoanStorePort, StoreError};
use loanflow_domain::{ArtifactIssue, ArtifactRequirement, TimelineAudit, TimelineAuditEntry};
use std::sync::Arc;
use tracing::{info, warn};

pub struct AuditTimelinesUseCase {
    store: Arc<dyn LoanStorePort>,
}

impl AuditTimelinesUseCase {
    pub fn new(store: Arc<dyn LoanStorePort>) -> Self {
        Self { store }
    }

    pub fn execute(&self) -> Result<TimelineAudit, StoreError> {
        let loan_ids = self.store.discover(&ArtifactRequirement::none())?;
        let mut audit = TimelineAudit::default();

        for loan_id in loan_ids {
            match self.store.load_timeline(&loan_id) {
                Ok(timeline) => audit.entries.push(TimelineAuditEntry {
                    borrowers: timeline.borrower_consistency(),
                    income_change: timeline.income_change(),
                    loan_id,
                }),
                Err(e) if e.is_missing() => audit.without_timeline += 1,
                Err(e) => {
                    warn!("Loan {}: {}", loan_id, e);
                    audit.malformed.push(ArtifactIssue {
                        loan_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Audited {} timelines: {} consistent, {} inconsistent, {} undetermined",
            audit.entries.len(),
            audit.consistent(),
            audit.inconsistent(),
            audit.undetermined()
        );
        Ok(audit)
    }
}
