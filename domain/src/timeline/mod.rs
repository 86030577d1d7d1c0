//! Timeline subdomain: uploaded versions of the loan application form.
//!
//! - [`entities::IncomeTimeline`]: snapshots ordered by upload date
//! - [`borrower::BorrowerConsistencyCheck`]: tri-state borrower identity check
//! - [`income_change::IncomeChange`]: first-to-last income movement
//! - [`audit::TimelineAudit`]: store-wide roll-up of the above

pub mod audit;
pub mod borrower;
pub mod entities;
pub mod income_change;
