//! Port definitions (interfaces for external systems)

pub mod event_logger;
pub mod extractor;
pub mod loan_store;
pub mod progress;
pub mod stage;
