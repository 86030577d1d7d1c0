//! Logging infrastructure: structured batch event logging.
//!
//! Provides [`JsonlBatchLogger`], a JSONL file writer that implements
//! the [`BatchEventLogger`](loanflow_application::BatchEventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlBatchLogger;
