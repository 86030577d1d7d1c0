//! Port for structured batch event logging.
//!
//! Defines the [`BatchEventLogger`] trait for recording batch events (batch
//! start, stage results, loan outcomes, batch summary) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures an audit
//! trail of the batch in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured batch event for logging.
pub struct BatchEvent {
    /// Event type identifier (e.g., "batch_started", "loan_finished").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl BatchEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging batch events to a structured log.
///
/// `log` is synchronous and infallible; a failed write never aborts a batch.
pub trait BatchEventLogger: Send + Sync {
    fn log(&self, event: BatchEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoEventLogger;

impl BatchEventLogger for NoEventLogger {
    fn log(&self, _event: BatchEvent) {}
}
