//! Port for the structured command audit log.
//!
//! Defines the [`CommandLogger`] trait for recording what happened to each
//! command (phase transitions, policy decisions, final result) in a
//! machine-readable form.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures an audit trail
//! (JSONL in the infrastructure adapter).

use serde_json::Value;

/// A structured command event.
pub struct CommandEvent {
    /// Event type identifier (e.g., "phase", "command_result").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl CommandEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Implementations write each event as a single record. `log` is synchronous
/// and infallible; a logging failure must never affect dispatch.
pub trait CommandLogger: Send + Sync {
    fn log(&self, event: CommandEvent);
}

/// No-op implementation for tests and when the audit log is disabled.
pub struct NoCommandLogger;

impl CommandLogger for NoCommandLogger {
    fn log(&self, _event: CommandEvent) {}
}
