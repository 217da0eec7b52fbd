//! Tool fault type.
//!
//! A [`ToolError`] is an *internal* fault (I/O, HTTP, process failure). Input a
//! tool can reject on its own is reported as a failed
//! [`ExecutionResult`](crate::dispatch::ExecutionResult) instead; the
//! dispatcher converts any `ToolError` into a `ToolFault` result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error that occurred inside a tool.
///
/// | Code | Typical cause |
/// |------|---------------|
/// | `INVALID_ARGUMENT` | entity has the wrong shape after validation |
/// | `NOT_FOUND` | external resource vanished mid-operation |
/// | `PERMISSION_DENIED` | OS refused the operation |
/// | `EXECUTION_FAILED` | I/O, HTTP or process failure |
/// | `UNAVAILABLE` | required system command or service is missing |
/// | `TIMEOUT` | operation exceeded its time budget |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}{}", details_suffix(.details))]
pub struct ToolError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("{} does not exist", what.into()))
    }

    pub fn permission_denied(what: impl Into<String>) -> Self {
        Self::new("PERMISSION_DENIED", format!("Access to {} refused", what.into()))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::new("UNAVAILABLE", format!("Not available: {}", what.into()))
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new("TIMEOUT", format!("{} did not finish in time", operation.into()))
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::new("NOT_FOUND", err.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                Self::new("PERMISSION_DENIED", err.to_string())
            }
            _ => Self::execution_failed(err.to_string()),
        }
    }
}

fn details_suffix(details: &Option<String>) -> String {
    details
        .as_deref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}
