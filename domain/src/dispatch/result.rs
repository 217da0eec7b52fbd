//! Uniform outcome of a command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Failure,
    /// A dangerous operation is waiting for the caller to confirm it.
    NeedsConfirmation,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Failure => "failure",
            ExecutionStatus::NeedsConfirmation => "needs_confirmation",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a command failed.
///
/// | Kind | Origin | Log level |
/// |------|--------|-----------|
/// | `NoMatch` | no rule fired | info |
/// | `LowConfidence` | rule fired below the confidence floor | info |
/// | `Incomplete` | required slot missing | info |
/// | `PolicyDenied` | restricted path | warn |
/// | `ConfirmationDeclined` | user said no, or the wait timed out | warn |
/// | `UnresolvedIntent` | no tool registered for the intent | error |
/// | `ToolFault` | tool returned `Err` or panicked | error |
/// | `ToolFailure` | tool rejected the request itself | info |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoMatch,
    LowConfidence,
    Incomplete,
    PolicyDenied,
    ConfirmationDeclined,
    UnresolvedIntent,
    ToolFault,
    ToolFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NoMatch => "no_match",
            FailureKind::LowConfidence => "low_confidence",
            FailureKind::Incomplete => "incomplete",
            FailureKind::PolicyDenied => "policy_denied",
            FailureKind::ConfirmationDeclined => "confirmation_declined",
            FailureKind::UnresolvedIntent => "unresolved_intent",
            FailureKind::ToolFault => "tool_fault",
            FailureKind::ToolFailure => "tool_failure",
        }
    }

    /// Failure caused by how the assistant was assembled, not by user input.
    pub fn is_config_defect(&self) -> bool {
        matches!(self, FailureKind::UnresolvedIntent)
    }

    /// The user's words were not understood well enough to act on.
    pub fn is_misrecognition(&self) -> bool {
        matches!(self, FailureKind::NoMatch | FailureKind::LowConfidence)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result handed back to the feedback layer.
///
/// `message` is what gets spoken or displayed. `cause` carries the underlying
/// fault text for logs and is never meant for the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Success,
            message: message.into(),
            data: None,
            failure: None,
            cause: None,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Failure,
            message: message.into(),
            data: None,
            failure: Some(kind),
            cause: None,
        }
    }

    /// Failure a tool reports for input it cannot act on.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::failure(FailureKind::ToolFailure, message)
    }

    /// Standard answer for missing required parameters.
    pub fn missing_parameters(names: &[&str]) -> Self {
        Self::rejected(format!("缺少必需的参数: {}", names.join(", ")))
    }

    pub fn needs_confirmation(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::NeedsConfirmation,
            message: message.into(),
            data: None,
            failure: None,
            cause: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == ExecutionStatus::Failure
    }

    pub fn needs_confirmation_status(&self) -> bool {
        self.status == ExecutionStatus::NeedsConfirmation
    }

    /// Whether the assistant should end the session after this result.
    pub fn requests_exit(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.get("exit"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
