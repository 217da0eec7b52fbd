//! Dispatch parameters — orchestrator behavior control.
//!
//! [`DispatchConfig`] groups the static parameters that control
//! [`DispatchCommandUseCase`](crate::use_cases::dispatch_command::DispatchCommandUseCase):
//! the confidence floor, how confirmation is obtained and how long each wait
//! may take.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// How a dangerous command gets its yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    /// Ask through the configured [`ConfirmationPort`](crate::ports::confirmation::ConfirmationPort).
    #[default]
    Interactive,
    /// Every confirmation is answered "yes".
    AutoApprove,
    /// Every confirmation is answered "no".
    AutoDecline,
    /// Return a `needs_confirmation` result and let the caller re-submit.
    Defer,
}

impl ConfirmationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationMode::Interactive => "interactive",
            ConfirmationMode::AutoApprove => "auto_approve",
            ConfirmationMode::AutoDecline => "auto_decline",
            ConfirmationMode::Defer => "defer",
        }
    }
}

impl std::fmt::Display for ConfirmationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown confirmation mode '{0}' (expected interactive, auto_approve, auto_decline or defer)")]
pub struct UnknownConfirmationMode(pub String);

impl FromStr for ConfirmationMode {
    type Err = UnknownConfirmationMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "interactive" => Ok(ConfirmationMode::Interactive),
            "auto_approve" | "yes" => Ok(ConfirmationMode::AutoApprove),
            "auto_decline" | "no" => Ok(ConfirmationMode::AutoDecline),
            "defer" => Ok(ConfirmationMode::Defer),
            _ => Err(UnknownConfirmationMode(s.to_string())),
        }
    }
}

/// Orchestrator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Parsed commands below this confidence are treated as not understood.
    pub confidence_floor: f32,
    pub confirmation_mode: ConfirmationMode,
    /// A confirmation that takes longer counts as a decline.
    pub confirmation_timeout: Duration,
    /// Upper bound for one tool invocation. `None` waits indefinitely.
    pub tool_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.5,
            confirmation_mode: ConfirmationMode::Interactive,
            confirmation_timeout: Duration::from_secs(30),
            tool_timeout: None,
        }
    }
}

impl DispatchConfig {
    // ==================== Builder Methods ====================

    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn with_confirmation_mode(mut self, mode: ConfirmationMode) -> Self {
        self.confirmation_mode = mode;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn defers_confirmation(&self) -> bool {
        self.confirmation_mode == ConfirmationMode::Defer
    }
}
