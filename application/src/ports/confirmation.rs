//! Confirmation port for dangerous operations.
//!
//! Before a command the security policy marks as dangerous reaches its tool,
//! the dispatcher asks this port for a yes/no answer.
//!
//! # Architecture
//!
//! Following the Ports and Adapters pattern:
//! - **Port**: [`ConfirmationPort`] - defined here in application layer
//! - **Adapter**: `InteractiveConfirmation` - implemented in presentation layer
//!
//! # Flow
//!
//! ```text
//! SecurityPolicy::classify() → RequiresConfirmation { prompt }
//!        ↓
//! ConfirmationPort::confirm(command, prompt)   (bounded by confirmation_timeout)
//!        ↓
//! true → dispatch      false / error / timeout → ConfirmationDeclined
//! ```
//!
//! # Built-in Implementations
//!
//! - [`AutoApproveConfirmation`] - Always answers yes
//! - [`AutoDeclineConfirmation`] - Always answers no

use addy_domain::ParsedCommand;
use async_trait::async_trait;
use thiserror::Error;

/// Failure to obtain an answer. The dispatcher treats every error as a
/// decline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfirmationError {
    /// User cancelled the prompt (e.g., Ctrl+C or end of input).
    #[error("Confirmation cancelled")]
    Cancelled,
    /// Terminal read failure.
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[async_trait]
pub trait ConfirmationPort: Send + Sync {
    /// Ask whether `command` may proceed.
    ///
    /// `prompt` is the policy's human-readable question
    /// (e.g., "确定要关机吗?").
    async fn confirm(&self, command: &ParsedCommand, prompt: &str)
    -> Result<bool, ConfirmationError>;
}

/// Answers yes to everything.
///
/// # Warning
///
/// Destructive operations run without a second look. Only use for scripted
/// runs in an environment where that is acceptable.
pub struct AutoApproveConfirmation;

#[async_trait]
impl ConfirmationPort for AutoApproveConfirmation {
    async fn confirm(
        &self,
        _command: &ParsedCommand,
        _prompt: &str,
    ) -> Result<bool, ConfirmationError> {
        Ok(true)
    }
}

/// Answers no to everything. The safest non-interactive mode.
pub struct AutoDeclineConfirmation;

#[async_trait]
impl ConfirmationPort for AutoDeclineConfirmation {
    async fn confirm(
        &self,
        _command: &ParsedCommand,
        _prompt: &str,
    ) -> Result<bool, ConfirmationError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addy_domain::Intent;

    #[tokio::test]
    async fn test_auto_approve_confirmation() {
        let command = ParsedCommand::new(Intent::ShutdownSystem, "关机");
        let answer = AutoApproveConfirmation
            .confirm(&command, "确定要关机吗?")
            .await
            .unwrap();
        assert!(answer);
    }

    #[tokio::test]
    async fn test_auto_decline_confirmation() {
        let command = ParsedCommand::new(Intent::ShutdownSystem, "关机");
        let answer = AutoDeclineConfirmation
            .confirm(&command, "确定要关机吗?")
            .await
            .unwrap();
        assert!(!answer);
    }
}
