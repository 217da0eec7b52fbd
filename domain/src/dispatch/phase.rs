//! Per-command lifecycle.

use serde::{Deserialize, Serialize};

/// Phase of a single command.
///
/// ```text
/// Received ─▶ Parsed ─▶ SecurityChecked ─┬─────────────────────────▶ Dispatched ─▶ Completed
///               │             │          └─▶ AwaitingConfirmation ─┘
///               │             │                     │
///               └─────────────┴─────────────────────┴─▶ Rejected
/// ```
///
/// `Completed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandPhase {
    Received,
    Parsed,
    SecurityChecked,
    AwaitingConfirmation,
    Dispatched,
    Completed,
    Rejected,
}

impl CommandPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandPhase::Received => "received",
            CommandPhase::Parsed => "parsed",
            CommandPhase::SecurityChecked => "security_checked",
            CommandPhase::AwaitingConfirmation => "awaiting_confirmation",
            CommandPhase::Dispatched => "dispatched",
            CommandPhase::Completed => "completed",
            CommandPhase::Rejected => "rejected",
        }
    }

    pub fn can_transition_to(&self, next: CommandPhase) -> bool {
        use CommandPhase::*;
        matches!(
            (self, next),
            (Received, Parsed)
                | (Parsed, SecurityChecked)
                | (Parsed, Rejected)
                | (SecurityChecked, AwaitingConfirmation)
                | (SecurityChecked, Dispatched)
                | (SecurityChecked, Rejected)
                | (AwaitingConfirmation, Dispatched)
                | (AwaitingConfirmation, Rejected)
                | (Dispatched, Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandPhase::Completed | CommandPhase::Rejected)
    }
}

impl std::fmt::Display for CommandPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
