//! Domain layer for addy
//!
//! This crate contains the core of the assistant: intent recognition, the
//! tool contract, result types and the security policy. It performs no I/O
//! beyond resolving paths for the security policy.
//!
//! # Core Concepts
//!
//! ## Recognition
//!
//! - **Pattern Library**: an ordered table of regex rules with typed capture slots
//! - **Intent Parser**: first-match-wins walk over the table, producing a [`ParsedCommand`]
//!
//! ## Dispatch
//!
//! - **Tool**: capability module implementing one or more intents
//! - **ExecutionResult**: uniform success / failure / needs-confirmation contract
//! - **SecurityPolicy**: confirmation for dangerous intents, denial for restricted paths

pub mod dispatch;
pub mod intent;
pub mod parser;
pub mod pattern;
pub mod security;
pub mod tool;

// Re-export commonly used types
pub use dispatch::{CommandPhase, ExecutionResult, ExecutionStatus, FailureKind};
pub use intent::{
    ClockTime, DateSpec, DateTimeSpec, Entities, EntityValue, Intent, ParsedCommand, SlotKind,
    UnknownIntent,
};
pub use parser::{IntentParser, ParseError, normalize};
pub use pattern::{PatternError, PatternLibrary, Rule, SlotSpec};
pub use security::{PolicyDecision, SecurityPolicy};
pub use tool::{Tool, ToolDescriptor, ToolError};
