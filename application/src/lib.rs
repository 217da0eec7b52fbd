//! Application layer for addy
//!
//! This crate contains the dispatch use case, port definitions, and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ConfirmationMode, DispatchConfig, UnknownConfirmationMode};
pub use ports::{
    command_logger::{CommandEvent, CommandLogger, NoCommandLogger},
    confirmation::{
        AutoApproveConfirmation, AutoDeclineConfirmation, ConfirmationError, ConfirmationPort,
    },
    tool_registry::ToolRegistryPort,
};
pub use use_cases::dispatch_command::{DispatchCommandUseCase, DispatchError};
pub use use_cases::recommend::{Recommendation, ToolRecommender};
