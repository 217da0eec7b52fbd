//! Presentation layer for addy
//!
//! This crate contains the CLI definition, output formatters,
//! the terminal confirmation prompt and the interactive command loop.

pub mod cli;
pub mod config;
pub mod confirmation;
pub mod output;
pub mod repl;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use config::ReplConfig;
pub use confirmation::InteractiveConfirmation;
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use output::json::JsonFormatter;
pub use repl::CommandRepl;
