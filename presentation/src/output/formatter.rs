//! Output formatter trait

use addy_domain::{ExecutionResult, ParseError, ParsedCommand};

/// Trait for rendering dispatch outcomes
pub trait OutputFormatter: Send + Sync {
    /// Format the result of one dispatched command
    fn format_result(&self, result: &ExecutionResult) -> String;

    /// Format a recognition result (`--parse-only`)
    fn format_parsed(&self, parsed: &Result<ParsedCommand, ParseError>) -> String;
}
