//! JSON output (`--output json`)

use crate::output::formatter::OutputFormatter;
use addy_domain::{ExecutionResult, ParseError, ParsedCommand};
use serde_json::json;

/// Prints results verbatim as pretty JSON
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_result(&self, result: &ExecutionResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_parsed(&self, parsed: &Result<ParsedCommand, ParseError>) -> String {
        let value = match parsed {
            Ok(command) => serde_json::to_value(command).unwrap_or_default(),
            Err(e) => json!({ "error": "no_match", "message": e.to_string() }),
        };
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }
}
