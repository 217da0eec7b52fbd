//! Console output formatter for dispatch results

use crate::output::formatter::OutputFormatter;
use addy_domain::{
    ExecutionResult, ExecutionStatus, ParseError, ParsedCommand, PatternLibrary, ToolDescriptor,
};
use colored::Colorize;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the result of one command
    pub fn format(result: &ExecutionResult) -> String {
        // continuation lines line up under the first
        let message = match result.message.split_once('\n') {
            Some((first, rest)) => format!("{}\n{}", first, Self::indent(rest, "  ")),
            None => result.message.clone(),
        };
        let mut output = match result.status {
            ExecutionStatus::Success => format!("{} {}", "✓".green().bold(), message),
            ExecutionStatus::Failure => format!("{} {}", "✗".red().bold(), message),
            ExecutionStatus::NeedsConfirmation => format!("{} {}", "?".yellow().bold(), message),
        };

        if let Some(kind) = result.failure {
            output.push_str(&format!(" {}", format!("[{}]", kind).dimmed()));
        }

        let suggestions = result
            .data
            .as_ref()
            .and_then(|d| d.get("suggestions"))
            .and_then(|s| s.as_array());
        if let Some(suggestions) = suggestions.filter(|s| !s.is_empty()) {
            output.push_str(&format!("\n{}", "您可以试试这些工具:".cyan()));
            for s in suggestions {
                output.push_str(&format!(
                    "\n  - {}: {}",
                    s["tool"].as_str().unwrap_or_default().bold(),
                    s["description"].as_str().unwrap_or_default()
                ));
            }
        }

        output
    }

    /// Format a recognition result
    pub fn format_parsed(parsed: &Result<ParsedCommand, ParseError>) -> String {
        let command = match parsed {
            Ok(command) => command,
            Err(e) => return format!("{} {}", "✗".red().bold(), e),
        };

        let mut output = String::new();
        output.push_str(&format!(
            "{} {} ({})\n",
            "Intent:".cyan().bold(),
            command.intent.as_str().bold(),
            command.intent.label()
        ));
        output.push_str(&format!("{} {}\n", "Rule:".cyan().bold(), command.rule_id));
        output.push_str(&format!(
            "{} {:.2}\n",
            "Confidence:".cyan().bold(),
            command.confidence
        ));

        if command.entities.is_empty() {
            output.push_str(&format!("{} {}\n", "Entities:".cyan().bold(), "(none)".dimmed()));
        } else {
            output.push_str(&format!("{}\n", "Entities:".cyan().bold()));
            for (name, value) in command.entities.iter() {
                output.push_str(&format!("  {} = {}\n", name, value));
            }
        }

        if !command.missing.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                "Missing:".yellow().bold(),
                command.missing.join(", ")
            ));
        }

        output
    }

    /// Format the ordered rule table (`--rules`)
    pub fn format_rules(library: &PatternLibrary) -> String {
        let mut output = Self::header(&format!("Pattern Rules ({})", library.len()));
        output.push('\n');
        for (i, rule) in library.all_rules().iter().enumerate() {
            output.push_str(&format!(
                "{:>3}. {} {} {}\n",
                i + 1,
                format!("[{:>4}]", rule.priority()).dimmed(),
                rule.id().bold(),
                format!("→ {}", rule.intent()).cyan()
            ));
            output.push_str(&format!("       {}\n", rule.pattern().as_str().dimmed()));
            if rule.confidence() < 1.0 {
                output.push_str(&format!("       confidence {:.2}\n", rule.confidence()));
            }
        }
        output
    }

    /// Format the registered tools (`--tools`)
    pub fn format_tools(descriptors: &[ToolDescriptor]) -> String {
        let mut output = Self::header(&format!("Registered Tools ({})", descriptors.len()));
        output.push('\n');
        for descriptor in descriptors {
            output.push_str(&format!(
                "\n{}\n  {}\n",
                descriptor.name.yellow().bold(),
                descriptor.description
            ));
            let intents: Vec<&str> = descriptor
                .supported_intents
                .iter()
                .map(|i| i.as_str())
                .collect();
            output.push_str(&format!("  {}\n", intents.join(", ").dimmed()));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_result(&self, result: &ExecutionResult) -> String {
        Self::format(result)
    }

    fn format_parsed(&self, parsed: &Result<ParsedCommand, ParseError>) -> String {
        Self::format_parsed(parsed)
    }
}
