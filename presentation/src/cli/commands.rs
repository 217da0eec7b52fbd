//! CLI command definitions

use addy_application::ConfirmationMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable message
    Text,
    /// The ExecutionResult as JSON
    Json,
}

/// CLI arguments for addy
#[derive(Parser, Debug)]
#[command(name = "addy")]
#[command(author, version, about = "Chinese voice/text assistant - intent recognition and tool dispatch")]
#[command(long_about = r#"
addy turns a short Chinese command into an action: it recognizes the intent
with an ordered table of patterns, checks it against the security policy,
and hands it to the tool that implements it.

Run with a command to dispatch it once, or without one for an interactive loop.

Configuration files are loaded from (in priority order):
1. ADDY_* environment variables (e.g. ADDY_NLP__CONFIDENCE_FLOOR=0.6)
2. --config <path>     Explicit config file
3. ./addy.toml         Project-level config
4. ~/.config/addy/config.toml   Global config

Example:
  addy "设置音量到 50"
  addy --parse-only "明天下午3点提醒我开会"
  addy -o json "计算 3 + 5 * 2"
  addy --no "删除文件 old.log"
"#)]
pub struct Cli {
    /// The command to dispatch (words are joined with spaces)
    pub command: Vec<String>,

    /// Start the interactive command loop (default when no command is given)
    #[arg(long)]
    pub repl: bool,

    /// Show the recognized intent and entities without dispatching
    #[arg(long)]
    pub parse_only: bool,

    /// Print the ordered pattern rule table and exit
    #[arg(long)]
    pub rules: bool,

    /// Print the registered tools and exit; with a capability, only the
    /// tools whose name, description or intents mention it
    #[arg(long, value_name = "CAPABILITY", num_args = 0..=1, default_missing_value = "")]
    pub tools: Option<String>,

    /// Approve every confirmation prompt automatically
    #[arg(short = 'y', long, conflicts_with = "no")]
    pub yes: bool,

    /// Decline every confirmation prompt automatically
    #[arg(short = 'n', long)]
    pub no: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the banner and hints
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// The command words as one utterance, if any were given.
    pub fn utterance(&self) -> Option<String> {
        let text = self.command.join(" ");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    pub fn is_interactive(&self) -> bool {
        self.repl || self.utterance().is_none()
    }

    /// `--tools` capability filter; `None` lists every tool.
    pub fn tool_query(&self) -> Option<&str> {
        self.tools.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Confirmation mode for this run. `--yes` / `--no` override the
    /// configured mode; the interactive loop answers prompts on its own line
    /// editor, so it defers instead of reading stdin behind it.
    pub fn confirmation_mode(&self, configured: ConfirmationMode) -> ConfirmationMode {
        if self.yes {
            ConfirmationMode::AutoApprove
        } else if self.no {
            ConfirmationMode::AutoDecline
        } else if self.is_interactive() && configured == ConfirmationMode::Interactive {
            ConfirmationMode::Defer
        } else {
            configured
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_command() {
        let cli = Cli::parse_from(["addy", "设置音量到", "50"]);
        assert_eq!(cli.utterance().as_deref(), Some("设置音量到 50"));
        assert!(!cli.is_interactive());
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_no_command_is_interactive() {
        let cli = Cli::parse_from(["addy", "-vv"]);
        assert!(cli.utterance().is_none());
        assert!(cli.is_interactive());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["addy", "--no", "-o", "json", "--parse-only", "关机"]);
        assert!(cli.no);
        assert!(!cli.yes);
        assert!(cli.parse_only);
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_tools_capability_filter() {
        let cli = Cli::parse_from(["addy", "--tools"]);
        assert_eq!(cli.tools.as_deref(), Some(""));
        assert_eq!(cli.tool_query(), None);

        let cli = Cli::parse_from(["addy", "--tools", "音量"]);
        assert_eq!(cli.tool_query(), Some("音量"));

        assert!(Cli::parse_from(["addy"]).tools.is_none());
    }

    #[test]
    fn test_confirmation_mode() {
        let once = Cli::parse_from(["addy", "关机"]);
        assert_eq!(
            once.confirmation_mode(ConfirmationMode::Interactive),
            ConfirmationMode::Interactive
        );

        let repl = Cli::parse_from(["addy"]);
        assert_eq!(
            repl.confirmation_mode(ConfirmationMode::Interactive),
            ConfirmationMode::Defer
        );
        assert_eq!(
            repl.confirmation_mode(ConfirmationMode::AutoDecline),
            ConfirmationMode::AutoDecline
        );

        let yes = Cli::parse_from(["addy", "-y", "--repl"]);
        assert_eq!(
            yes.confirmation_mode(ConfirmationMode::Interactive),
            ConfirmationMode::AutoApprove
        );
    }

    #[test]
    fn test_yes_and_no_conflict() {
        assert!(Cli::try_parse_from(["addy", "--yes", "--no", "关机"]).is_err());
    }
}
