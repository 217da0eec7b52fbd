//! REPL (Read-Eval-Print Loop) for interactive commands

use crate::config::ReplConfig;
use crate::confirmation::parse_answer;
use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use addy_application::DispatchCommandUseCase;
use addy_domain::{ExecutionResult, FailureKind, ParsedCommand, ToolDescriptor};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io;
use std::sync::Arc;
use tracing::warn;

/// Slash commands understood by the loop; everything else is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Rules,
    /// Capability filter; empty lists every tool.
    Tools(String),
    Parse(String),
    Quit,
    Unknown(String),
}

impl ReplCommand {
    /// `None` when the line is an utterance rather than a slash command.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        Some(match name {
            "/help" | "/h" | "/?" => ReplCommand::Help,
            "/rules" => ReplCommand::Rules,
            "/tools" => ReplCommand::Tools(rest.trim().to_string()),
            "/parse" => ReplCommand::Parse(rest.trim().to_string()),
            "/quit" | "/exit" | "/q" => ReplCommand::Quit,
            other => ReplCommand::Unknown(other.to_string()),
        })
    }
}

/// `/tools` listing: everything for an empty filter, else the tools whose
/// name, description or intents mention `capability`.
fn tools_matching(tools: &[ToolDescriptor], capability: &str) -> Vec<ToolDescriptor> {
    if capability.trim().is_empty() {
        return tools.to_vec();
    }
    tools
        .iter()
        .filter(|d| d.matches_capability(capability))
        .cloned()
        .collect()
}

/// Interactive command loop
pub struct CommandRepl {
    use_case: Arc<DispatchCommandUseCase>,
    formatter: Box<dyn OutputFormatter>,
    tools: Vec<ToolDescriptor>,
    config: ReplConfig,
}

impl CommandRepl {
    /// Create a new CommandRepl
    pub fn new(use_case: Arc<DispatchCommandUseCase>) -> Self {
        Self {
            use_case,
            formatter: Box::new(ConsoleFormatter),
            tools: Vec::new(),
            config: ReplConfig::default(),
        }
    }

    pub fn with_formatter(mut self, formatter: Box<dyn OutputFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Descriptors shown by `/tools`
    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.config.history_file else {
            return editor;
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(self.config.history_size, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not open history file");
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("addy".to_string()),
            DefaultPromptSegment::Empty,
        );

        if self.config.show_banner {
            self.print_welcome();
        }

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if let Some(command) = ReplCommand::parse(line) {
                        if self.handle_command(command) {
                            break;
                        }
                        continue;
                    }

                    let result = self.use_case.execute(line).await;
                    let result = self.resolve_deferred(&mut editor, result).await?;
                    println!("{}", self.formatter.format_result(&result));
                    if result.requests_exit() {
                        break;
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("再见！");
                    break;
                }
            }
        }

        Ok(())
    }

    /// A deferred confirmation is answered on the same line editor, then the
    /// command is dispatched with `execute_confirmed`.
    async fn resolve_deferred(
        &self,
        editor: &mut Reedline,
        result: ExecutionResult,
    ) -> io::Result<ExecutionResult> {
        if !result.needs_confirmation_status() {
            return Ok(result);
        }
        let command = result
            .data
            .as_ref()
            .and_then(|d| d.get("command"))
            .and_then(|c| serde_json::from_value::<ParsedCommand>(c.clone()).ok());
        let Some(command) = command else {
            return Ok(result);
        };

        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("{} [y/N]", result.message)),
            DefaultPromptSegment::Empty,
        );
        let accepted = match editor.read_line(&prompt)? {
            Signal::Success(answer) => parse_answer(&answer).unwrap_or(false),
            Signal::CtrlC | Signal::CtrlD => false,
        };

        if accepted {
            Ok(self.use_case.execute_confirmed(command).await)
        } else {
            Ok(ExecutionResult::failure(FailureKind::ConfirmationDeclined, "操作已取消"))
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            addy - 中文语音/文本助手          │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("试试: {}", "设置音量到 50 / 现在几点 / 明天天气怎么样".dimmed());
        println!();
        self.print_help();
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /parse <text>     - Show how a command is recognized");
        println!("  /rules            - List the pattern rules in match order");
        println!("  /tools [keyword]  - List registered tools, optionally by capability");
        println!("  /quit, /exit, /q  - Exit (or say 再见)");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    fn handle_command(&self, command: ReplCommand) -> bool {
        match command {
            ReplCommand::Quit => {
                println!("再见！");
                true
            }
            ReplCommand::Help => {
                println!();
                self.print_help();
                false
            }
            ReplCommand::Rules => {
                println!("{}", ConsoleFormatter::format_rules(self.use_case.parser().library()));
                false
            }
            ReplCommand::Tools(capability) => {
                let listed = tools_matching(&self.tools, &capability);
                if listed.is_empty() {
                    println!("没有与 '{}' 相关的工具", capability);
                } else {
                    println!("{}", ConsoleFormatter::format_tools(&listed));
                }
                false
            }
            ReplCommand::Parse(text) if text.is_empty() => {
                println!("Usage: /parse <text>");
                false
            }
            ReplCommand::Parse(text) => {
                println!("{}", self.formatter.format_parsed(&self.use_case.parse(&text)));
                false
            }
            ReplCommand::Unknown(name) => {
                println!("Unknown command: {}", name);
                println!("Type /help for available commands");
                false
            }
        }
    }
}
