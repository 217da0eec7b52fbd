//! Terminal confirmation for dangerous commands.
//!
//! Implements [`ConfirmationPort`] by printing the policy's prompt and reading
//! one line from stdin:
//!
//! ```text
//! ⚠  确定要关机吗? [y/N] 是
//! ```
//!
//! | Answer | Meaning |
//! |--------|---------|
//! | `y`, `yes`, `是`, `确认`, `好` | proceed |
//! | `n`, `no`, `否`, `取消`, empty line | decline |
//!
//! Anything else asks again. End of input is [`ConfirmationError::Cancelled`].
//!
//! Stdin is read by one detached thread that forwards lines over a channel,
//! started on the first question. `confirm` only awaits the channel, so when
//! the dispatcher's confirmation timeout fires nothing is left blocking the
//! runtime. Lines typed before a prompt is shown are discarded rather than
//! taken as its answer.

use addy_application::{ConfirmationError, ConfirmationPort};
use addy_domain::ParsedCommand;
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, BufRead, Write};
use tokio::sync::{Mutex, mpsc};

/// Unrecognized answers tolerated before giving up.
const MAX_ATTEMPTS: usize = 3;

/// Interpret one answer line. `None` means "ask again".
pub fn parse_answer(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" | "是" | "确认" | "好" => Some(true),
        "" | "n" | "no" | "否" | "取消" => Some(false),
        _ => None,
    }
}

type Lines = mpsc::UnboundedReceiver<io::Result<String>>;

/// Forward stdin lines until end of input or the receiver is gone.
fn spawn_stdin_reader() -> io::Result<Lines> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("addy-stdin".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Interactive confirmation handler for the terminal.
pub struct InteractiveConfirmation {
    lines: Mutex<Option<Lines>>,
}

impl InteractiveConfirmation {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(None),
        }
    }

    /// Answers come from `lines` instead of stdin.
    pub fn with_lines(lines: mpsc::UnboundedReceiver<io::Result<String>>) -> Self {
        Self {
            lines: Mutex::new(Some(lines)),
        }
    }

    async fn ask(&self, prompt: &str) -> Result<bool, ConfirmationError> {
        let mut guard = self.lines.lock().await;
        if guard.is_none() {
            let lines = spawn_stdin_reader().map_err(|e| {
                ConfirmationError::Io(format!("Failed to start input reader: {}", e))
            })?;
            *guard = Some(lines);
        }
        let Some(lines) = guard.as_mut() else {
            return Err(ConfirmationError::Cancelled);
        };
        while let Ok(stale) = lines.try_recv() {
            tracing::debug!(discarded = stale.is_ok(), "Dropping input typed before the prompt");
        }

        for _ in 0..MAX_ATTEMPTS {
            print!("{} {} {} ", "⚠".yellow().bold(), prompt.bold(), "[y/N]".dimmed());
            io::stdout()
                .flush()
                .map_err(|e| ConfirmationError::Io(format!("Failed to flush stdout: {}", e)))?;

            let line = match lines.recv().await {
                Some(line) => {
                    line.map_err(|e| ConfirmationError::Io(format!("Failed to read input: {}", e)))?
                }
                None => {
                    println!();
                    return Err(ConfirmationError::Cancelled);
                }
            };

            match parse_answer(&line) {
                Some(answer) => return Ok(answer),
                None => println!("{}", "请输入 y (是) 或 n (否)".yellow()),
            }
        }
        Err(ConfirmationError::InvalidInput(format!(
            "no valid answer after {} attempts",
            MAX_ATTEMPTS
        )))
    }
}

impl Default for InteractiveConfirmation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfirmationPort for InteractiveConfirmation {
    async fn confirm(
        &self,
        command: &ParsedCommand,
        prompt: &str,
    ) -> Result<bool, ConfirmationError> {
        tracing::debug!(intent = command.intent.as_str(), "Asking for confirmation");
        self.ask(prompt).await
    }
}
