//! `email` tool — a local mailbox of `.eml` files.
//!
//! ```text
//! <mailbox_dir>/
//!   inbox/    messages delivered by an external fetcher
//!   outbox/   messages written by send_email, picked up by an external sender
//! ```
//!
//! Messages are plain RFC 5322 text: header lines, a blank line, the body.
//! Only `From`, `To`, `Subject` and `Date` are interpreted.

use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::fs;

/// Canonical tool name.
pub const EMAIL: &str = "email";

const INBOX: &str = "inbox";
const OUTBOX: &str = "outbox";

/// Messages read aloud when no count is given.
const DEFAULT_READ_COUNT: usize = 5;

const NO_SUBJECT: &str = "(无主题)";

#[derive(Debug, Clone, PartialEq)]
pub struct EmailToolConfig {
    pub mailbox_dir: PathBuf,
    pub from_address: String,
}

impl Default for EmailToolConfig {
    fn default() -> Self {
        Self {
            mailbox_dir: PathBuf::from("mail"),
            from_address: "addy@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailMessage {
    pub folder: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: Option<String>,
    pub body: String,
}

impl MailMessage {
    /// Parse the subset of RFC 5322 the mailbox uses.
    pub fn parse(folder: &str, raw: &str) -> Self {
        let (head, body) = raw
            .split_once("\r\n\r\n")
            .or_else(|| raw.split_once("\n\n"))
            .unwrap_or((raw, ""));

        // unfold continuation lines
        let mut headers: Vec<(String, String)> = Vec::new();
        for line in head.lines() {
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
            } else if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_lowercase(), value.trim().to_string()));
            }
        }
        let header = |name: &str| {
            headers
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };

        Self {
            folder: folder.to_string(),
            from: header("from").unwrap_or_default(),
            to: header("to").unwrap_or_default(),
            subject: header("subject")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| NO_SUBJECT.to_string()),
            date: header("date"),
            body: body.trim().to_string(),
        }
    }

    fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.subject, &self.from, &self.to, &self.body]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

fn is_plausible_address(addr: &str) -> bool {
    match addr.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !addr.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub struct EmailTool {
    descriptor: ToolDescriptor,
    config: EmailToolConfig,
    /// Disambiguates outbox files written within the same millisecond.
    sequence: AtomicU32,
}

impl EmailTool {
    pub fn new(config: EmailToolConfig) -> Self {
        Self {
            descriptor: ToolDescriptor::new(EMAIL, "邮件: 发送邮件、查看邮件、搜索邮件")
                .with_intents([Intent::SendEmail, Intent::ReadEmails, Intent::SearchEmails]),
            config,
            sequence: AtomicU32::new(0),
        }
    }

    fn folder(&self, name: &str) -> PathBuf {
        self.config.mailbox_dir.join(name)
    }

    async fn load_folder(&self, name: &str) -> Result<Vec<MailMessage>, ToolError> {
        let dir = self.folder(name);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }
        let mut messages = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("eml") {
                continue;
            }
            match fs::read(&path).await {
                Ok(bytes) => messages.push(MailMessage::parse(name, &String::from_utf8_lossy(&bytes))),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable message"),
            }
        }
        // newest first; undated messages last
        messages.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        Ok(messages)
    }

    async fn send(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let Some(to) = entities.text("to") else {
            return Ok(ExecutionResult::missing_parameters(&["to"]));
        };
        let to = to.trim().to_string();
        if !is_plausible_address(&to) {
            return Ok(ExecutionResult::rejected(format!("无效的邮箱地址: {}", to)));
        }
        let subject = entities
            .text("subject")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| NO_SUBJECT.to_string());
        let body = entities.text("body").unwrap_or_default();

        let now = Local::now();
        let raw = format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nDate: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.config.from_address,
            to,
            subject,
            now.to_rfc2822(),
            body
        );

        let outbox = self.folder(OUTBOX);
        fs::create_dir_all(&outbox).await?;
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let path = outbox.join(format!("{}-{}.eml", now.format("%Y%m%d%H%M%S%3f"), seq));
        fs::write(&path, raw).await?;
        tracing::info!(to = %to, path = %path.display(), "Queued email");

        Ok(ExecutionResult::success(format!("邮件已发送给 {}，主题: {}", to, subject))
            .with_data(json!({ "to": to, "subject": subject, "path": path.display().to_string() })))
    }

    async fn read(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let count = entities
            .integer("count")
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_READ_COUNT);
        let messages = self.load_folder(INBOX).await?;
        if messages.is_empty() {
            return Ok(ExecutionResult::success("收件箱中没有邮件").with_data(json!({ "messages": [] })));
        }

        let shown: Vec<&MailMessage> = messages.iter().take(count).collect();
        let mut message = format!("收件箱共有 {} 封邮件，最近 {} 封:", messages.len(), shown.len());
        for (i, m) in shown.iter().enumerate() {
            message.push_str(&format!("\n{}. 来自 {}: {}", i + 1, m.from, m.subject));
        }
        Ok(ExecutionResult::success(message).with_data(json!({ "total": messages.len(), "messages": shown })))
    }

    async fn search(&self, query: &str) -> Result<ExecutionResult, ToolError> {
        let mut found = self.load_folder(INBOX).await?;
        found.extend(self.load_folder(OUTBOX).await?);
        found.retain(|m| m.matches(query));

        if found.is_empty() {
            return Ok(ExecutionResult::success(format!("没有找到包含 '{}' 的邮件", query))
                .with_data(json!({ "query": query, "messages": [] })));
        }
        let mut message = format!("找到 {} 封包含 '{}' 的邮件:", found.len(), query);
        for (i, m) in found.iter().take(DEFAULT_READ_COUNT).enumerate() {
            let party = if m.folder == OUTBOX {
                format!("发给 {}", m.to)
            } else {
                format!("来自 {}", m.from)
            };
            message.push_str(&format!("\n{}. {}: {}", i + 1, party, m.subject));
        }
        Ok(ExecutionResult::success(message).with_data(json!({ "query": query, "messages": found })))
    }

    pub fn mailbox_dir(&self) -> &Path {
        &self.config.mailbox_dir
    }
}

#[async_trait]
impl Tool for EmailTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        match intent {
            Intent::SendEmail => self.send(entities).await,
            Intent::ReadEmails => self.read(entities).await,
            Intent::SearchEmails => match entities.text("query") {
                Some(query) => self.search(query.trim()).await,
                None => Ok(ExecutionResult::missing_parameters(&["query"])),
            },
            other => Ok(ExecutionResult::rejected(format!("不支持的邮件操作: {}", other))),
        }
    }
}
