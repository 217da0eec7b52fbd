//! General configuration from TOML (`[general]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw general configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeneralConfig {
    /// Diagnostic log file (daily rotation). Unset logs to stderr only.
    pub log_file: Option<PathBuf>,
    /// JSONL command audit log. Unset disables auditing.
    pub audit_log: Option<PathBuf>,
    /// REPL history file. Unset uses the per-user data directory.
    pub history_file: Option<PathBuf>,
}
