//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod general;
mod nlp;
mod security;
mod tools;

pub use general::FileGeneralConfig;
pub use nlp::FileNlpConfig;
pub use security::FileSecurityConfig;
pub use tools::{
    FileToolsConfig, ToolsCalendarSection, ToolsEmailSection, ToolsFileSection,
    ToolsSystemSection, ToolsWeatherSection, ToolsWebSection,
};

use addy_application::DispatchConfig;
use addy_domain::SecurityPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::tools::ToolSettings;

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("security.confirmation_timeout_secs cannot be 0")]
    InvalidConfirmationTimeout,

    #[error("tools.timeout_secs cannot be 0")]
    InvalidToolTimeout,

    #[error("nlp.confidence_floor must be between 0.0 and 1.0 (got {0})")]
    InvalidConfidenceFloor(f32),

    #[error("tools.enabled cannot be empty")]
    NoToolsEnabled,

    #[error("tool name cannot be empty")]
    EmptyToolName,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Logging destinations
    pub general: FileGeneralConfig,
    /// Intent recognition settings
    pub nlp: FileNlpConfig,
    /// Dangerous operations and restricted paths
    pub security: FileSecurityConfig,
    /// Enabled tools and their settings
    pub tools: FileToolsConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.security.confirmation_timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidConfirmationTimeout);
        }

        if let Some(0) = self.tools.timeout_secs {
            return Err(ConfigValidationError::InvalidToolTimeout);
        }

        let floor = self.nlp.confidence_floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(ConfigValidationError::InvalidConfidenceFloor(floor));
        }

        if self.tools.enabled.is_empty() {
            return Err(ConfigValidationError::NoToolsEnabled);
        }
        if self.tools.enabled.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyToolName);
        }

        Ok(())
    }

    /// Orchestrator settings.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig::default()
            .with_confidence_floor(self.nlp.confidence_floor)
            .with_confirmation_mode(self.security.confirmation_mode)
            .with_confirmation_timeout(Duration::from_secs(self.security.confirmation_timeout_secs))
            .with_tool_timeout(self.tools.timeout_secs.map(Duration::from_secs))
    }

    /// Security policy anchored at the file tool's base directory.
    pub fn policy(&self) -> SecurityPolicy {
        self.security.to_policy(&self.tools.base_dir())
    }

    /// Constructor settings for every tool. The file tool gets the policy's
    /// restricted prefixes so searches do not list what the policy denies.
    pub fn tool_settings(&self) -> ToolSettings {
        let mut settings = self.tools.to_settings(&Self::data_dir());
        settings.file.restricted_paths = self.policy().restricted_paths().to_vec();
        settings
    }

    /// Per-user data directory (mailbox, calendar, history).
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("addy"))
            .unwrap_or_else(|| PathBuf::from(".addy"))
    }

    /// Audit log path with `~` expanded.
    pub fn audit_log_path(&self) -> Option<PathBuf> {
        self.general.audit_log.as_deref().map(tools::expand_home)
    }

    /// Diagnostic log path with `~` expanded.
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.general.log_file.as_deref().map(tools::expand_home)
    }

    /// REPL history path with `~` expanded.
    pub fn history_file_path(&self) -> Option<PathBuf> {
        self.general.history_file.as_deref().map(tools::expand_home)
    }

    /// True when `path` lies under a configured restricted prefix.
    pub fn is_restricted(&self, path: &Path) -> bool {
        self.policy().restricted_prefix_for(path).is_some()
    }
}
