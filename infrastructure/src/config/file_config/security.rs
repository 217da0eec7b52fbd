//! Security configuration from TOML (`[security]` section)

use addy_application::ConfirmationMode;
use addy_domain::{Intent, SecurityPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Raw security configuration from TOML
///
/// # Example
///
/// ```toml
/// [security]
/// require_confirmation = true
/// dangerous_operations = ["delete_file", "delete_folder", "shutdown_system"]
/// restricted_paths = ["/etc", "secrets"]
/// confirmation_mode = "interactive"
/// confirmation_timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSecurityConfig {
    pub require_confirmation: bool,
    /// Intents that need confirmation (by snake_case name)
    pub dangerous_operations: Vec<Intent>,
    /// Path prefixes no command may touch. Relative entries resolve against
    /// the file tool's base directory.
    pub restricted_paths: Vec<PathBuf>,
    pub confirmation_mode: ConfirmationMode,
    pub confirmation_timeout_secs: u64,
}

impl Default for FileSecurityConfig {
    fn default() -> Self {
        Self {
            require_confirmation: true,
            dangerous_operations: SecurityPolicy::DEFAULT_DANGEROUS.to_vec(),
            restricted_paths: Vec::new(),
            confirmation_mode: ConfirmationMode::Interactive,
            confirmation_timeout_secs: 30,
        }
    }
}

impl FileSecurityConfig {
    /// Build the runtime policy. `base_dir` anchors relative paths.
    pub fn to_policy(&self, base_dir: &Path) -> SecurityPolicy {
        self.restricted_paths.iter().fold(
            SecurityPolicy::new(base_dir)
                .with_dangerous(self.dangerous_operations.iter().copied())
                .with_require_confirmation(self.require_confirmation),
            |policy, prefix| policy.with_restricted_path(prefix),
        )
    }
}
