//! Presentation-level configuration
//!
//! Configuration for the interactive command loop.

use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Path to history file. `None` keeps history in memory only.
    pub history_file: Option<PathBuf>,
    /// Entries kept in the history file
    pub history_size: usize,
    /// Print the welcome banner
    pub show_banner: bool,
}

impl ReplConfig {
    /// `$XDG_DATA_HOME/addy/history.txt` (or the platform equivalent)
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("addy").join("history.txt"))
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    pub fn with_banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            history_file: Self::default_history_path(),
            history_size: 1000,
            show_banner: true,
        }
    }
}
