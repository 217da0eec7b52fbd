//! Tools configuration from TOML (`[tools]` section)
//!
//! Selects which tools are registered, in which order, and carries each
//! tool's constructor settings.
//!
//! Example configuration:
//!
//! ```toml
//! [tools]
//! enabled = ["assistant", "file", "calculator", "calendar"]
//! timeout_secs = 20
//!
//! [tools.file]
//! base_dir = "~/Documents"
//! max_read_bytes = 65536
//!
//! [tools.system]
//! allow_power_actions = false
//!
//! [tools.weather]
//! default_location = "北京"
//!
//! [tools.email]
//! mailbox_dir = "~/.local/share/addy/mail"
//! from_address = "me@example.com"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::tools::catalog::available_tools;
use crate::tools::{
    CalendarToolConfig, EmailToolConfig, FileToolConfig, SystemToolConfig, ToolSettings,
};

/// `[tools.file]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsFileSection {
    /// Directory relative paths resolve against (default: working directory)
    pub base_dir: Option<PathBuf>,
    pub max_read_bytes: Option<u64>,
}

/// `[tools.system]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsSystemSection {
    /// Really shut down / restart instead of simulating
    pub allow_power_actions: bool,
}

/// `[tools.weather]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsWeatherSection {
    pub api_base: Option<String>,
    pub default_location: Option<String>,
}

/// `[tools.web]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsWebSection {
    pub search_url: Option<String>,
    pub download_dir: Option<PathBuf>,
}

/// `[tools.email]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsEmailSection {
    pub mailbox_dir: Option<PathBuf>,
    pub from_address: Option<String>,
}

/// `[tools.calendar]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsCalendarSection {
    pub data_file: Option<PathBuf>,
}

/// Complete tools configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Tool names to register, in registration order.
    ///
    /// Default: every tool this build provides.
    pub enabled: Vec<String>,
    /// Upper bound for a single tool invocation
    pub timeout_secs: Option<u64>,
    pub file: ToolsFileSection,
    pub system: ToolsSystemSection,
    pub weather: ToolsWeatherSection,
    pub web: ToolsWebSection,
    pub email: ToolsEmailSection,
    pub calendar: ToolsCalendarSection,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            enabled: available_tools().into_iter().map(String::from).collect(),
            timeout_secs: None,
            file: ToolsFileSection::default(),
            system: ToolsSystemSection::default(),
            weather: ToolsWeatherSection::default(),
            web: ToolsWebSection::default(),
            email: ToolsEmailSection::default(),
            calendar: ToolsCalendarSection::default(),
        }
    }
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

impl FileToolsConfig {
    /// Directory relative file paths resolve against.
    pub fn base_dir(&self) -> PathBuf {
        self.file
            .base_dir
            .as_deref()
            .map(expand_home)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Per-tool constructor settings. `data_dir` holds the mailbox and the
    /// calendar file unless they are configured explicitly.
    pub fn to_settings(&self, data_dir: &Path) -> ToolSettings {
        let base_dir = self.base_dir();
        let file_defaults = FileToolConfig::default();

        ToolSettings {
            file: FileToolConfig {
                base_dir: base_dir.clone(),
                max_read_bytes: self.file.max_read_bytes.unwrap_or(file_defaults.max_read_bytes),
                restricted_paths: file_defaults.restricted_paths,
            },
            system: SystemToolConfig {
                allow_power_actions: self.system.allow_power_actions,
            },
            #[cfg(feature = "web-tools")]
            weather: {
                let defaults = crate::tools::WeatherToolConfig::default();
                crate::tools::WeatherToolConfig {
                    api_base: self.weather.api_base.clone().unwrap_or(defaults.api_base),
                    air_quality_api: defaults.air_quality_api,
                    default_location: self.weather.default_location.clone(),
                }
            },
            #[cfg(feature = "web-tools")]
            web: {
                let defaults = crate::tools::WebToolConfig::default();
                crate::tools::WebToolConfig {
                    search_url: self.web.search_url.clone().unwrap_or(defaults.search_url),
                    download_dir: self
                        .web
                        .download_dir
                        .as_deref()
                        .map(expand_home)
                        .or_else(dirs::download_dir)
                        .unwrap_or_else(|| base_dir.clone()),
                    base_dir: base_dir.clone(),
                }
            },
            email: EmailToolConfig {
                mailbox_dir: self
                    .email
                    .mailbox_dir
                    .as_deref()
                    .map(expand_home)
                    .unwrap_or_else(|| data_dir.join("mail")),
                from_address: self
                    .email
                    .from_address
                    .clone()
                    .unwrap_or_else(|| EmailToolConfig::default().from_address),
            },
            calendar: CalendarToolConfig {
                data_file: self
                    .calendar
                    .data_file
                    .as_deref()
                    .map(expand_home)
                    .unwrap_or_else(|| data_dir.join("calendar.json")),
            },
        }
    }
}
