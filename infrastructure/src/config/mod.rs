//! Configuration file loading for addy
//!
//! [`FileConfig`] is the raw TOML shape; [`ConfigLoader`] merges it from
//! defaults, the global and project files, `--config` and the environment.

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileGeneralConfig, FileNlpConfig, FileSecurityConfig,
    FileToolsConfig, ToolsCalendarSection, ToolsEmailSection, ToolsFileSection,
    ToolsSystemSection, ToolsWeatherSection, ToolsWebSection,
};
pub use loader::{ConfigLoader, ConfigSource};
