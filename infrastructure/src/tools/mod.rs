//! Tool implementations and the registry that routes intents to them
//!
//! | Tool | Intents | Backend |
//! |------|---------|---------|
//! | `assistant` | greeting, get_time, exit_assistant | clock |
//! | `file` | file and folder operations | `tokio::fs`, `glob` |
//! | `system` | processes, volume, power, apps | [`system::SystemControl`] |
//! | `calculator` | calculate, convert_temperature | in-process evaluator |
//! | `unit_conversion` | convert_unit | unit table |
//! | `weather` | weather, forecast, air quality | `reqwest` |
//! | `web` | search, download, check | `reqwest` + `scraper` |
//! | `email` | send, read, search | `.eml` mailbox |
//! | `calendar` | events, reminders, dates | JSON store |
//!
//! # Feature Gate
//!
//! `weather` and `web` need the `web-tools` feature:
//!
//! ```toml
//! # infrastructure/Cargo.toml
//! [features]
//! web-tools = ["dep:reqwest", "dep:scraper"]
//!
//! # cli/Cargo.toml (enabled by default for end users)
//! [features]
//! default = ["web-tools"]
//! web-tools = ["addy-infrastructure/web-tools"]
//! ```

pub mod assistant;
pub mod calculator;
pub mod calendar;
pub mod catalog;
pub mod email;
pub mod file;
pub mod system;
pub mod unit_conversion;
#[cfg(feature = "web-tools")]
pub mod weather;
#[cfg(feature = "web-tools")]
pub mod web;

mod registry;

pub use assistant::AssistantTool;
pub use calculator::CalculatorTool;
pub use calendar::{CalendarTool, CalendarToolConfig};
pub use catalog::{AssemblyError, ToolSettings, assemble_registry, available_tools, build_tool};
pub use email::{EmailTool, EmailToolConfig};
pub use file::{FileTool, FileToolConfig};
pub use registry::{RegistryError, ToolRegistry};
pub use system::{ShellSystemControl, SystemControl, SystemTool, SystemToolConfig};
pub use unit_conversion::UnitConversionTool;
#[cfg(feature = "web-tools")]
pub use weather::{WeatherTool, WeatherToolConfig};
#[cfg(feature = "web-tools")]
pub use web::{WebTool, WebToolConfig};

/// Shared HTTP client settings for the network tools (30s timeout).
#[cfg(feature = "web-tools")]
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent(concat!("addy/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}
