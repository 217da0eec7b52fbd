//! Assembly of the tool registry from an ordered list of tool names.
//!
//! The enabled list comes from configuration. Assembly fails on the first
//! unknown name, on a tool compiled out by a disabled feature, and on any
//! registration conflict; a half-built registry is never returned.

use std::sync::Arc;

use addy_domain::Tool;
use thiserror::Error;

use super::assistant::{ASSISTANT, AssistantTool};
use super::calculator::{CALCULATOR, CalculatorTool};
use super::calendar::{CALENDAR, CalendarTool, CalendarToolConfig};
use super::email::{EMAIL, EmailTool, EmailToolConfig};
use super::file::{FILE, FileTool, FileToolConfig};
use super::registry::{RegistryError, ToolRegistry};
use super::system::{SYSTEM, SystemTool, SystemToolConfig};
use super::unit_conversion::{UNIT_CONVERSION, UnitConversionTool};
#[cfg(feature = "web-tools")]
use super::weather::{WeatherTool, WeatherToolConfig};
#[cfg(feature = "web-tools")]
use super::web::{WebTool, WebToolConfig};

const WEATHER: &str = "weather";
const WEB: &str = "web";

/// Every built-in tool name, in default registration order.
pub const BUILTIN_TOOLS: [&str; 9] = [
    ASSISTANT,
    FILE,
    SYSTEM,
    CALCULATOR,
    UNIT_CONVERSION,
    WEATHER,
    WEB,
    EMAIL,
    CALENDAR,
];

/// Tool names this build can construct.
pub fn available_tools() -> Vec<&'static str> {
    BUILTIN_TOOLS
        .iter()
        .copied()
        .filter(|name| cfg!(feature = "web-tools") || (*name != WEATHER && *name != WEB))
        .collect()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("unknown tool '{0}' in enabled tool list")]
    UnknownTool(String),

    #[error("tool '{tool}' requires the '{feature}' feature")]
    FeatureDisabled { tool: String, feature: &'static str },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Per-tool constructor configuration.
#[derive(Debug, Clone, Default)]
pub struct ToolSettings {
    pub file: FileToolConfig,
    pub system: SystemToolConfig,
    #[cfg(feature = "web-tools")]
    pub weather: WeatherToolConfig,
    #[cfg(feature = "web-tools")]
    pub web: WebToolConfig,
    pub email: EmailToolConfig,
    pub calendar: CalendarToolConfig,
}

/// Construct one built-in tool by name.
pub fn build_tool(name: &str, settings: &ToolSettings) -> Result<Arc<dyn Tool>, AssemblyError> {
    let tool: Arc<dyn Tool> = match name {
        ASSISTANT => Arc::new(AssistantTool::new()),
        FILE => Arc::new(FileTool::new(settings.file.clone())),
        SYSTEM => Arc::new(SystemTool::new(settings.system.clone())),
        CALCULATOR => Arc::new(CalculatorTool::new()),
        UNIT_CONVERSION => Arc::new(UnitConversionTool::new()),
        #[cfg(feature = "web-tools")]
        WEATHER => Arc::new(WeatherTool::new(settings.weather.clone())),
        #[cfg(feature = "web-tools")]
        WEB => Arc::new(WebTool::new(settings.web.clone())),
        #[cfg(not(feature = "web-tools"))]
        WEATHER | WEB => {
            return Err(AssemblyError::FeatureDisabled {
                tool: name.to_string(),
                feature: "web-tools",
            });
        }
        EMAIL => Arc::new(EmailTool::new(settings.email.clone())),
        CALENDAR => Arc::new(CalendarTool::new(settings.calendar.clone())),
        other => return Err(AssemblyError::UnknownTool(other.to_string())),
    };
    Ok(tool)
}

/// Build a registry holding the enabled tools, in list order.
pub fn assemble_registry<S: AsRef<str>>(
    enabled: &[S],
    settings: &ToolSettings,
) -> Result<ToolRegistry, AssemblyError> {
    let mut registry = ToolRegistry::new();
    for name in enabled {
        let tool = build_tool(name.as_ref().trim(), settings)?;
        registry = registry.register(tool)?;
    }

    let unhandled = registry.unhandled_intents();
    if !unhandled.is_empty() {
        let names: Vec<&str> = unhandled.iter().map(|i| i.as_str()).collect();
        tracing::warn!(
            intents = %names.join(", "),
            "Some intents have no enabled tool and will be reported as unresolved"
        );
    }
    tracing::info!(tools = registry.len(), "Tool registry assembled");
    Ok(registry)
}
