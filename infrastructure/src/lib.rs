//! Infrastructure layer for addy
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the tool registry and the built-in tools,
//! configuration file loading, and the JSONL command audit log.

pub mod config;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileGeneralConfig, FileNlpConfig,
    FileSecurityConfig, FileToolsConfig,
};
pub use logging::JsonlCommandLogger;
pub use tools::{
    AssemblyError, RegistryError, ToolRegistry, ToolSettings, assemble_registry,
    available_tools, build_tool,
};
