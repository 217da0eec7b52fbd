//! Tool domain module
//!
//! The contract between the dispatcher and the capability modules that do the
//! actual work (files, system control, weather, mail, calendar, ...).
//!
//! ```text
//! ┌────────────────┐   resolve(intent)   ┌──────────────┐   execute()   ┌─────────────────┐
//! │ ParsedCommand  │────────────────────▶│ dyn Tool     │──────────────▶│ ExecutionResult │
//! └────────────────┘                     └──────────────┘               └─────────────────┘
//!                                               │ Err(ToolError)
//!                                               ▼
//!                                      converted to a ToolFault failure
//! ```
//!
//! - [`Tool`] — async trait with [`Tool::descriptor`] and [`Tool::execute`]
//! - [`ToolDescriptor`] — name, description and the set of supported intents
//! - [`ToolError`] — internal fault raised by a tool
//!
//! Tools live in the infrastructure layer; the registry that maps intents to
//! tools is reached through the application layer's `ToolRegistryPort`.

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::ToolDescriptor;
pub use traits::Tool;
pub use value_objects::ToolError;
