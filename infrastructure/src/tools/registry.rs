//! Tool Registry
//!
//! The [`ToolRegistry`] maps every intent to exactly one tool and implements
//! [`ToolRegistryPort`] for the dispatcher.
//!
//! # Usage
//!
//! ```ignore
//! use addy_infrastructure::tools::{ToolRegistry, AssistantTool, CalculatorTool};
//!
//! let registry = ToolRegistry::new()
//!     .register(Arc::new(AssistantTool::new()))?
//!     .register(Arc::new(CalculatorTool::new()))?;
//!
//! assert!(registry.resolve(Intent::Calculate).is_some());
//! ```
//!
//! # Conflict Policy
//!
//! Registration fails fast instead of overriding:
//!
//! - a second tool with the same name is [`RegistryError::DuplicateTool`]
//! - a second tool claiming an already-mapped intent is
//!   [`RegistryError::ConflictingIntent`]
//!
//! After assembly the registry is shared behind `Arc` and never mutated, so
//! lookups need no lock.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use addy_application::ports::tool_registry::ToolRegistryPort;
use addy_domain::{Intent, Tool, ToolDescriptor};
use thiserror::Error;

/// Configuration error raised while assembling the registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("intent '{}' is claimed by both '{}' and '{}'", .intent, .existing, .incoming)]
    ConflictingIntent {
        intent: Intent,
        existing: String,
        incoming: String,
    },
}

/// Intent → tool lookup table.
pub struct ToolRegistry {
    /// Registered tools, in registration order
    tools: Vec<Arc<dyn Tool>>,
    /// Intent -> index into `tools`
    by_intent: HashMap<Intent, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_intent: HashMap::new(),
        }
    }

    /// Register a tool for every intent it declares.
    pub fn register(mut self, tool: Arc<dyn Tool>) -> Result<Self, RegistryError> {
        let descriptor = tool.descriptor();

        if self.tools.iter().any(|t| t.name() == descriptor.name) {
            return Err(RegistryError::DuplicateTool(descriptor.name.clone()));
        }

        // check every intent before touching the table
        for intent in &descriptor.supported_intents {
            if let Some(&index) = self.by_intent.get(intent) {
                return Err(RegistryError::ConflictingIntent {
                    intent: *intent,
                    existing: self.tools[index].name().to_string(),
                    incoming: descriptor.name.clone(),
                });
            }
        }

        let index = self.tools.len();
        for intent in &descriptor.supported_intents {
            tracing::debug!(
                tool = %descriptor.name,
                intent = intent.as_str(),
                "Registered intent"
            );
            self.by_intent.insert(*intent, index);
        }
        self.tools.push(tool);
        Ok(self)
    }

    /// Register a tool by value.
    pub fn register_tool<T: Tool + 'static>(self, tool: T) -> Result<Self, RegistryError> {
        self.register(Arc::new(tool))
    }

    /// Tool handling `intent`, if any.
    pub fn resolve(&self, intent: Intent) -> Option<Arc<dyn Tool>> {
        self.by_intent
            .get(&intent)
            .map(|&index| Arc::clone(&self.tools[index]))
    }

    /// Tool registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Every intent some tool handles.
    pub fn supported_intents(&self) -> BTreeSet<Intent> {
        self.by_intent.keys().copied().collect()
    }

    /// Intents of the closed enumeration that no registered tool handles.
    pub fn unhandled_intents(&self) -> Vec<Intent> {
        Intent::ALL
            .iter()
            .copied()
            .filter(|intent| !self.by_intent.contains_key(intent))
            .collect()
    }

    /// Tools whose name, description or intents mention `capability`.
    pub fn search(&self, capability: &str) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| t.descriptor())
            .filter(|d| d.matches_capability(capability))
            .cloned()
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistryPort for ToolRegistry {
    fn resolve(&self, intent: Intent) -> Option<Arc<dyn Tool>> {
        ToolRegistry::resolve(self, intent)
    }

    fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor().clone()).collect()
    }
}
