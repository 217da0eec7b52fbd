//! Tool registry port
//!
//! Read-only lookup from intent to the tool that handles it. The concrete
//! registry is assembled once at startup in the infrastructure layer and
//! shared behind `Arc` afterwards.

use addy_domain::{Intent, Tool, ToolDescriptor};
use std::sync::Arc;

pub trait ToolRegistryPort: Send + Sync {
    /// Tool registered for `intent`, or `None` when nothing handles it.
    fn resolve(&self, intent: Intent) -> Option<Arc<dyn Tool>>;

    /// Descriptors of every registered tool, in registration order.
    fn descriptors(&self) -> Vec<ToolDescriptor>;

    fn has_tool_for(&self, intent: Intent) -> bool {
        self.resolve(intent).is_some()
    }
}
