//! Tool descriptor.

use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Static description of a tool: its name, what it does, which intents it
/// handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique name (e.g., "file", "system")
    pub name: String,
    pub description: String,
    pub supported_intents: BTreeSet<Intent>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            supported_intents: BTreeSet::new(),
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.supported_intents.insert(intent);
        self
    }

    pub fn with_intents(mut self, intents: impl IntoIterator<Item = Intent>) -> Self {
        self.supported_intents.extend(intents);
        self
    }

    pub fn supports(&self, intent: Intent) -> bool {
        self.supported_intents.contains(&intent)
    }

    /// Case-insensitive match of `capability` against name, description and
    /// intent names/labels.
    pub fn matches_capability(&self, capability: &str) -> bool {
        let needle = capability.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .supported_intents
                .iter()
                .any(|i| i.as_str().contains(&needle) || i.label().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = ToolDescriptor::new("file", "文件操作")
            .with_intent(Intent::CreateFile)
            .with_intents([Intent::DeleteFile, Intent::CreateFile]);
        assert_eq!(desc.supported_intents.len(), 2);
        assert!(desc.supports(Intent::DeleteFile));
        assert!(!desc.supports(Intent::SetVolume));
    }

    #[test]
    fn test_matches_capability() {
        let desc = ToolDescriptor::new("system", "System control")
            .with_intents([Intent::SetVolume, Intent::ShutdownSystem]);
        assert!(desc.matches_capability("SYSTEM"));
        assert!(desc.matches_capability("control"));
        assert!(desc.matches_capability("volume"));
        assert!(desc.matches_capability("音量"));
        assert!(!desc.matches_capability("weather"));
        assert!(!desc.matches_capability("  "));
    }
}
