//! Structured result of parsing one utterance.

use super::entity::Entities;
use super::kind::Intent;
use serde::{Deserialize, Serialize};

/// A recognized command.
///
/// Produced once per utterance by the parser and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub intent: Intent,
    pub entities: Entities,
    /// Confidence in `[0, 1]`. Exact anchored rules yield 1.0.
    pub confidence: f32,
    /// Original text, before normalization.
    pub raw_text: String,
    /// Id of the rule that fired.
    pub rule_id: String,
    /// Required slots the rule declared but the text did not supply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl ParsedCommand {
    pub fn new(intent: Intent, raw_text: impl Into<String>) -> Self {
        Self {
            intent,
            entities: Entities::new(),
            confidence: 1.0,
            raw_text: raw_text.into(),
            rule_id: String::new(),
            missing: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Entities) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = rule_id.into();
        self
    }

    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.missing = missing;
        self
    }

    /// All required slots were filled.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::entity::EntityValue;

    #[test]
    fn test_builder_clamps_confidence() {
        let cmd = ParsedCommand::new(Intent::Greeting, "你好").with_confidence(1.7);
        assert_eq!(cmd.confidence, 1.0);
        let cmd = cmd.with_confidence(-0.2);
        assert_eq!(cmd.confidence, 0.0);
    }

    #[test]
    fn test_is_complete() {
        let cmd = ParsedCommand::new(Intent::KillProcess, "结束进程");
        assert!(cmd.is_complete());
        let cmd = cmd.with_missing(vec!["process".into()]);
        assert!(!cmd.is_complete());
    }

    #[test]
    fn test_serialization_omits_empty_missing() {
        let cmd = ParsedCommand::new(Intent::SetVolume, "设置音量到 50")
            .with_entities(Entities::new().with("level", EntityValue::Percentage(50)))
            .with_rule("set_volume.to_level");
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["intent"], "set_volume");
        assert_eq!(json["rule_id"], "set_volume.to_level");
        assert!(json.get("missing").is_none());
    }
}
