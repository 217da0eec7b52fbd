//! A single match rule: pattern, slots and ordering weight.

use crate::intent::{Intent, SlotKind};
use regex::Regex;
use thiserror::Error;

/// Error raised while building a rule.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("rule '{id}': invalid pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{id}': slot '{slot}' is not a named group of the pattern")]
    UnknownSlot { id: String, slot: String },

    #[error("rule '{id}': confidence {confidence} is outside [0, 1]")]
    InvalidConfidence { id: String, confidence: f32 },

    #[error("duplicate rule id '{0}'")]
    DuplicateId(String),
}

/// Declaration of one named capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSpec {
    pub name: String,
    pub kind: SlotKind,
    pub required: bool,
}

/// A text pattern that maps onto one intent.
#[derive(Debug, Clone)]
pub struct Rule {
    id: String,
    intent: Intent,
    pattern: Regex,
    priority: i32,
    confidence: f32,
    slots: Vec<SlotSpec>,
}

impl Rule {
    pub fn builder(id: impl Into<String>, intent: Intent, pattern: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            id: id.into(),
            intent,
            pattern: pattern.into(),
            priority: 0,
            confidence: 1.0,
            slots: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Global ordering weight; higher is tried first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Confidence reported when this rule fires.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }
}

/// Builder for [`Rule`]; validation happens in [`RuleBuilder::build`].
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    id: String,
    intent: Intent,
    pattern: String,
    priority: i32,
    confidence: f32,
    slots: Vec<SlotSpec>,
}

impl RuleBuilder {
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Declare a required slot.
    pub fn slot(mut self, name: impl Into<String>, kind: SlotKind) -> Self {
        self.slots.push(SlotSpec {
            name: name.into(),
            kind,
            required: true,
        });
        self
    }

    pub fn optional_slot(mut self, name: impl Into<String>, kind: SlotKind) -> Self {
        self.slots.push(SlotSpec {
            name: name.into(),
            kind,
            required: false,
        });
        self
    }

    pub fn build(self) -> Result<Rule, PatternError> {
        let pattern = Regex::new(&self.pattern).map_err(|source| PatternError::InvalidPattern {
            id: self.id.clone(),
            source,
        })?;

        for slot in &self.slots {
            if !pattern.capture_names().flatten().any(|n| n == slot.name) {
                return Err(PatternError::UnknownSlot {
                    id: self.id,
                    slot: slot.name.clone(),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(PatternError::InvalidConfidence {
                id: self.id,
                confidence: self.confidence,
            });
        }

        Ok(Rule {
            id: self.id,
            intent: self.intent,
            pattern,
            priority: self.priority,
            confidence: self.confidence,
            slots: self.slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_valid_rule() {
        let rule = Rule::builder("volume", Intent::SetVolume, r"^音量(?P<level>\d+)$")
            .priority(80)
            .slot("level", SlotKind::Percentage)
            .build()
            .unwrap();
        assert_eq!(rule.id(), "volume");
        assert_eq!(rule.intent(), Intent::SetVolume);
        assert_eq!(rule.priority(), 80);
        assert_eq!(rule.confidence(), 1.0);
        assert!(rule.slots()[0].required);
    }

    #[test]
    fn test_build_rejects_invalid_regex() {
        let err = Rule::builder("bad", Intent::Greeting, r"^(unclosed")
            .build()
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidPattern { .. }));
    }

    #[test]
    fn test_build_rejects_undeclared_group() {
        let err = Rule::builder("bad", Intent::DeleteFile, r"^删除(?P<path>\S+)$")
            .slot("target", SlotKind::Path)
            .build()
            .unwrap_err();
        assert!(matches!(err, PatternError::UnknownSlot { ref slot, .. } if slot == "target"));
    }

    #[test]
    fn test_build_rejects_confidence_out_of_range() {
        let err = Rule::builder("bad", Intent::Greeting, r"^hi$")
            .confidence(1.5)
            .build()
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidConfidence { .. }));
    }
}
