//! Rule-based intent parser.
//!
//! [`IntentParser::parse`] normalizes the text once, then walks the
//! [`PatternLibrary`] in priority order. The first rule whose pattern matches
//! and whose mandatory slots all coerce wins; there is no scoring across rules.

use crate::intent::{Entities, EntityValue, ParsedCommand};
use crate::pattern::{PatternLibrary, Rule};
use std::sync::Arc;
use thiserror::Error;

/// Parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No rule in the library matched the text (or the text was empty).
    #[error("no rule matched: {0:?}")]
    NoMatch(String),
}

/// Canonical form the patterns are written against.
///
/// Trims, lowercases, collapses whitespace runs into one ASCII space, maps
/// full-width ASCII variants (`，？！：（）％`, `０-９`) to ASCII and drops
/// trailing `。`/`!`.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .flat_map(char::to_lowercase)
        .collect();

    let collapsed = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_end_matches(|c| matches!(c, '。' | '!'))
        .trim_end()
        .to_string()
}

/// Deterministic text → [`ParsedCommand`] parser.
#[derive(Debug, Clone)]
pub struct IntentParser {
    library: Arc<PatternLibrary>,
}

impl IntentParser {
    pub fn new(library: Arc<PatternLibrary>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    pub fn parse(&self, text: &str) -> Result<ParsedCommand, ParseError> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(ParseError::NoMatch(text.to_string()));
        }

        self.library
            .all_rules()
            .iter()
            .find_map(|rule| try_rule(rule, &normalized, text))
            .ok_or_else(|| ParseError::NoMatch(text.to_string()))
    }
}

/// Apply one rule. `None` when the pattern does not match or a mandatory slot
/// fails coercion.
fn try_rule(rule: &Rule, normalized: &str, raw_text: &str) -> Option<ParsedCommand> {
    let captures = rule.pattern().captures(normalized)?;
    let mut entities = Entities::new();
    let mut missing = Vec::new();

    for slot in rule.slots() {
        let raw = captures
            .name(&slot.name)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty());

        let Some(raw) = raw else {
            if slot.required {
                missing.push(slot.name.clone());
            }
            continue;
        };

        match slot.kind.coerce(raw) {
            Some(value) => entities.insert(slot.name.clone(), value),
            None if slot.required => return None,
            None => entities.insert(slot.name.clone(), EntityValue::Text(raw.to_string())),
        }
    }

    Some(
        ParsedCommand::new(rule.intent(), raw_text)
            .with_entities(entities)
            .with_confidence(rule.confidence())
            .with_rule(rule.id())
            .with_missing(missing),
    )
}
