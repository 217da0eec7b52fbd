//! Ordered rule catalogue.

use super::rule::{PatternError, Rule};
use crate::intent::Intent;

/// Append-only catalogue of [`Rule`]s.
///
/// Rules are kept in global priority order (highest first). Rules with equal
/// priority keep their insertion order, so the table is a pure function of
/// the sequence of [`add`](Self::add) calls.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    rules: Vec<Rule>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Chinese command catalogue.
    pub fn builtin() -> Result<Self, PatternError> {
        let mut library = Self::new();
        for rule in super::builtin::builtin_rules()? {
            library.add(rule)?;
        }
        Ok(library)
    }

    /// Append a rule. Rule ids must be unique.
    pub fn add(&mut self, rule: Rule) -> Result<(), PatternError> {
        if self.get(rule.id()).is_some() {
            return Err(PatternError::DuplicateId(rule.id().to_string()));
        }
        let at = self
            .rules
            .partition_point(|existing| existing.priority() >= rule.priority());
        self.rules.insert(at, rule);
        Ok(())
    }

    /// Builder-style [`add`](Self::add).
    pub fn with_rule(mut self, rule: Rule) -> Result<Self, PatternError> {
        self.add(rule)?;
        Ok(self)
    }

    /// Every rule, in the order the parser tries them.
    pub fn all_rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules for one intent, in the order the parser tries them.
    pub fn rules_for(&self, intent: Intent) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.intent() == intent)
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::SlotKind;

    fn rule(id: &str, intent: Intent, priority: i32) -> Rule {
        Rule::builder(id, intent, format!("^{}$", id))
            .priority(priority)
            .build()
            .unwrap()
    }

    #[test]
    fn test_rules_sorted_by_priority_then_insertion() {
        let mut library = PatternLibrary::new();
        library.add(rule("a", Intent::Greeting, 0)).unwrap();
        library.add(rule("b", Intent::GetTime, 10)).unwrap();
        library.add(rule("c", Intent::Greeting, 0)).unwrap();
        library.add(rule("d", Intent::ExitAssistant, 10)).unwrap();

        let ids: Vec<_> = library.all_rules().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_rules_for_filters_by_intent() {
        let library = PatternLibrary::new()
            .with_rule(rule("a", Intent::Greeting, 0))
            .unwrap()
            .with_rule(rule("b", Intent::GetTime, 5))
            .unwrap()
            .with_rule(rule("c", Intent::Greeting, 9))
            .unwrap();

        let ids: Vec<_> = library.rules_for(Intent::Greeting).map(|r| r.id()).collect();
        assert_eq!(ids, vec!["c", "a"]);
        assert_eq!(library.rules_for(Intent::SetVolume).count(), 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut library = PatternLibrary::new();
        library.add(rule("a", Intent::Greeting, 0)).unwrap();
        let err = library.add(rule("a", Intent::GetTime, 3)).unwrap_err();
        assert!(matches!(err, PatternError::DuplicateId(ref id) if id == "a"));
        assert_eq!(library.len(), 1);
    }

    #[test]
    fn test_builtin_catalogue_builds() {
        let library = PatternLibrary::builtin().unwrap();
        assert!(!library.is_empty());
    }

    #[test]
    fn test_builtin_covers_every_intent() {
        let library = PatternLibrary::builtin().unwrap();
        for intent in Intent::ALL {
            assert!(
                library.rules_for(intent).next().is_some(),
                "no rule for {}",
                intent
            );
        }
    }

    #[test]
    fn test_specific_volume_rule_outranks_generic_setting_rule() {
        let library = PatternLibrary::builtin().unwrap();
        let position = |pred: &dyn Fn(&Rule) -> bool| {
            library.all_rules().iter().position(|r| pred(r)).unwrap()
        };
        let volume = position(&|r| r.intent() == Intent::SetVolume);
        let generic = position(&|r| r.pattern().as_str().starts_with("^(?:设置|设定)\\s*"));
        assert!(volume < generic);
        assert!(library.all_rules()[volume]
            .slots()
            .iter()
            .any(|s| s.kind == SlotKind::Percentage));
    }
}
