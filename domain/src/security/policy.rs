//! Security policy for dangerous operations and restricted paths.

use super::path::{is_within, resolve};
use crate::intent::{Entities, Intent};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Outcome of [`SecurityPolicy::classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PolicyDecision {
    Allowed,
    RequiresConfirmation { prompt: String },
    /// A path entity resolves under a restricted prefix.
    Denied { entity: String, path: PathBuf },
}

impl PolicyDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyDecision::Allowed => "allowed",
            PolicyDecision::RequiresConfirmation { .. } => "requires_confirmation",
            PolicyDecision::Denied { .. } => "denied",
        }
    }
}

/// Gate in front of tool invocation.
///
/// Read-only after construction, so one instance can be shared across tasks
/// without locking.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    dangerous: BTreeSet<Intent>,
    require_confirmation: bool,
    restricted: Vec<PathBuf>,
    base_dir: PathBuf,
}

impl SecurityPolicy {
    /// Operations that need confirmation out of the box.
    pub const DEFAULT_DANGEROUS: [Intent; 5] = [
        Intent::DeleteFile,
        Intent::DeleteFolder,
        Intent::KillProcess,
        Intent::ShutdownSystem,
        Intent::RestartSystem,
    ];

    /// Policy with the default dangerous set, confirmation on, and no
    /// restricted paths. Relative path entities resolve against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            dangerous: Self::DEFAULT_DANGEROUS.into_iter().collect(),
            require_confirmation: true,
            restricted: Vec::new(),
            base_dir: base_dir.into(),
        }
    }

    /// Replace the dangerous set.
    pub fn with_dangerous(mut self, intents: impl IntoIterator<Item = Intent>) -> Self {
        self.dangerous = intents.into_iter().collect();
        self
    }

    pub fn with_require_confirmation(mut self, require: bool) -> Self {
        self.require_confirmation = require;
        self
    }

    /// Add a restricted prefix. Relative prefixes resolve against the base
    /// directory.
    pub fn with_restricted_path(mut self, prefix: impl AsRef<Path>) -> Self {
        let resolved = resolve(prefix.as_ref(), &self.base_dir);
        self.restricted.push(resolved);
        self
    }

    pub fn is_dangerous(&self, intent: Intent) -> bool {
        self.dangerous.contains(&intent)
    }

    pub fn requires_confirmation(&self) -> bool {
        self.require_confirmation
    }

    pub fn dangerous_operations(&self) -> impl Iterator<Item = Intent> + '_ {
        self.dangerous.iter().copied()
    }

    pub fn restricted_paths(&self) -> &[PathBuf] {
        &self.restricted
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Restricted prefix that contains `path`, if any.
    pub fn restricted_prefix_for(&self, path: &Path) -> Option<&Path> {
        let resolved = resolve(path, &self.base_dir);
        self.restricted
            .iter()
            .find(|prefix| is_within(&resolved, prefix))
            .map(PathBuf::as_path)
    }

    /// Decide whether a command may run.
    ///
    /// Restricted paths win over everything; a denied command is never offered
    /// for confirmation.
    pub fn classify(&self, intent: Intent, entities: &Entities) -> PolicyDecision {
        for (name, path) in entities.paths() {
            if self.restricted_prefix_for(path).is_some() {
                return PolicyDecision::Denied {
                    entity: name.to_string(),
                    path: resolve(path, &self.base_dir),
                };
            }
        }

        if self.require_confirmation && self.is_dangerous(intent) {
            return PolicyDecision::RequiresConfirmation {
                prompt: confirmation_prompt(intent, entities),
            };
        }

        PolicyDecision::Allowed
    }
}

fn confirmation_prompt(intent: Intent, entities: &Entities) -> String {
    let target = ["path", "process", "source"]
        .iter()
        .find_map(|name| entities.text(name));
    match target {
        Some(target) => format!("确定要{} {} 吗?", intent.label(), target),
        None => format!("确定要{}吗?", intent.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::EntityValue;

    fn path_entities(name: &str, path: &str) -> Entities {
        Entities::new().with(name, EntityValue::Path(PathBuf::from(path)))
    }

    #[test]
    fn test_safe_operation_is_allowed() {
        let policy = SecurityPolicy::new("/home/user");
        assert_eq!(
            policy.classify(Intent::SetVolume, &Entities::new()),
            PolicyDecision::Allowed
        );
    }

    #[test]
    fn test_dangerous_operation_requires_confirmation() {
        let policy = SecurityPolicy::new("/home/user");
        let decision = policy.classify(Intent::ShutdownSystem, &Entities::new());
        assert_eq!(
            decision,
            PolicyDecision::RequiresConfirmation {
                prompt: "确定要关机吗?".into()
            }
        );
    }

    #[test]
    fn test_prompt_names_target() {
        let policy = SecurityPolicy::new("/home/user");
        let decision = policy.classify(Intent::DeleteFile, &path_entities("path", "a.txt"));
        assert_eq!(
            decision,
            PolicyDecision::RequiresConfirmation {
                prompt: "确定要删除文件 a.txt 吗?".into()
            }
        );
    }

    #[test]
    fn test_confirmation_flag_off_allows_dangerous() {
        let policy = SecurityPolicy::new("/home/user").with_require_confirmation(false);
        assert_eq!(
            policy.classify(Intent::KillProcess, &Entities::new()),
            PolicyDecision::Allowed
        );
    }

    #[test]
    fn test_restricted_path_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("private")).unwrap();
        let policy = SecurityPolicy::new(dir.path()).with_restricted_path("private");

        let decision = policy.classify(Intent::DeleteFile, &path_entities("path", "private/secret.txt"));
        match decision {
            PolicyDecision::Denied { entity, path } => {
                assert_eq!(entity, "path");
                assert!(path.ends_with("private/secret.txt"));
            }
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn test_denial_wins_over_confirmation_flag_off() {
        let policy = SecurityPolicy::new("/srv")
            .with_require_confirmation(false)
            .with_restricted_path("/nonexistent-restricted");
        let decision = policy.classify(
            Intent::ReadFile,
            &path_entities("path", "/nonexistent-restricted/a"),
        );
        assert!(matches!(decision, PolicyDecision::Denied { .. }));
    }

    #[test]
    fn test_dot_dot_cannot_escape_into_restricted() {
        let policy = SecurityPolicy::new("/nonexistent-home/user")
            .with_restricted_path("/nonexistent-home/admin");
        let decision = policy.classify(
            Intent::CopyFile,
            &Entities::new()
                .with("source", EntityValue::Path(PathBuf::from("notes.txt")))
                .with(
                    "destination",
                    EntityValue::Path(PathBuf::from("../admin/notes.txt")),
                ),
        );
        assert!(matches!(decision, PolicyDecision::Denied { ref entity, .. } if entity == "destination"));
    }

    #[test]
    fn test_sibling_prefix_not_restricted() {
        let policy = SecurityPolicy::new("/").with_restricted_path("/nonexistent-etc");
        assert!(policy
            .restricted_prefix_for(Path::new("/nonexistent-etcetera/x"))
            .is_none());
    }

    #[test]
    fn test_custom_dangerous_set() {
        let policy = SecurityPolicy::new("/").with_dangerous([Intent::SendEmail]);
        assert!(policy.is_dangerous(Intent::SendEmail));
        assert!(!policy.is_dangerous(Intent::ShutdownSystem));
    }
}
