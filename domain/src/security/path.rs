//! Path resolution used by the security policy and the file tools.
//!
//! [`normalize_lexically`] and [`is_within`] are pure. [`resolve`] reads the
//! filesystem: it canonicalizes the longest existing ancestor, so its result
//! depends on what is on disk when it runs. This is the one place the domain
//! crate touches I/O.

use std::path::{Component, Path, PathBuf};

/// Remove `.` and resolve `..` without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Absolute, normalized form of `path`.
///
/// Relative paths are joined onto `base`. The longest existing ancestor is
/// canonicalized so that symlinks inside it cannot point around a prefix
/// check; the non-existent tail is appended as-is.
pub fn resolve(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    let normalized = normalize_lexically(&joined);

    let mut existing = normalized.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return out;
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return normalized,
        }
    }
}

/// Component-wise prefix test: `/etc` contains `/etc/passwd` but not
/// `/etcetera`.
pub fn is_within(path: &Path, prefix: &Path) -> bool {
    path.starts_with(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_lexically(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let resolved = resolve(Path::new("notes/../secret.txt"), Path::new("/nonexistent-base"));
        assert_eq!(resolved, PathBuf::from("/nonexistent-base/secret.txt"));
    }

    #[test]
    fn test_resolve_canonicalizes_existing_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let canonical_dir = dir.path().canonicalize().unwrap();
        let resolved = resolve(Path::new("missing/file.txt"), dir.path());
        assert_eq!(resolved, canonical_dir.join("missing").join("file.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("restricted");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("innocent");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let resolved = resolve(Path::new("innocent/key.pem"), dir.path());
        assert!(is_within(&resolved, &target.canonicalize().unwrap()));
    }

    #[test]
    fn test_is_within_is_component_wise() {
        assert!(is_within(Path::new("/etc/passwd"), Path::new("/etc")));
        assert!(is_within(Path::new("/etc"), Path::new("/etc")));
        assert!(!is_within(Path::new("/etcetera/x"), Path::new("/etc")));
    }
}
