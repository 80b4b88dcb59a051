//! Paths the walk never descends into.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Directory names pruned wherever they appear: VCS metadata and vendored
/// dependency trees.
pub const BUILTIN_IGNORES: &[&str] = &[".git", ".hg", ".svn", "node_modules", "bower_components"];

/// Root-relative paths pruned from discovery, on top of [`BUILTIN_IGNORES`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    paths: BTreeSet<PathBuf>,
}

impl IgnoreSet {
    /// An ignore set holding only the built-in names.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a root-relative path. Directories are pruned with everything
    /// below them.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Explicitly added paths.
    #[must_use]
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Returns true when `relative` or one of its ancestors is ignored.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path) -> bool {
        is_builtin(relative) || self.paths.iter().any(|path| relative.starts_with(path))
    }
}

/// Returns true when any component of `relative` is a built-in ignore.
#[must_use]
pub fn is_builtin(relative: &Path) -> bool {
    relative
        .components()
        .any(|component| BUILTIN_IGNORES.iter().any(|name| component.as_os_str() == OsStr::new(name)))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(".git", true)]
    #[case("vendor/node_modules/pkg/index.js", true)]
    #[case("src/.svn", true)]
    #[case("src/git.rs", false)]
    #[case("node_modules_backup/a", false)]
    fn recognises_builtin_components(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_builtin(Path::new(path)), expected);
    }

    #[test]
    fn explicit_paths_prune_descendants_only() {
        let mut ignore = IgnoreSet::new();
        assert!(ignore.insert("build"));
        assert!(!ignore.insert("build"));

        assert!(ignore.is_ignored(Path::new("build")));
        assert!(ignore.is_ignored(Path::new("build/out.txt")));
        assert!(!ignore.is_ignored(Path::new("builder/out.txt")));
    }
}
