//! Exclude entries resolved against the staging area.

use std::path::{Path, PathBuf};

use retree_stage::Stager;
use serde_json::{Map, Value};

use crate::rule::ExcludeEntry;

/// An exclude entry together with the absolute path it named when it was
/// declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    entry: ExcludeEntry,
    path: PathBuf,
}

impl Exclusion {
    pub(crate) fn resolve(entry: ExcludeEntry, stager: &Stager) -> Self {
        let path = stager.resolve_path(Path::new(entry.name()));
        Self { entry, path }
    }

    /// The entry as supplied.
    #[must_use]
    pub const fn entry(&self) -> &ExcludeEntry {
        &self.entry
    }

    /// Absolute path of the excluded file or directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Line the exclusion is scoped to, if any.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        self.entry.line()
    }

    /// Root-relative path, or `None` when the entry points outside the run's
    /// trees.
    pub(crate) fn relative(&self, stager: &Stager) -> Option<PathBuf> {
        stager.relative_path(&self.path)
    }

    /// The entry as JSON, for warnings.
    #[must_use]
    pub fn subject(&self) -> Value {
        match &self.entry {
            ExcludeEntry::Path(name) => Value::String(name.clone()),
            ExcludeEntry::Scoped { name, line } => {
                let mut object = Map::new();
                object.insert(String::from("name"), Value::String(name.clone()));
                if let Some(number) = line {
                    object.insert(String::from("line"), Value::from(*number));
                }
                Value::Object(object)
            }
        }
    }

    fn same_target(&self, other: &Self) -> bool {
        self.path == other.path && self.line() == other.line()
    }
}

/// Adds `exclusion` unless an entry with the same path and line is present.
pub(crate) fn merge(set: &mut Vec<Exclusion>, exclusion: Exclusion) -> bool {
    if set.iter().any(|existing| existing.same_target(&exclusion)) {
        false
    } else {
        set.push(exclusion);
        true
    }
}
