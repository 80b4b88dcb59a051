//! Diff capture and the run-wide audit log.
//!
//! Replace rules are diffed file by file, working copy against results copy,
//! before the results are promoted. The run as a whole is diffed once, root
//! against the final working copy. Diff text comes from the stager with
//! staging prefixes already stripped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use retree_stage::{StageError, Stager};
use serde::Serialize;

/// Diffs of every rewritten file, accumulated across rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: BTreeMap<String, Vec<String>>,
}

impl AuditLog {
    /// Appends `diff` to the history of `path`.
    pub fn record(&mut self, path: impl Into<String>, diff: impl Into<String>) {
        self.entries.entry(path.into()).or_default().push(diff.into());
    }

    /// Diffs recorded for `path`, oldest first.
    #[must_use]
    pub fn history(&self, path: &str) -> &[String] {
        self.entries
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterates over files and their histories in path order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(path, diffs)| (path.as_str(), diffs.as_slice()))
    }

    /// Number of files with at least one diff.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Diffs each file between the working and results copies.
///
/// Files whose content did not change are left out.
pub(crate) fn rule_diffs(
    stager: &Stager,
    files: &[PathBuf],
) -> Result<BTreeMap<String, String>, StageError> {
    let (Some(working), Some(results)) = (stager.working(), stager.results()) else {
        return Err(StageError::NoWorkingCopy);
    };
    let mut diffs = BTreeMap::new();
    for file in files {
        let diff = stager.diff(&working.join(file), &results.join(file))?;
        if !diff.is_empty() {
            diffs.insert(display_key(file), diff);
        }
    }
    Ok(diffs)
}

/// Diffs the original root against the final working copy.
pub(crate) fn full_diff(stager: &Stager) -> Result<String, StageError> {
    let working = stager.working().ok_or(StageError::NoWorkingCopy)?;
    stager.diff(stager.root(), working)
}

pub(crate) fn display_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
