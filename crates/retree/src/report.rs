//! What a run reports back: warnings, per-rule results, name changes, diffs
//! and the commands needed to replay it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value;

use crate::audit::AuditLog;

/// Whether a run promotes its working copy or throws it away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Stage, apply and commit.
    #[default]
    Transform,
    /// Stage, apply and discard.
    Dry,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transform => "transform",
            Self::Dry => "dry",
        })
    }
}

/// Warning texts. They are part of the report contract, so callers may match
/// on them.
pub mod messages {
    /// A copy or rename lacks a string `source` or `dest`.
    pub const MISSING_SOURCE_OR_DEST: &str = "Missing source or destination.";
    /// A copy or rename path resolves outside the working copy.
    pub const OUTSIDE_TREE: &str = "Path must stay inside the tree.";
    /// A copy or rename source is absent from the working copy.
    pub const SOURCE_MISSING: &str = "Source file does not exist.";
    /// A copy or rename replaces an existing destination.
    pub const OVERWRITING_DEST: &str = "Overwriting destination file.";
    /// A replace rule lacks a string `search` or `replace`.
    pub const MISSING_SEARCH_OR_REPLACE: &str = "Missing search or replace.";
    /// A replace rule's search text is empty.
    pub const EMPTY_SEARCH: &str = "Search must not be empty.";
    /// A replace rule's `exclude` is not a list.
    pub const EXCLUDE_NOT_LIST: &str = "Exclude must be a list.";
    /// An exclude entry matches neither schema form.
    pub const INVALID_EXCLUDE: &str = "Invalid exclude entry.";
    /// An exclude rule lacks a `files` list.
    pub const MISSING_FILES: &str = "Missing files.";
    /// No text file contains the search text.
    pub const NO_RESULTS: &str = "Search did not return any results.";
    /// An exclude entry matched none of the candidates.
    pub const UNUSED_EXCLUDE: &str = "Unused exclude.";
    /// Exclusion removed every candidate.
    pub const ALL_EXCLUDED: &str = "All results were excluded.";
}

/// A non-fatal condition raised while applying a rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Index of the rule that raised it.
    pub rule_index: usize,
    /// The rule, or the exclude entry, the warning is about.
    pub subject: Value,
    /// Human-readable message, one of [`messages`].
    pub message: String,
}

/// A path created by a copy or rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameChange {
    /// Root-relative source.
    pub from: PathBuf,
    /// Root-relative destination.
    pub to: PathBuf,
}

/// Everything one rule produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    /// The rule as supplied.
    pub rule: Value,
    /// Warnings raised by the rule.
    pub warnings: Vec<Warning>,
    /// Paths the rule created.
    pub name_changes: Vec<NameChange>,
    /// Unified diff of each file the rule rewrote, keyed by root-relative
    /// path.
    pub diffs: BTreeMap<String, String>,
}

impl RuleResult {
    pub(crate) const fn new(rule: Value) -> Self {
        Self {
            rule,
            warnings: Vec::new(),
            name_changes: Vec::new(),
            diffs: BTreeMap::new(),
        }
    }
}

/// A file operation as it would run against the real root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedCommand {
    /// Index of the originating rule.
    pub rule_index: usize,
    /// The originating rule.
    pub rule: Value,
    /// Program the command invokes.
    pub program: String,
    /// Shell-quoted command line.
    pub command: String,
}

/// The outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Whether the run committed or discarded.
    pub mode: Mode,
    /// Every warning, in the order raised.
    pub warnings: Vec<Warning>,
    /// One result per applied rule, in rule order.
    pub results: Vec<RuleResult>,
    /// Every name change, in the order made.
    pub name_changes: Vec<NameChange>,
    /// Per-file diffs across all rules.
    pub audit: AuditLog,
    /// Recursive diff between the original root and the final working copy.
    pub full_diff: String,
    /// Commands to replay the run, in execution order.
    pub commands: Vec<ExecutedCommand>,
}

impl RunReport {
    /// Returns true when no rule raised a warning.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
