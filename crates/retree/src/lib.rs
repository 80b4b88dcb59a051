//! Transactional, rule-driven transformation of a directory tree.
//!
//! A run copies the root to a working copy, applies an ordered list of
//! declarative rules to that copy and then either commits the copy over the
//! root ([`transform`]) or throws it away ([`dry`]). The root is never
//! touched before commit. Rules are JSON objects with an `action`:
//!
//! - `copy` and `rename` take `source` and `dest`;
//! - `replace` takes literal `search` and `replace` text and an optional
//!   `exclude` list;
//! - `exclude` takes a `files` list that applies to every later `replace`.
//!
//! Problems a rule can survive become [`Warning`]s; tool and I/O failures
//! abort the run with an [`EngineError`]. The returned [`RunReport`] carries
//! per-rule results, name changes, per-file diffs, the full-run diff and the
//! commands needed to replay the run, which [`render_script`] turns into a
//! shell script.
//!
//! Additional actions can be registered on an [`Engine`] with
//! [`Engine::set_action`].

pub mod actions;
mod audit;
mod engine;
mod error;
mod exclusion;
mod registry;
mod report;
mod rule;
mod script;

#[cfg(test)]
mod tests;

use std::path::Path;

pub use audit::AuditLog;
pub use engine::{Engine, EngineState};
pub use error::EngineError;
pub use exclusion::Exclusion;
pub use registry::{ActionHandler, ActionRegistry};
pub use report::{ExecutedCommand, Mode, NameChange, RuleResult, RunReport, Warning, messages};
pub use rule::{ExcludeEntry, Rule, RuleInput};
pub use script::render_script;

/// Applies `rules` to `root` and commits the result.
///
/// # Errors
///
/// Returns an [`EngineError`] when the rules are malformed or any file
/// operation fails; the root is only replaced if every step succeeded.
pub fn transform(root: impl AsRef<Path>, rules: impl Into<RuleInput>) -> Result<RunReport, EngineError> {
    Engine::new(root, rules)?.run(Mode::Transform)
}

/// Applies `rules` to a copy of `root` and discards it, leaving `root`
/// unchanged.
///
/// # Errors
///
/// Returns an [`EngineError`] when the rules are malformed or any file
/// operation fails.
pub fn dry(root: impl AsRef<Path>, rules: impl Into<RuleInput>) -> Result<RunReport, EngineError> {
    Engine::new(root, rules)?.run(Mode::Dry)
}
