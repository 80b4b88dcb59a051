//! `exclude`: global exclusions for later replace rules.

use serde_json::Value;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::report::messages;
use crate::rule::{ExcludeEntry, Rule};

/// Adds each entry of `files` to the run's global exclusions.
///
/// Entries apply to replace rules that come after this one. Entries that
/// match neither exclude form are skipped with a warning.
///
/// # Errors
///
/// Never fails; the signature matches the other handlers.
pub fn exclude(engine: &mut Engine, rule: &Rule) -> Result<(), EngineError> {
    let Some(Value::Array(files)) = rule.parameter("files") else {
        engine.warn(rule.to_value(), messages::MISSING_FILES);
        return Ok(());
    };
    for value in files {
        match ExcludeEntry::from_value(value) {
            Some(entry) => {
                engine.add_exclude(entry);
            }
            None => engine.warn(value.clone(), messages::INVALID_EXCLUDE),
        }
    }
    Ok(())
}
