//! `copy` and `rename`.

use std::path::{Path, PathBuf};

use retree_stage::ShellCommand;

use crate::engine::Engine;
use crate::error::EngineError;
use crate::report::messages;
use crate::rule::Rule;

/// Copies `source` to `dest` inside the working copy.
///
/// # Errors
///
/// Returns [`EngineError::Stage`] when a file operation fails.
pub fn copy(engine: &mut Engine, rule: &Rule) -> Result<(), EngineError> {
    transfer(engine, rule, ShellCommand::copy)
}

/// Moves `source` to `dest` inside the working copy.
///
/// # Errors
///
/// Returns [`EngineError::Stage`] when a file operation fails.
pub fn rename(engine: &mut Engine, rule: &Rule) -> Result<(), EngineError> {
    transfer(engine, rule, ShellCommand::rename)
}

fn transfer(
    engine: &mut Engine,
    rule: &Rule,
    build: fn(&Path, &Path) -> ShellCommand,
) -> Result<(), EngineError> {
    let non_empty = |name| rule.str_parameter(name).filter(|value| !value.is_empty());
    let (Some(source), Some(dest)) = (non_empty("source"), non_empty("dest")) else {
        engine.warn(rule.to_value(), messages::MISSING_SOURCE_OR_DEST);
        return Ok(());
    };

    let stager = engine.stager();
    let (Some(source_path), Some(requested)) = (
        stager.confine_path(Path::new(source)),
        stager.confine_path(Path::new(dest)),
    ) else {
        engine.warn(rule.to_value(), messages::OUTSIDE_TREE);
        return Ok(());
    };
    let dest_path = landing_path(&source_path, &requested);
    let source_exists = stager.exists(&source_path);
    let dest_exists = stager.exists(&dest_path);
    let missing_parent = dest_path
        .parent()
        .filter(|parent| !stager.exists(parent))
        .map(Path::to_path_buf);

    if !source_exists {
        engine.warn(rule.to_value(), messages::SOURCE_MISSING);
        return Ok(());
    }
    if dest_exists {
        engine.warn(rule.to_value(), messages::OVERWRITING_DEST);
    }
    if let Some(parent) = missing_parent {
        engine.execute(&ShellCommand::make_dirs(&parent))?;
    }
    engine.execute(&build(&source_path, &requested))?;

    let from = relative_or_absolute(engine, source_path);
    let to = relative_or_absolute(engine, dest_path);
    engine.record_name_change(from, to);
    Ok(())
}

/// Where `source` ends up: `cp` and `mv` place it inside an existing
/// directory destination.
fn landing_path(source: &Path, dest: &Path) -> PathBuf {
    match source.file_name() {
        Some(name) if dest.is_dir() => dest.join(name),
        _ => dest.to_path_buf(),
    }
}

fn relative_or_absolute(engine: &Engine, path: PathBuf) -> PathBuf {
    engine.stager().relative_path(&path).unwrap_or(path)
}
