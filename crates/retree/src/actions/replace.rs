//! `replace`: literal search and replace across the working copy.
//!
//! Candidates are found in the working copy and rewritten into a results
//! copy. Each rewritten file is diffed working against results before the
//! results copy is promoted to be the new working copy.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use retree_replace::{Candidate, FileEdit, IgnoreSet, Replacer};
use retree_stage::{ShellCommand, Stager, StagingPaths, quote};
use serde_json::Value;

use crate::audit;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::exclusion::{self, Exclusion};
use crate::report::messages;
use crate::rule::{ExcludeEntry, Rule};

/// Perl program that replays a whole-file literal replacement.
const PERL_REPLACE: &str = r"s/\Q$ENV{RETREE_SEARCH}\E/$ENV{RETREE_REPLACE}/g";

/// Perl program that replays a replacement keeping occurrences that start on
/// the lines listed in `RETREE_KEEP_LINES`.
const PERL_REPLACE_KEEPING: &str = r"BEGIN { %keep = map { $_ => 1 } split /,/, $ENV{RETREE_KEEP_LINES} } s/\Q$ENV{RETREE_SEARCH}\E/$keep{1 + (substr($_, 0, $-[0]) =~ tr{\n}{})} ? $& : $ENV{RETREE_REPLACE}/ge";

/// Replaces `search` with `replace` in every text file of the working copy,
/// honouring global and local exclusions.
///
/// # Errors
///
/// Returns [`EngineError::Replace`] or [`EngineError::Stage`] when reading,
/// writing, diffing or promoting fails.
pub fn replace(engine: &mut Engine, rule: &Rule) -> Result<(), EngineError> {
    let (Some(search), Some(replacement)) = (rule.str_parameter("search"), rule.str_parameter("replace"))
    else {
        engine.warn(rule.to_value(), messages::MISSING_SEARCH_OR_REPLACE);
        return Ok(());
    };
    if search.is_empty() {
        engine.warn(rule.to_value(), messages::EMPTY_SEARCH);
        return Ok(());
    }

    let exclusions = effective_exclusions(engine, rule);
    let working = engine
        .stager()
        .working()
        .map(Path::to_path_buf)
        .ok_or(EngineError::NotStaged)?;
    let results = StagingPaths::results_path_for(&working);
    let replacer = Replacer::new(&working, &results, search, replacement)?;

    let candidates = replacer.find(&IgnoreSet::new())?;
    if candidates.is_empty() {
        engine.warn(rule.to_value(), messages::NO_RESULTS);
        return Ok(());
    }

    let selection = select(&candidates, &exclusions, engine.stager());
    for unused in &selection.unused {
        engine.warn(unused.subject(), messages::UNUSED_EXCLUDE);
    }
    if selection.edits.is_empty() {
        engine.warn(rule.to_value(), messages::ALL_EXCLUDED);
        return Ok(());
    }

    engine.stager_mut().create_results_copy()?;
    let rewrites = replacer.apply(&selection.edits)?;
    let changed: Vec<PathBuf> = rewrites
        .into_iter()
        .filter(|rewrite| rewrite.replaced > 0)
        .map(|rewrite| rewrite.path)
        .collect();
    let diffs = audit::rule_diffs(engine.stager(), &changed)?;
    engine.record_diffs(diffs);

    let root = engine.stager().root().to_path_buf();
    for command in replay_commands(&root, search, replacement, &selection.edits) {
        engine.record_command("perl", command);
    }
    engine.stager_mut().promote_results()?;
    Ok(())
}

/// Global exclusions followed by this rule's own, without duplicates.
fn effective_exclusions(engine: &mut Engine, rule: &Rule) -> Vec<Exclusion> {
    let mut exclusions = engine.excludes().to_vec();
    let entries = match rule.parameter("exclude") {
        None => return exclusions,
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            engine.warn(rule.to_value(), messages::EXCLUDE_NOT_LIST);
            return exclusions;
        }
    };
    for value in entries {
        match ExcludeEntry::from_value(value) {
            Some(entry) => {
                exclusion::merge(&mut exclusions, Exclusion::resolve(entry, engine.stager()));
            }
            None => engine.warn(value.clone(), messages::INVALID_EXCLUDE),
        }
    }
    exclusions
}

/// Candidates that survive exclusion, and the exclusions that matched none.
#[derive(Debug, Default)]
struct Selection {
    edits: Vec<FileEdit>,
    unused: Vec<Exclusion>,
}

fn select(candidates: &[Candidate], exclusions: &[Exclusion], stager: &Stager) -> Selection {
    let targets: Vec<Option<PathBuf>> = exclusions
        .iter()
        .map(|exclusion| exclusion.relative(stager))
        .collect();
    let mut used = vec![false; exclusions.len()];
    let mut edits = Vec::new();

    for candidate in candidates {
        let mut excluded = false;
        let mut skip_lines = BTreeSet::new();
        for ((exclusion, relative), hit) in exclusions.iter().zip(&targets).zip(used.iter_mut()) {
            let Some(prefix) = relative.as_deref() else {
                continue;
            };
            if !candidate.path.starts_with(prefix) {
                continue;
            }
            match exclusion.line() {
                None => {
                    excluded = true;
                    *hit = true;
                }
                Some(line) if candidate.lines.contains(&line) => {
                    skip_lines.insert(line);
                    *hit = true;
                }
                Some(_) => {}
            }
        }
        let fully_kept = candidate.lines.iter().all(|line| skip_lines.contains(line));
        if !excluded && !fully_kept {
            edits.push(FileEdit {
                path: candidate.path.clone(),
                skip_lines,
            });
        }
    }

    let unused = exclusions
        .iter()
        .zip(used)
        .filter(|(_, hit)| !hit)
        .map(|(exclusion, _)| exclusion.clone())
        .collect();
    Selection { edits, unused }
}

/// Shell commands that reproduce the rewrite against the real root.
fn replay_commands(root: &Path, search: &str, replacement: &str, edits: &[FileEdit]) -> Vec<String> {
    let env = format!("RETREE_SEARCH={} RETREE_REPLACE={}", quote(search), quote(replacement));
    let (whole, partial): (Vec<&FileEdit>, Vec<&FileEdit>) =
        edits.iter().partition(|edit| edit.skip_lines.is_empty());

    let mut commands = Vec::new();
    if !whole.is_empty() {
        let command = whole
            .iter()
            .fold(perl_command(PERL_REPLACE), |command, edit| command.arg(root.join(&edit.path)));
        commands.push(format!("{env} {command}"));
    }
    for edit in partial {
        let lines: Vec<String> = edit.skip_lines.iter().map(ToString::to_string).collect();
        let command = perl_command(PERL_REPLACE_KEEPING).arg(root.join(&edit.path));
        commands.push(format!("{env} RETREE_KEEP_LINES={} {command}", lines.join(",")));
    }
    commands
}

fn perl_command(program: &str) -> ShellCommand {
    ShellCommand::new("perl")
        .arg("-0777")
        .arg("-pi")
        .arg("-e")
        .arg(program)
        .arg("--")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(path: &str, skip: &[usize]) -> FileEdit {
        FileEdit {
            path: PathBuf::from(path),
            skip_lines: skip.iter().copied().collect(),
        }
    }

    #[test]
    fn replay_groups_whole_files_into_one_command() {
        let commands = replay_commands(
            Path::new("/srv/proj"),
            "hello",
            "good bye",
            &[edit("a.txt", &[]), edit("b/c.txt", &[]), edit("d.txt", &[2, 5])],
        );

        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands.first().map(String::as_str),
            Some(concat!(
                "RETREE_SEARCH=hello RETREE_REPLACE='good bye' perl -0777 -pi -e ",
                r"'s/\Q$ENV{RETREE_SEARCH}\E/$ENV{RETREE_REPLACE}/g' -- ",
                "/srv/proj/a.txt /srv/proj/b/c.txt"
            ))
        );
        let keeping = commands.get(1).map(String::as_str).unwrap_or_default();
        assert!(keeping.starts_with("RETREE_SEARCH=hello RETREE_REPLACE='good bye' RETREE_KEEP_LINES=2,5 perl "));
        assert!(keeping.ends_with(" -- /srv/proj/d.txt"));
    }
}
