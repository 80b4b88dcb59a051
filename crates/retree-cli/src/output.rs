//! Report rendering.

use std::io::Write;

use retree::{Mode, RunReport};
use serde_json::Value;

use crate::cli::ResolvedOutputFormat;
use crate::errors::AppError;

/// Writes `report` in the chosen format. `with_diff` adds per-rule and
/// full-run diffs to human output; JSON output always carries them.
pub(crate) fn write_report<W: Write>(
    out: &mut W,
    report: &RunReport,
    format: ResolvedOutputFormat,
    with_diff: bool,
) -> Result<(), AppError> {
    match format {
        ResolvedOutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report).map_err(AppError::SerialiseReport)?;
            out.write_all(b"\n").map_err(AppError::EmitReport)?;
        }
        ResolvedOutputFormat::Human => {
            out.write_all(render_human(report, with_diff).as_bytes())
                .map_err(AppError::EmitReport)?;
        }
    }
    out.flush().map_err(AppError::EmitReport)
}

/// Renders a per-rule summary followed by totals.
#[must_use]
pub(crate) fn render_human(report: &RunReport, with_diff: bool) -> String {
    let mut text = String::new();
    for (index, result) in report.results.iter().enumerate() {
        let action = result
            .rule
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("?");
        text.push_str(&format!("rule {}: {action}\n", index + 1));
        for change in &result.name_changes {
            text.push_str(&format!(
                "  {} -> {}\n",
                change.from.display(),
                change.to.display()
            ));
        }
        for (path, diff) in &result.diffs {
            text.push_str(&format!("  changed {path}\n"));
            if with_diff {
                for line in diff.lines() {
                    text.push_str(&format!("    {line}\n"));
                }
            }
        }
        for warning in &result.warnings {
            text.push_str(&format!("  warning: {} {}\n", warning.message, warning.subject));
        }
    }

    let verb = match report.mode {
        Mode::Transform => "transformed",
        Mode::Dry => "dry run",
    };
    text.push_str(&format!(
        "{verb}: {} rules, {} files changed, {} warnings\n",
        report.results.len(),
        report.audit.len(),
        report.warnings.len()
    ));
    if with_diff && !report.full_diff.is_empty() {
        text.push('\n');
        text.push_str(&report.full_diff);
        if !report.full_diff.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use retree::{NameChange, RuleResult, Warning, messages};
    use serde_json::json;

    use super::*;

    fn report() -> RunReport {
        let rename = json!({"action": "rename", "source": "a.txt", "dest": "b.txt"});
        let replace = json!({"action": "replace", "search": "x", "replace": "y", "exclude": ["c.txt"]});
        let change = NameChange {
            from: PathBuf::from("a.txt"),
            to: PathBuf::from("b.txt"),
        };
        let warning = Warning {
            rule_index: 1,
            subject: json!("c.txt"),
            message: messages::UNUSED_EXCLUDE.to_owned(),
        };

        let mut first = RuleResult {
            rule: rename,
            warnings: Vec::new(),
            name_changes: Vec::new(),
            diffs: BTreeMap::new(),
        };
        first.name_changes.push(change.clone());
        let mut second = RuleResult {
            rule: replace,
            warnings: vec![warning.clone()],
            name_changes: Vec::new(),
            diffs: BTreeMap::new(),
        };
        second
            .diffs
            .insert(String::from("b.txt"), String::from("-x\n+y\n"));

        let mut report = RunReport {
            mode: Mode::Dry,
            warnings: vec![warning],
            results: vec![first, second],
            name_changes: vec![change],
            full_diff: String::from("-x\n+y\n"),
            ..RunReport::default()
        };
        report.audit.record("b.txt", "-x\n+y\n");
        report
    }

    #[test]
    fn human_output_summarises_each_rule() {
        insta::assert_snapshot!(render_human(&report(), false), @r#"
        rule 1: rename
          a.txt -> b.txt
        rule 2: replace
          changed b.txt
          warning: Unused exclude. "c.txt"
        dry run: 2 rules, 1 files changed, 1 warnings
        "#);
    }

    #[test]
    fn human_output_can_include_diffs() {
        let text = render_human(&report(), true);
        assert!(text.contains("  changed b.txt\n    -x\n    +y\n"));
        assert!(text.ends_with("warnings\n\n-x\n+y\n"));
    }
}
