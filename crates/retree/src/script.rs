//! Replay scripts.
//!
//! [`render_script`] turns a run's executed commands into a POSIX `sh` script
//! that repeats the run directly against the root, with no staging.

use retree_stage::REQUIRED_TOOLS;

use crate::report::ExecutedCommand;

/// Renders `commands` as a shell script.
///
/// The script stops at the first failing command and exits with status 127
/// up front if any program it needs is missing from `PATH`. Each command is
/// preceded by a comment holding its originating rule.
#[must_use]
pub fn render_script(commands: &[ExecutedCommand]) -> String {
    let mut tools: Vec<&str> = REQUIRED_TOOLS.to_vec();
    for command in commands {
        if !tools.contains(&command.program.as_str()) {
            tools.push(&command.program);
        }
    }

    let mut script = String::from("#!/bin/sh\n# Replays a retree run against its root.\nset -eu\n\n");
    script.push_str(&format!("for tool in {}; do\n", tools.join(" ")));
    script.push_str(concat!(
        "  command -v \"$tool\" >/dev/null 2>&1 || {\n",
        "    echo \"retree: required command not found: $tool\" >&2\n",
        "    exit 127\n",
        "  }\n",
        "done\n",
    ));

    for command in commands {
        script.push_str(&format!(
            "\n# rule {}: {}\n{}\n",
            command.rule_index + 1,
            command.rule,
            command.command
        ));
    }
    script
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn executed(rule_index: usize, rule: serde_json::Value, program: &str, command: &str) -> ExecutedCommand {
        ExecutedCommand {
            rule_index,
            rule,
            program: program.to_owned(),
            command: command.to_owned(),
        }
    }

    #[test]
    fn script_for_an_empty_run_only_checks_tools() {
        insta::assert_snapshot!(render_script(&[]), @r#"
        #!/bin/sh
        # Replays a retree run against its root.
        set -eu

        for tool in cp mv rm mkdir diff; do
          command -v "$tool" >/dev/null 2>&1 || {
            echo "retree: required command not found: $tool" >&2
            exit 127
          }
        done
        "#);
    }

    #[test]
    fn script_lists_commands_under_their_rules() {
        let commands = [
            executed(
                0,
                json!({"action": "copy", "dest": "b", "source": "a"}),
                "cp",
                "cp -Rp /srv/proj/a /srv/proj/b",
            ),
            executed(
                1,
                json!({"action": "replace", "replace": "y", "search": "x"}),
                "perl",
                "RETREE_SEARCH=x RETREE_REPLACE=y perl -0777 -pi -e 's' -- /srv/proj/b",
            ),
        ];

        insta::assert_snapshot!(render_script(&commands), @r#"
        #!/bin/sh
        # Replays a retree run against its root.
        set -eu

        for tool in cp mv rm mkdir diff perl; do
          command -v "$tool" >/dev/null 2>&1 || {
            echo "retree: required command not found: $tool" >&2
            exit 127
          }
        done

        # rule 1: {"action":"copy","dest":"b","source":"a"}
        cp -Rp /srv/proj/a /srv/proj/b

        # rule 2: {"action":"replace","replace":"y","search":"x"}
        RETREE_SEARCH=x RETREE_REPLACE=y perl -0777 -pi -e 's' -- /srv/proj/b
        "#);
    }
}
