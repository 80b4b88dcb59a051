use super::*;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

struct StaticConfigLoader {
    config: Config,
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

struct Workspace {
    dir: TempDir,
    root: PathBuf,
    rules: PathBuf,
}

impl Workspace {
    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).expect("read file")
    }
}

#[fixture]
fn workspace() -> Workspace {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path().join("tree");
    fs::create_dir_all(&root).expect("create tree");
    fs::write(root.join("greeting.txt"), "hello world\n").expect("seed tree");
    let rules = dir.path().join("rules.json");
    fs::write(
        &rules,
        r#"[
            {"action": "copy", "source": "greeting.txt", "dest": "copy.txt"},
            {"action": "replace", "search": "hello", "replace": "goodbye", "exclude": ["copy.txt"]}
        ]"#,
    )
    .expect("write rules");
    Workspace { dir, root, rules }
}

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn run_cli(workspace: &Workspace, args: &[&OsStr]) -> Outcome {
    let loader = StaticConfigLoader {
        config: Config {
            scratch_dir: Some(workspace.dir.path().to_path_buf()),
            ..Config::default()
        },
    };
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut argv = vec![OsString::from("retree")];
    argv.extend(args.iter().map(|arg| arg.to_os_string()));
    let exit = {
        let mut io = IoStreams::new(&mut stdout, &mut stderr, false);
        run_with_loader(argv, &mut io, &loader)
    };
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

fn os(path: &Path) -> &OsStr {
    path.as_os_str()
}

#[rstest]
fn dry_runs_print_a_human_summary(workspace: Workspace) {
    let outcome = run_cli(
        &workspace,
        &[
            OsStr::new("dry"),
            os(&workspace.root),
            os(&workspace.rules),
            OsStr::new("--output"),
            OsStr::new("human"),
        ],
    );

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(
        outcome.stdout,
        concat!(
            "rule 1: copy\n",
            "  greeting.txt -> copy.txt\n",
            "rule 2: replace\n",
            "  changed greeting.txt\n",
            "dry run: 2 rules, 1 files changed, 0 warnings\n",
        )
    );
    assert_eq!(workspace.read("greeting.txt"), "hello world\n");
    assert!(!workspace.root.join("copy.txt").exists());
}

#[rstest]
fn transform_emits_json_and_a_replay_script(workspace: Workspace) {
    let script = workspace.path("replay.sh");
    let outcome = run_cli(
        &workspace,
        &[
            OsStr::new("transform"),
            os(&workspace.root),
            os(&workspace.rules),
            OsStr::new("--script"),
            os(&script),
        ],
    );

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "stderr: {}", outcome.stderr);
    assert_eq!(workspace.read("greeting.txt"), "goodbye world\n");
    assert_eq!(workspace.read("copy.txt"), "hello world\n");

    let report: Value = serde_json::from_str(&outcome.stdout).expect("json report");
    assert_eq!(report.get("mode"), Some(&Value::from("transform")));
    let results = report.get("results").and_then(Value::as_array).expect("results");
    assert_eq!(results.len(), 2);

    let replay = fs::read_to_string(&script).expect("script written");
    assert!(replay.starts_with("#!/bin/sh\n"));
    assert!(replay.contains("\n# rule 1: "));
    assert!(replay.contains(" perl -0777 -pi -e "));
}

#[rstest]
fn missing_rule_files_fail_the_run(workspace: Workspace) {
    let missing = workspace.path("absent.json");
    let outcome = run_cli(
        &workspace,
        &[OsStr::new("transform"), os(&workspace.root), os(&missing)],
    );

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.starts_with("retree: failed to read rules from "));
    assert!(outcome.stdout.is_empty());
}

#[rstest]
fn malformed_rules_fail_without_touching_the_tree(workspace: Workspace) {
    fs::write(&workspace.rules, "[{\"action\": \"copy\"").expect("rewrite rules");
    let outcome = run_cli(
        &workspace,
        &[OsStr::new("transform"), os(&workspace.root), os(&workspace.rules)],
    );

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("run failed"), "stderr: {}", outcome.stderr);
    assert_eq!(workspace.read("greeting.txt"), "hello world\n");
}

#[rstest]
fn missing_subcommands_are_usage_errors(workspace: Workspace) {
    let outcome = run_cli(&workspace, &[]);
    assert_eq!(outcome.exit, ExitCode::from(2));
    assert!(outcome.stderr.starts_with("retree: "));
}

#[rstest]
fn help_goes_to_stdout(workspace: Workspace) {
    let outcome = run_cli(&workspace, &[OsStr::new("--help")]);
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("transform"));
    assert!(outcome.stdout.contains("dry"));
    assert!(outcome.stderr.is_empty());
}

#[rstest]
#[case(OutputFormat::Auto, true, ResolvedOutputFormat::Human)]
#[case(OutputFormat::Auto, false, ResolvedOutputFormat::Json)]
#[case(OutputFormat::Human, false, ResolvedOutputFormat::Human)]
#[case(OutputFormat::Json, true, ResolvedOutputFormat::Json)]
fn output_format_resolution(
    #[case] format: OutputFormat,
    #[case] terminal: bool,
    #[case] expected: ResolvedOutputFormat,
) {
    assert_eq!(format.resolve(terminal), expected);
}
