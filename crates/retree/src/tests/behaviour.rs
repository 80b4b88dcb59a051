//! Behaviour-driven tests for whole engine runs.

use std::fs;
use std::path::PathBuf;

use retree_config::Config;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{Engine, EngineError, Mode, RunReport};

// ---------------------------------------------------------------------------
// Test world
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TestWorld {
    scratch: Option<TempDir>,
    rules: Vec<Value>,
    outcome: Option<Result<RunReport, EngineError>>,
}

impl TestWorld {
    fn root(&mut self) -> PathBuf {
        let scratch = self
            .scratch
            .get_or_insert_with(|| TempDir::new().expect("temp dir"));
        let root = scratch.path().join("proj");
        fs::create_dir_all(&root).expect("create root");
        root
    }

    fn report(&self) -> &RunReport {
        self.outcome
            .as_ref()
            .expect("rules have not been run")
            .as_ref()
            .expect("expected the run to succeed")
    }

    fn messages(&self) -> Vec<&str> {
        self.report()
            .warnings
            .iter()
            .map(|warning| warning.message.as_str())
            .collect()
    }
}

#[fixture]
fn world() -> TestWorld {
    TestWorld::default()
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given("a tree with file {name} containing {content}")]
fn given_file(world: &mut TestWorld, name: String, content: String) {
    let root = world.root();
    fs::write(root.join(unquote(&name)), format!("{}\n", unquote(&content))).expect("seed file");
}

#[given("a replace rule from {search} to {replacement}")]
fn given_replace(world: &mut TestWorld, search: String, replacement: String) {
    world.rules.push(json!({
        "action": "replace",
        "search": unquote(&search),
        "replace": unquote(&replacement),
    }));
}

#[given("a copy rule from {source} to {dest}")]
fn given_copy(world: &mut TestWorld, source: String, dest: String) {
    world.rules.push(json!({
        "action": "copy",
        "source": unquote(&source),
        "dest": unquote(&dest),
    }));
}

#[given("a rename rule from {source} to {dest}")]
fn given_rename(world: &mut TestWorld, source: String, dest: String) {
    world.rules.push(json!({
        "action": "rename",
        "source": unquote(&source),
        "dest": unquote(&dest),
    }));
}

#[given("a global exclude of {name}")]
fn given_exclude(world: &mut TestWorld, name: String) {
    world
        .rules
        .push(json!({"action": "exclude", "files": [unquote(&name)]}));
}

#[given("a rule with action {action}")]
fn given_action(world: &mut TestWorld, action: String) {
    world.rules.push(json!({"action": unquote(&action)}));
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

fn run(world: &mut TestWorld, mode: Mode) {
    let root = world.root();
    let config = Config {
        scratch_dir: root.parent().map(PathBuf::from),
        ..Config::default()
    };
    let rules = Value::Array(world.rules.clone());
    let outcome = Engine::with_config(&root, rules, &config).and_then(|mut engine| engine.run(mode));
    world.outcome = Some(outcome);
}

#[when("the rules are run in transform mode")]
fn when_transform(world: &mut TestWorld) {
    run(world, Mode::Transform);
}

#[when("the rules are run in dry mode")]
fn when_dry(world: &mut TestWorld) {
    run(world, Mode::Dry);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the run succeeds")]
fn then_succeeds(world: &mut TestWorld) {
    assert_eq!(world.report().results.len(), world.rules.len());
}

#[then("the run fails because no handler exists for {action}")]
fn then_handler_missing(world: &mut TestWorld, action: String) {
    let error = world
        .outcome
        .as_ref()
        .expect("rules have not been run")
        .as_ref()
        .expect_err("expected the run to fail");
    match error {
        EngineError::HandlerNotFound { action: missing } => assert_eq!(missing, unquote(&action)),
        other => panic!("expected HandlerNotFound, got: {other}"),
    }
}

#[then("file {name} reads {content}")]
fn then_file_reads(world: &mut TestWorld, name: String, content: String) {
    let path = world.root().join(unquote(&name));
    let text = fs::read_to_string(&path).expect("read file");
    assert_eq!(text.trim_end(), unquote(&content));
}

#[then("file {name} does not exist")]
fn then_file_absent(world: &mut TestWorld, name: String) {
    let path = world.root().join(unquote(&name));
    assert!(!path.exists(), "{} should not exist", path.display());
}

#[then("the diff for {name} includes {line}")]
fn then_rule_diff(world: &mut TestWorld, name: String, line: String) {
    let file = unquote(&name);
    let history = world.report().audit.history(file);
    assert_eq!(history.len(), 1, "expected one diff for {file}");
    let diff = history.first().map(String::as_str).unwrap_or_default();
    assert!(
        diff.lines().any(|text| text == unquote(&line)),
        "diff for {file} lacks {line}:\n{diff}"
    );
}

#[then("the full diff includes {line}")]
fn then_full_diff(world: &mut TestWorld, line: String) {
    let diff = &world.report().full_diff;
    assert!(
        diff.lines().any(|text| text == unquote(&line)),
        "full diff lacks {line}:\n{diff}"
    );
}

#[then("the warning {message} is reported")]
fn then_warning(world: &mut TestWorld, message: String) {
    let messages = world.messages();
    assert!(
        messages.contains(&unquote(&message)),
        "expected warning {message}, got {messages:?}"
    );
}

#[then("no warnings are reported")]
fn then_no_warnings(world: &mut TestWorld) {
    assert_eq!(world.messages(), [] as [&str; 0]);
}

// ---------------------------------------------------------------------------
// Scenario registration
// ---------------------------------------------------------------------------

#[scenario(
    path = "tests/features/rule_engine.feature",
    name = "Replacing text commits the change and records a diff"
)]
fn replace_commits(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rule_engine.feature",
    name = "Copying over an existing file warns and overwrites it"
)]
fn copy_overwrites(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rule_engine.feature",
    name = "Renaming a missing file warns and changes nothing"
)]
fn rename_missing(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rule_engine.feature",
    name = "A dry run reports changes without applying them"
)]
fn dry_run(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rule_engine.feature",
    name = "Excluding every match leaves the file alone"
)]
fn all_excluded(world: TestWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rule_engine.feature",
    name = "An unknown action aborts before staging"
)]
fn unknown_action(world: TestWorld) {
    let _ = world;
}
