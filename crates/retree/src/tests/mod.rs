//! Crate-level tests of the convenience entry points, plus BDD scenarios.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use crate::{EngineError, Mode, dry, transform};

mod behaviour;

fn seeded() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path().join("proj");
    fs::create_dir_all(root.join("src")).expect("create root");
    fs::write(root.join("src/lib.txt"), "alpha beta\n").expect("seed");
    (dir, root)
}

#[test]
fn transform_accepts_rule_text() {
    let (_dir, root) = seeded();
    let rules = r#"[{"action": "replace", "search": "beta", "replace": "gamma"}]"#;

    let report = transform(&root, rules).expect("transform");

    assert_eq!(report.mode, Mode::Transform);
    assert!(report.is_clean());
    assert_eq!(
        fs::read_to_string(root.join("src/lib.txt")).expect("read"),
        "alpha gamma\n"
    );
}

#[test]
fn dry_accepts_parsed_rules() {
    let (_dir, root) = seeded();

    let report = dry(&root, vec![json!({"action": "rename", "source": "src", "dest": "lib"})])
        .expect("dry");

    assert_eq!(report.mode, Mode::Dry);
    assert_eq!(report.name_changes.len(), 1);
    assert!(root.join("src/lib.txt").exists());
    assert!(!root.join("lib").exists());
}

#[test]
fn malformed_rule_text_is_a_syntax_error() {
    let (_dir, root) = seeded();
    let error = transform(&root, "[{").expect_err("syntax error");
    assert!(matches!(error, EngineError::Syntax(_)));
}

#[test]
fn non_list_documents_are_rejected() {
    let (_dir, root) = seeded();
    let error = dry(&root, json!({"action": "copy"})).expect_err("not a list");
    assert!(matches!(error, EngineError::Validation { .. }));
}
