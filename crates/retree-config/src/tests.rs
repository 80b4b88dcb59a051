//! Unit tests for configuration accessors.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use rstest::rstest;

use super::*;

#[test]
fn defaults_apply_when_fields_are_unset() {
    let config = Config::default();
    assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    assert_eq!(config.log_format(), LogFormat::Compact);
}

#[test]
fn explicit_values_override_defaults() {
    let config = Config {
        log_filter: Some(String::from("retree=trace")),
        log_format: Some(LogFormat::Json),
        scratch_dir: None,
    };
    assert_eq!(config.log_filter(), "retree=trace");
    assert_eq!(config.log_format(), LogFormat::Json);
}

#[rstest]
#[case("json", LogFormat::Json)]
#[case("JSON", LogFormat::Json)]
#[case("compact", LogFormat::Compact)]
fn log_format_parses_case_insensitively(#[case] input: &str, #[case] expected: LogFormat) {
    let parsed = LogFormat::from_str(input).expect("format should parse");
    assert_eq!(parsed, expected);
}

#[test]
fn log_format_rejects_unknown_values() {
    assert!(LogFormat::from_str("pretty").is_err());
}

#[test]
fn scratch_dir_defaults_to_root_parent() {
    let config = Config::default();
    let dir = config
        .scratch_dir_for(Path::new("/srv/project"))
        .expect("parent should exist");
    assert_eq!(dir, PathBuf::from("/srv"));
}

#[test]
fn configured_scratch_dir_wins() {
    let config = Config {
        scratch_dir: Some(PathBuf::from("/var/tmp")),
        ..Config::default()
    };
    let dir = config
        .scratch_dir_for(Path::new("/srv/project"))
        .expect("configured dir");
    assert_eq!(dir, PathBuf::from("/var/tmp"));
}

#[rstest]
#[case("/")]
#[case("project")]
fn scratch_dir_requires_a_parent(#[case] root: &str) {
    let error = Config::default()
        .scratch_dir_for(Path::new(root))
        .expect_err("root without parent should fail");
    assert!(matches!(error, ScratchDirError::NoParent { .. }));
}
