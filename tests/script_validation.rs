//! Integration tests for loading and validating build scripts

mod common;

use common::{create_test_script, quiet_context, read_log};
use std::path::Path;
use taskrun::config::{load_definitions, load_script, validate_script};
use taskrun::error::{ConfigError, TaskrunError};
use taskrun::run_script;

#[test]
fn test_load_and_validate_complete_script() {
    let (_dir, path) = create_test_script(
        r#"
compile:
  command: "cc {src} -o {out}"
  arguments:
    src: main.c
    out: app
test:
  command: ./app --self-test
  dependencies: [compile]
deploy:
  command: ./deploy.sh {target}
  arguments:
    target: staging
  dependencies:
    - compile
    - test
  enabled: false
  when:
    - equal:
        key: env
        value: prod
"#,
    );

    let script = load_script(&path).unwrap();
    validate_script(&script.tasks).unwrap();
    let definitions = load_definitions(&script.tasks).unwrap();

    let names: Vec<&str> = definitions.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["compile", "test", "deploy"]);

    let deploy = &definitions[2].1;
    assert!(!deploy.enabled);
    assert_eq!(deploy.dependencies, vec!["compile", "test"]);
    assert_eq!(deploy.when.len(), 1);
}

#[test]
fn test_missing_command_aborts_before_any_task_runs() {
    let (dir, path) = create_test_script(
        r#"
first:
  command: touch first.txt
second:
  arguments:
    name: world
"#,
    );

    let result = run_script(&path, &quiet_context(), None);

    match result {
        Err(TaskrunError::Config(ConfigError::MissingField { task, field })) => {
            assert_eq!(task, "second");
            assert_eq!(field, "command");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert!(!dir.path().join("first.txt").exists());
    assert!(read_log(&dir).is_empty());
}

#[test]
fn test_wrong_types_are_validation_errors() {
    let cases = [
        ("t:\n  command: ls\n  enabled: maybe\n", "enabled"),
        ("t:\n  command: ls\n  arguments: [x]\n", "arguments"),
        ("t:\n  command: ls\n  dependencies: {a: b}\n", "dependencies"),
    ];

    for (yaml, expected_field) in cases {
        let (_dir, path) = create_test_script(yaml);
        match run_script(&path, &quiet_context(), None) {
            Err(TaskrunError::Config(ConfigError::InvalidType { field, .. })) => {
                assert_eq!(field, expected_field)
            }
            other => panic!("expected invalid type for {}, got {:?}", expected_field, other),
        }
    }
}

#[test]
fn test_condition_entries_need_exactly_one_predicate() {
    let cases = [
        // two predicates in one entry
        "first:\n  command: touch first.txt\ndeploy:\n  command: touch deployed.txt\n  when:\n    - equal: {key: env, value: prod}\n      set: approved\n",
        // no predicate at all
        "first:\n  command: touch first.txt\ndeploy:\n  command: touch deployed.txt\n  when: [{}]\n",
    ];

    for yaml in cases {
        let (dir, path) = create_test_script(yaml);
        let mut ctx = quiet_context();
        ctx.set_var("env".to_string(), "prod".to_string());

        match run_script(&path, &ctx, None) {
            Err(TaskrunError::Config(ConfigError::InvalidType { task, field, .. })) => {
                assert_eq!(task, "deploy");
                assert_eq!(field, "when");
            }
            other => panic!("expected invalid condition, got {:?}", other),
        }
        assert!(!dir.path().join("first.txt").exists());
        assert!(!dir.path().join("deployed.txt").exists());
        assert!(read_log(&dir).is_empty());
    }
}

#[test]
fn test_missing_script_is_not_found() {
    let result = run_script(Path::new("/no/such/build.yml"), &quiet_context(), None);
    assert!(matches!(
        result,
        Err(TaskrunError::Config(ConfigError::NotFound(_)))
    ));
}

#[test]
fn test_malformed_script_is_parse_error() {
    let (dir, path) = create_test_script("t1: {command: [unclosed\n");
    let result = run_script(&path, &quiet_context(), None);
    assert!(matches!(
        result,
        Err(TaskrunError::Config(ConfigError::Parse { .. }))
    ));
    assert!(read_log(&dir).is_empty());
}

#[test]
fn test_empty_script_runs_nothing() {
    let (_dir, path) = create_test_script("");
    let report = run_script(&path, &quiet_context(), None).unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.exit_code, 0);
}
