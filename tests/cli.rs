// End-to-end runs of the atomic-runner binary against a throwaway atomics
// folder. Requires: assert_cmd, predicates crates in [dev-dependencies]
#![cfg(unix)]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

const DEFINITION: &str = r#"
attack_technique: T0000
display_name: Runner self test
atomic_tests:
- name: echo test
  supported_platforms: [linux, macos]
  input_arguments:
    filename:
      description: name to echo
      type: string
      default: out.txt
  executor:
    name: sh
    command: echo #{filename}
- name: windows only
  supported_platforms: [windows]
  executor:
    name: command_prompt
    command: dir
"#;

fn atomics() -> tempfile::TempDir {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("T0000");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("T0000.yaml"), DEFINITION).unwrap();
    root
}

fn runner(root: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("atomic-runner").unwrap();
    cmd.arg("--atomicsdir").arg(root.path());
    cmd
}

#[test]
fn successful_run_exits_with_test_success() {
    let root = atomics();
    runner(&root)
        .args(&["-t", "T0000", "-n", "echo test"])
        .assert()
        .code(9)
        .stdout(contains("\"test_status\": 9").and(contains("echo out.txt")));
}

#[test]
fn input_flag_overrides_default() {
    let root = atomics();
    runner(&root)
        .args(&["-t", "0000", "-i", "0", "--input", "filename=custom.txt"])
        .assert()
        .code(9)
        .stdout(contains("echo custom.txt"));
}

#[test]
fn yaml_results_format() {
    let root = atomics();
    runner(&root)
        .args(&["-t", "T0000", "-i", "0", "--resultsformat", "yaml"])
        .assert()
        .code(9)
        .stdout(contains("test_status: 9"));
}

#[test]
fn platform_mismatch_exits_with_invalid_arguments() {
    let root = atomics();
    runner(&root)
        .args(&["-t", "T0000", "-n", "windows only"])
        .assert()
        .code(5)
        .stdout(contains("windows"));
}

#[test]
fn missing_technique_exits_with_atomic_not_found() {
    let root = atomics();
    runner(&root).args(&["-t", "T4242", "-i", "0"]).assert().code(2);
}

#[test]
fn bad_stage_and_format_are_invalid_arguments() {
    let root = atomics();
    runner(&root)
        .args(&["-t", "T0000", "-i", "0", "--stage", "deploy"])
        .assert()
        .code(5);
    runner(&root)
        .args(&["-t", "T0000", "-i", "0", "--resultsformat", "xml"])
        .assert()
        .code(5);
}

#[test]
fn run_spec_from_stdin() {
    let root = atomics();
    let spec = format!(
        r#"{{"Technique": "T0000", "TestName": "echo test", "TestIndex": -1, "AtomicsDir": "{}", "Inputs": {{"filename": "stdin.txt"}}}}"#,
        root.path().display()
    );
    Command::cargo_bin("atomic-runner")
        .unwrap()
        .args(&["--config", "-"])
        .write_stdin(spec)
        .assert()
        .code(9)
        .stdout(contains("echo stdin.txt"));
}
