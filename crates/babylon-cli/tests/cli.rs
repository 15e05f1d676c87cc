// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end runs of the `babylon` binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const AREA: &str = r#"/* <Example :name="small" w=2 h=3 /> */
function area(w, h) {
  // <Probe />
  let a = w * h
  // <Assertion example="small" expected=6 />
  return a
}
"#;

const SQUARE: &str = r#"/* <Example :name="five" x=5 /> */
function square(x) {
  let y = x * x
  return y
}
"#;

fn babylon() -> Command {
    let mut cmd = Command::cargo_bin("babylon").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("BABYLON_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn run_reports_passing_examples() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "area.bab", AREA);
    babylon()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("small"))
        .stdout(predicate::str::contains("area(2, 3) => 6"))
        .stdout(predicate::str::contains("✓ assertion"))
        .stdout(predicate::str::contains("1 passed, 0 failed"));
}

#[test]
fn failing_assertion_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "area.bab", &AREA.replace("expected=6", "expected=7"));
    babylon()
        .arg("run")
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ assertion"))
        .stdout(predicate::str::contains("expected 7, got 6"))
        .stdout(predicate::str::contains("0 passed, 1 failed"));
}

#[test]
fn run_json_report() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "area.bab", AREA);
    let output = babylon().arg("run").arg(&file).arg("--json").output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["passed"], serde_json::json!(true));
    assert_eq!(report["examples"][0]["name"], serde_json::json!("small"));
    assert_eq!(report["examples"][0]["probes"].as_array().unwrap().len(), 1);
}

#[test]
fn examples_are_listed_without_running() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "area.bab", AREA);
    babylon()
        .arg("examples")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("area(2, 3)"))
        .stdout(predicate::str::contains("mode=default"))
        .stdout(predicate::str::contains("assertion line 5: expected 6"))
        .stdout(predicate::str::contains("1 example(s)"));
}

#[test]
fn eval_answers_from_coverage_when_traced() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "square.bab", SQUARE);
    // The `y` of `return y`; nothing calls `square` on its own.
    babylon()
        .args(["eval", file.to_str().unwrap(), "4", "10"])
        .assert()
        .success()
        .stdout("unknown\n");
    babylon()
        .args(["eval", file.to_str().unwrap(), "4", "10", "--trace"])
        .assert()
        .success()
        .stdout("25\n");
}

#[test]
fn eval_runs_to_the_position() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "sq.bab", "function square(x) {\n  return x * x\n}\nlet r = square(4)\n");
    babylon()
        .args(["eval", file.to_str().unwrap(), "2", "12"])
        .assert()
        .success()
        .stdout("16\n");
}

#[test]
fn malformed_runner_is_a_diagnostic() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "lib.bab", "// runner: my main.bab\nfunction f(x) {\n  return x\n}\n");
    babylon()
        .args(["eval", file.to_str().unwrap(), "3", "10"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[B0200]"))
        .stderr(predicate::str::contains("runner script path must not contain whitespace"));
}

#[test]
fn syntax_errors_are_reported() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.bab", "function f( {\n");
    babylon()
        .arg("run")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error[B0001]"));
}

#[test]
fn json_mode_reports_diagnostics_on_stdout() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.bab", "function f( {\n");
    let output = babylon().arg("run").arg(&file).arg("--json").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], serde_json::json!(false));
    assert_eq!(report["error_count"], serde_json::json!(1));
    assert_eq!(report["diagnostics"][0]["code"], serde_json::json!("B0001"));
}

#[test]
fn bad_config_and_missing_files() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "area.bab", AREA);
    let config = write(&dir, "babylon.toml", "[trace\nstep_limit = 1\n");
    babylon()
        .arg("run")
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[B0300]"));
    babylon()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg(dir.path().join("missing.bab"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[B0300]"));

    fs::remove_file(&config).unwrap();
    babylon()
        .arg("run")
        .arg(dir.path().join("missing.bab"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn printed_output_is_shown_per_example() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "twice.bab",
        "/* <Example :name=\"three\" n=3 /> */\nfunction twice(n) {\n  print(\"doubling\", n)\n  return n * 2\n}\n",
    );
    babylon()
        .arg("run")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("twice(3) => 6"))
        .stdout(predicate::str::contains("print  doubling 3"));

    let output = babylon().arg("run").arg(&file).arg("--json").output().unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["examples"][0]["output"], serde_json::json!("doubling 3\n"));
}
