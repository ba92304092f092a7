// Drives the compiled binary for the paths that never reach the keyboard:
// argument validation, unreadable inputs and empty inputs.

use std::fs;

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

fn autotype(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("autotype").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("config.json"))
        .env_remove("RUST_LOG");
    cmd
}

fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn missing_source_is_a_usage_error() {
    let dir = tempdir().unwrap();
    let output = autotype(&dir).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn conflicting_sources_are_rejected() {
    let dir = tempdir().unwrap();
    let output = autotype(&dir)
        .args(["--stdin", "--file", "x.txt"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_file_exits_non_zero() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let output = autotype(&dir)
        .arg("--file")
        .arg(&missing)
        .args(["--delay", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("Failed to read input file"), "{stderr}");
    assert!(stderr.contains("missing.txt"), "{stderr}");
}

#[test]
fn directory_as_file_exits_non_zero() {
    let dir = tempdir().unwrap();
    let output = autotype(&dir)
        .arg("--file")
        .arg(dir.path())
        .args(["--delay", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(stderr_of(&output).contains("not a directory"));
}

#[test]
fn empty_file_types_nothing_and_succeeds() {
    let dir = tempdir().unwrap();
    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "").unwrap();

    let output = autotype(&dir)
        .arg("--file")
        .arg(&empty)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("[>] Reading from file"));
}

#[test]
fn stdin_blank_lines_then_eof_exits_cleanly() {
    let dir = tempdir().unwrap();
    let output = autotype(&dir)
        .arg("--stdin")
        .write_stdin("\n\n\n")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("[>] Reading from stdin"));
    // one prompt per line plus the one answered by EOF
    assert_eq!(stdout.matches("> ").count(), 4);
}
