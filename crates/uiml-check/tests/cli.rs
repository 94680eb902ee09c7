//! Integration tests running the `uiml-check` binary.

use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

#[derive(Debug, Deserialize)]
struct JsonDiagnostic {
    #[serde(rename = "type")]
    diagnostic_type: String,
    filename: String,
    start: JsonPosition,
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonPosition {
    line: u32,
    column: u32,
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn run(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_uiml-check"))
        .arg("--workspace")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to run uiml-check")
}

#[test]
fn test_clean_workspace_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Main.xmlui", "<App><Text>Hello</Text></App>");

    let output = run(dir.path(), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("uiml-check found 0 errors and 0 warnings in 1 file"), "{stdout}");
}

#[test]
fn test_json_output_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Main.xmlui", "<App>\n  <Button onClick=\"{ foo(bar }\" />\n</App>");
    write(dir.path(), "legacy/Old.xmlui", "<App><Broken</App>");

    let output = run(dir.path(), &["--output", "json", "--ignore", "legacy/**"]);
    assert_eq!(output.status.code(), Some(1));

    let diagnostics: Vec<JsonDiagnostic> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.diagnostic_type, "Error");
    assert_eq!(diagnostic.filename, "Main.xmlui");
    assert_eq!(diagnostic.code, "T012");
    assert_eq!((diagnostic.start.line, diagnostic.start.column), (2, 30));
    assert!(diagnostic.message.contains("missing closing parenthesis"));
}

#[test]
fn test_warnings_fail_only_on_request() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Main.xmlui", "<App Label='x' />");

    assert!(run(dir.path(), &[]).status.success());
    assert_eq!(run(dir.path(), &["--fail-on-warnings"]).status.code(), Some(1));

    let output = run(dir.path(), &["--threshold", "error", "--output", "machine"]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("U005"));
}

#[test]
fn test_config_file_extensions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "uiml.config.json", r#"{ "extensions": [".uiml"] }"#);
    write(dir.path(), "Main.uiml", "<App />");
    write(dir.path(), "Ignored.xmlui", "<App><Broken</App>");

    let output = run(dir.path(), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("in 1 file"), "{stdout}");
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "uiml.config.json", "{ not json");

    let output = run(dir.path(), &[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "{stderr}");
}
