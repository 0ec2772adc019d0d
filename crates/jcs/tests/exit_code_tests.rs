//! Integration tests for standardized exit codes
//!
//! Tests that the CLI returns appropriate exit codes for different error scenarios.

use std::process::Command;
use tempfile::TempDir;

fn jcs_binary() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    std::path::Path::new(manifest_dir)
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("target/debug/jcs")
        .to_string_lossy()
        .to_string()
}

/// Helper building a command isolated from any real config file or
/// credential environment variables.
fn jcs_command(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(jcs_binary());
    cmd.current_dir(temp_dir.path())
        .env("XDG_CONFIG_HOME", temp_dir.path().join("xdg-config"))
        .env_remove("JIRA_API_TOKEN")
        .env_remove("JIRA_EMAIL");
    cmd
}

#[test]
fn test_exit_code_help() {
    let temp_dir = TempDir::new().unwrap();

    let output = jcs_command(&temp_dir).arg("--help").output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("generate"));
    assert!(stdout.contains("cache-info"));
}

#[test]
fn test_exit_code_generate_help() {
    let temp_dir = TempDir::new().unwrap();

    let output = jcs_command(&temp_dir)
        .args(["generate", "--help"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--jira-url"));
    assert!(stdout.contains("--ticket"));
    assert!(stdout.contains("--issue-types"));
}

#[test]
fn test_exit_code_no_command_is_generic_error() {
    let temp_dir = TempDir::new().unwrap();

    let output = jcs_command(&temp_dir).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No command provided"));
}

#[test]
fn test_exit_code_unknown_flag_is_invalid_argument() {
    let temp_dir = TempDir::new().unwrap();

    // clap reports unknown arguments with exit code 2
    let output = jcs_command(&temp_dir)
        .args(["generate", "--no-such-flag"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_exit_code_missing_jira_url_is_invalid_argument() {
    let temp_dir = TempDir::new().unwrap();

    let output = jcs_command(&temp_dir)
        .args(["generate", "--project", "DEMO", "--token", "secret"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing JIRA base URL"));
}

#[test]
fn test_exit_code_missing_token_is_invalid_argument() {
    let temp_dir = TempDir::new().unwrap();

    let output = jcs_command(&temp_dir)
        .args([
            "generate",
            "--jira-url",
            "https://jira.example.com",
            "--project",
            "DEMO",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing API token"));
}

#[test]
fn test_exit_code_missing_project_and_ticket_is_invalid_argument() {
    let temp_dir = TempDir::new().unwrap();

    let output = jcs_command(&temp_dir)
        .args([
            "generate",
            "--jira-url",
            "https://jira.example.com",
            "--token",
            "secret",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Missing --project or --ticket"));
}

#[test]
fn test_exit_code_unreachable_source_is_external_error() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("cache");
    let report = temp_dir.path().join("report.html");

    // Nothing listens on port 1, so the root fetch fails immediately
    let output = jcs_command(&temp_dir)
        .args([
            "generate",
            "--jira-url",
            "http://127.0.0.1:1",
            "--project",
            "DEMO",
            "--token",
            "secret",
            "--cache-dir",
            cache_dir.to_str().unwrap(),
            "--output",
            report.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(10));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unavailable"));
    assert!(!report.exists());
}

#[test]
fn test_exit_code_single_ticket_mode_uses_same_error_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("cache");

    let output = jcs_command(&temp_dir)
        .args([
            "generate",
            "--jira-url",
            "http://127.0.0.1:1",
            "--ticket",
            "DEMO-7",
            "--token",
            "secret",
            "--cache-dir",
            cache_dir.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn test_json_error_envelope_for_unreachable_source() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("cache");

    let output = jcs_command(&temp_dir)
        .args([
            "generate",
            "--json",
            "--jira-url",
            "http://127.0.0.1:1",
            "--project",
            "DEMO",
            "--token",
            "secret",
            "--cache-dir",
            cache_dir.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(10));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "SOURCE_UNAVAILABLE");
    assert_eq!(json["metadata"]["command"], "generate");
    assert!(json["metadata"]["timestamp"].is_string());
}
