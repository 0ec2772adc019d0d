//! End-to-end generate tests against a local stand-in JIRA instance.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::TempDir;

fn jcs_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jcs"));
    cmd.current_dir(temp_dir.path())
        .env("XDG_CONFIG_HOME", temp_dir.path().join("xdg-config"))
        .env_remove("JIRA_API_TOKEN")
        .env_remove("JIRA_EMAIL");
    cmd
}

const SEARCH_RESULTS: &str = r#"{"issues": [{
    "key": "DEMO-1",
    "fields": {
        "summary": "Fix login crash",
        "issuetype": {"name": "Bug"},
        "status": {"name": "In Progress"},
        "assignee": {"displayName": "Alice Adams"},
        "updated": "2024-03-01T10:00:00.000+0000",
        "subtasks": [{"key": "DEMO-2"}]
    }
}]}"#;

const ISSUE_DEMO_2: &str = r#"{
    "key": "DEMO-2",
    "fields": {
        "summary": "Add a regression test",
        "issuetype": {"name": "Sub-task"},
        "status": {"name": "Done"},
        "reporter": {"displayName": "Bob Brown"},
        "updated": "2024-03-02T09:30:00.000+0000"
    }
}"#;

/// Serve the root search and the one issue fetch the DEMO project needs.
///
/// Each connection carries a single request: read up to the header
/// terminator, route on the path, answer with a canned JSON body, close.
fn spawn_jira_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            let request = String::from_utf8_lossy(&request);
            let path = request.split_whitespace().nth(1).unwrap_or_default();

            let (status, body) = if path.starts_with("/rest/api/2/search") {
                ("200 OK", SEARCH_RESULTS)
            } else if path.starts_with("/rest/api/2/issue/DEMO-2") {
                ("200 OK", ISSUE_DEMO_2)
            } else {
                ("404 Not Found", "{}")
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    base_url
}

#[test]
fn test_generate_writes_report_and_prints_phase_progress() {
    let temp_dir = TempDir::new().unwrap();
    let base_url = spawn_jira_stub();
    let report_path = temp_dir.path().join("report.html");
    let cache_dir = temp_dir.path().join("cache");

    jcs_cmd(&temp_dir)
        .args([
            "generate",
            "--jira-url",
            base_url.as_str(),
            "--project",
            "DEMO",
            "--issue-types",
            "Bug",
            "--token",
            "secret",
            "--email",
            "dev@example.com",
            "--cache-dir",
            cache_dir.to_str().unwrap(),
            "--output",
            report_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Building hierarchy for project DEMO"))
        .stdout(predicate::str::contains("Aggregating contributors"))
        .stdout(predicate::str::contains("Rendering report for DEMO"))
        .stdout(predicate::str::contains("Found 2 unique contributor(s)"))
        .stdout(predicate::str::contains("Report generated:"));

    let html = std::fs::read_to_string(&report_path).unwrap();
    assert!(html.contains("DEMO-1"));
    assert!(html.contains("Alice Adams"));
    assert!(html.contains("Bob Brown"));
    assert!(html.contains(&format!("{}/browse/DEMO-2", base_url)));
}

#[test]
fn test_generate_second_run_reads_from_the_cache() {
    let temp_dir = TempDir::new().unwrap();
    let base_url = spawn_jira_stub();
    let report_path = temp_dir.path().join("report.html");
    let cache_dir = temp_dir.path().join("cache");
    let args = [
        "generate",
        "--jira-url",
        base_url.as_str(),
        "--project",
        "DEMO",
        "--issue-types",
        "Bug",
        "--token",
        "secret",
        "--cache-dir",
        cache_dir.to_str().unwrap(),
        "--output",
        report_path.to_str().unwrap(),
    ];

    jcs_cmd(&temp_dir)
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Hierarchy has 2 ticket(s): 1 fetched, 0 from cache",
        ));

    // The subtask record is unchanged upstream, so nothing is refetched
    jcs_cmd(&temp_dir)
        .args(args)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Hierarchy has 2 ticket(s): 0 fetched, 2 from cache",
        ));
}
