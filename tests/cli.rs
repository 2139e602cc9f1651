//! Command-line tests for the compat-check binary
//!
//! Each test runs the built binary with an isolated config directory so a
//! user's own config file never leaks in.

use serde_json::Value;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn compat_check(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_compat-check"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run compat-check")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// A local URL nothing is listening on
fn closed_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

#[test]
fn test_list_console() {
    let home = TempDir::new().unwrap();
    let output = compat_check(home.path(), &["--list"]);

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Available Tests"));
    assert!(out.contains("health_endpoint"));
    assert!(out.contains("in 8 categories"));
}

#[test]
fn test_list_json_in_priority_order() {
    let home = TempDir::new().unwrap();
    let output = compat_check(home.path(), &["--list", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let catalog: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let categories: Vec<&str> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["category"].as_str().unwrap())
        .collect();
    assert_eq!(
        categories,
        vec![
            "connectivity",
            "basic_chat",
            "streaming",
            "models",
            "tools",
            "parameters",
            "errors",
            "response_format"
        ]
    );

    let tests: Vec<&str> = catalog[0]["tests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t.as_str().unwrap())
        .collect();
    let mut sorted = tests.clone();
    sorted.sort();
    assert_eq!(tests, sorted);
}

#[test]
fn test_unknown_test_runs_nothing() {
    let home = TempDir::new().unwrap();
    let server = closed_server();

    let output = compat_check(home.path(), &["--test", "no_such_test", "--server", &server]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("No tests to run"));

    let output = compat_check(
        home.path(),
        &["--test", "no_such_test", "--server", &server, "--json"],
    );
    assert_eq!(output.status.code(), Some(0));
    let document: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(document["results"].as_array().unwrap().len(), 0);
    assert_eq!(document["summary"]["passed"], 0);
}

#[test]
fn test_unreachable_server_counts_failures() {
    let home = TempDir::new().unwrap();
    let server = closed_server();
    let output = compat_check(
        home.path(),
        &["connectivity", "--server", &server, "--timeout", "5", "--json"],
    );

    assert_eq!(output.status.code(), Some(5), "{}", stderr(&output));
    let document: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(document["server"], server.as_str());
    assert_eq!(document["provider"], "chatgpt");
    assert_eq!(document["model"], "chatgpt/gpt-5");

    let results = document["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    for result in results {
        assert_eq!(result["category"], "connectivity");
        assert_eq!(result["outcome"], "errored");
        assert!(result["error"].as_str().unwrap().starts_with("http: "));
    }
    assert_eq!(document["summary"]["failed"], 5);
}

#[test]
fn test_config_file_supplies_settings() {
    let home = TempDir::new().unwrap();
    let server = closed_server();
    let config = home.path().join("custom.toml");
    std::fs::write(
        &config,
        format!(
            "[server]\nurl = \"{}\"\ntimeout_secs = 5\n\n[suite]\nprovider = \"copilot\"\n",
            server
        ),
    )
    .unwrap();

    let output = compat_check(
        home.path(),
        &[
            "--test",
            "health_endpoint",
            "--json",
            "--config",
            config.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(1), "{}", stderr(&output));
    let document: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(document["provider"], "copilot");
    assert_eq!(document["model"], "copilot/gpt-4o");
}

#[test]
fn test_invalid_settings_are_fatal() {
    let home = TempDir::new().unwrap();

    let output = compat_check(home.path(), &["--provider", "bard"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown provider 'bard'"));

    let output = compat_check(home.path(), &["--server", "ftp://example.com"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid server URL"));

    let missing = home.path().join("missing.toml");
    let output = compat_check(home.path(), &["--config", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_zero_timeout_rejected_by_parser() {
    let home = TempDir::new().unwrap();
    let output = compat_check(home.path(), &["--timeout", "0"]);
    assert_eq!(output.status.code(), Some(2));
}
