//! CLI integration tests for the flowlink command-line interface.
//!
//! These tests do not need a reachable workflow server: they cover help
//! output, argument parsing, and configuration errors that stop a command
//! before any network traffic.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the flowlink binary, isolated from the user's config
/// and environment.
fn flowlink(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flowlink").unwrap();
    cmd.current_dir(dir)
        .env("FLOWLINK_CONFIG_DIR", dir)
        .env_remove("N8N_WEBHOOK_URL")
        .env_remove("FLOWLINK_MCP_HOST")
        .env_remove("FLOWLINK_MCP_PORT");
    cmd
}

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("test.toml");
    std::fs::write(&path, format!("[logging]\nfile = false\n\n{}", contents)).unwrap();
    path
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("flowlink"))
        .stdout(predicate::str::contains("workflow automation over MCP"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("flowlink"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("ask"));
}

#[test]
fn test_call_help_shows_args_flag() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path())
        .args(["call", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--args"))
        .stdout(predicate::str::contains("<TOOL>"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_no_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path()).assert().failure();
}

#[test]
fn test_ask_requires_query() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path())
        .arg("ask")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_call_requires_tool_name() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path()).arg("call").assert().failure();
}

#[test]
fn test_call_rejects_non_object_args() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    flowlink(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["call", "get_weather", "--args", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JSON object"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Errors
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_webhook_url_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    flowlink(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("tools")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mcp.webhook_url"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    flowlink(dir.path())
        .args(["--config", "does-not-exist.toml", "status"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.toml"));
}

#[test]
fn test_invalid_port_from_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        dir.path(),
        "[mcp]\nwebhook_url = \"http://localhost:5678/webhook/abc\"\nport = 0\n",
    );
    flowlink(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("mcp.port"));
}
