// crates/rfc-bridge-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for the rfc-bridge binary.
// Purpose: Ensure config commands and serve startup failures behave for operators.
// Dependencies: rfc-bridge-cli binary, tempfile
// ============================================================================
//! ## Overview
//! Runs the built binary with a scrubbed `SAP_*` environment and checks its
//! stdout, stderr, and exit status.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use rfc_bridge_config::RfcBridgeConfig;
use rfc_bridge_config::SAP_ENV_VARS;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn rfc_bridge_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rfc-bridge"))
}

/// Runs the binary with no inherited `SAP_*` variables.
fn run(args: &[&str], env: &[(&str, &str)], cwd: &Path) -> Output {
    let mut command = Command::new(rfc_bridge_bin());
    command.args(args).current_dir(cwd).env_remove("RFC_BRIDGE_CONFIG");
    for name in SAP_ENV_VARS {
        command.env_remove(name);
    }
    for (name, value) in env {
        command.env(name, value);
    }
    command.output().expect("run rfc-bridge")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn config_example_prints_valid_toml() {
    let dir = TempDir::new().unwrap();
    let output = run(&["config", "example"], &[], dir.path());
    assert!(output.status.success(), "{}", stderr(&output));
    let config = RfcBridgeConfig::from_toml(&stdout(&output)).unwrap();
    assert_eq!(config.session.max_attempts, 3);
}

#[test]
fn config_check_prints_redacted_summary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bridge.toml");
    fs::write(
        &path,
        "[connection]\nashost = \"sap01\"\nclient = \"100\"\nuser = \"RFC_USER\"\n\
         password = \"file-secret\"\n",
    )
    .unwrap();
    let output = run(
        &["config", "check", "--config", path.to_str().unwrap()],
        &[("SAP_USER", "ENV_USER")],
        dir.path(),
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("config ok\n"), "{text}");
    assert!(text.contains("target: host=sap01, client=100, user=ENV_USER"), "{text}");
    assert!(!text.contains("file-secret"));
}

#[test]
fn config_check_lists_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let env = [("SAP_ASHOST", "sap01"), ("SAP_USER", "U")];
    let output = run(&["config", "check"], &env, dir.path());
    assert_eq!(output.status.code(), Some(1));
    let text = stderr(&output);
    assert!(text.contains("missing required env vars: SAP_CLIENT, SAP_PASSWD"), "{text}");
}

#[test]
fn serve_without_connection_settings_fails() {
    let dir = TempDir::new().unwrap();
    let output = run(&["serve"], &[], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("SAP connection required"));
}

#[test]
fn serve_reports_connect_failure_when_helper_is_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bridge.toml");
    fs::write(
        &path,
        "[server.audit]\nenabled = false\n\n\
         [bridge]\ncommand = [\"rfc-bridge-helper-does-not-exist\"]\n",
    )
    .unwrap();
    let output = run(&["serve", "--config", path.to_str().unwrap(), "NPL"], &[], dir.path());
    assert_eq!(output.status.code(), Some(1));
    let text = stderr(&output);
    assert!(text.contains("connecting to SAP destination \"NPL\""), "{text}");
    assert!(text.contains("failed to connect: "), "{text}");
    assert!(!text.contains("MCP server starting"));
}
