//! Connection resolution tests for rfc-bridge-config.
// crates/rfc-bridge-config/tests/connection_resolution.rs
// =============================================================================
// Module: Connection Resolution Tests
// Description: Validate SAP_* overlay precedence and mode selection.
// Purpose: Ensure partial direct configurations fail with actionable errors.
// =============================================================================

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

use std::collections::BTreeMap;

use rfc_bridge_config::ConnectionConfig;
use rfc_bridge_config::RfcBridgeConfig;
use rfc_bridge_core::ConnectionSpec;
use rfc_bridge_core::ServerAddress;

type TestResult = Result<(), String>;

fn overlay(pairs: &[(&str, &str)]) -> ConnectionConfig {
    let env: BTreeMap<String, String> =
        pairs.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    let mut config = ConnectionConfig::default();
    config.overlay_env(|name| env.get(name).cloned());
    config
}

fn direct(spec: ConnectionSpec) -> Result<rfc_bridge_core::DirectConnection, String> {
    match spec {
        ConnectionSpec::Direct(direct) => Ok(direct),
        ConnectionSpec::Destination(name) => Err(format!("expected direct, got destination {name}")),
    }
}

#[test]
fn destination_wins_over_direct_fields() -> TestResult {
    let config = overlay(&[("SAP_DEST", "NPL"), ("SAP_ASHOST", "host"), ("SAP_CLIENT", "001")]);
    assert_eq!(config.resolve().map_err(|err| err.to_string())?, ConnectionSpec::Destination(
        "NPL".to_string()
    ));
    Ok(())
}

#[test]
fn environment_destination_beats_cli_destination() -> TestResult {
    let mut config = overlay(&[("SAP_DEST", "ENVDEST")]);
    config.override_destination(Some("ARGDEST"));
    assert_eq!(config.resolve().map_err(|err| err.to_string())?, ConnectionSpec::Destination(
        "ENVDEST".to_string()
    ));
    Ok(())
}

#[test]
fn cli_destination_applies_when_environment_has_none() -> TestResult {
    let mut config = RfcBridgeConfig::from_toml("[connection]\ndestination = \"FILE\"\n")
        .map_err(|err| err.to_string())?
        .connection;
    config.overlay_env(|name| (name == "SAP_DEST").then(String::new));
    config.override_destination(Some("QAS"));
    assert_eq!(config.resolve().map_err(|err| err.to_string())?, ConnectionSpec::Destination(
        "QAS".to_string()
    ));
    config.override_destination(Some("   "));
    assert_eq!(config.resolve().map_err(|err| err.to_string())?, ConnectionSpec::Destination(
        "QAS".to_string()
    ));
    Ok(())
}

#[test]
fn environment_direct_mode_replaces_file_destination() -> TestResult {
    let mut config = RfcBridgeConfig::from_toml("[connection]\ndestination = \"FILE\"\n")
        .map_err(|err| err.to_string())?
        .connection;
    config.overlay_env(|name| match name {
        "SAP_ASHOST" => Some("env-host".to_string()),
        "SAP_CLIENT" => Some("100".to_string()),
        "SAP_USER" => Some("RFC_USER".to_string()),
        "SAP_PASSWD" => Some("secret".to_string()),
        _ => None,
    });
    let direct = direct(config.resolve().map_err(|err| err.to_string())?)?;
    assert_eq!(direct.server.host(), "env-host");
    Ok(())
}

#[test]
fn environment_message_server_replaces_file_application_server() -> TestResult {
    let mut config = RfcBridgeConfig::from_toml(
        "[connection]\nashost = \"file-host\"\nclient = \"001\"\nuser = \"FILE\"\npassword = \
         \"filepw\"\n",
    )
    .map_err(|err| err.to_string())?
    .connection;
    config.overlay_env(|name| (name == "SAP_MSHOST").then(|| "env-ms".to_string()));
    let direct = direct(config.resolve().map_err(|err| err.to_string())?)?;
    assert!(matches!(direct.server, ServerAddress::MessageServer { .. }));
    assert_eq!(direct.server.host(), "env-ms");
    assert_eq!(direct.user, "FILE");
    Ok(())
}

#[test]
fn application_server_defaults_system_number() -> TestResult {
    let config = overlay(&[
        ("SAP_ASHOST", "sap01"),
        ("SAP_CLIENT", "100"),
        ("SAP_USER", "ALICE"),
        ("SAP_PASSWD", "s3cret"),
    ]);
    let direct = direct(config.resolve().map_err(|err| err.to_string())?)?;
    assert_eq!(direct.server, ServerAddress::Application {
        host: "sap01".to_string(),
        system_number: "00".to_string(),
    });
    assert_eq!(direct.client, "100");
    assert_eq!(direct.password.expose(), "s3cret");
    assert!(direct.language.is_none());
    Ok(())
}

#[test]
fn message_server_mode_keeps_optional_fields() -> TestResult {
    let config = overlay(&[
        ("SAP_MSHOST", "ms01"),
        ("SAP_MSSERV", "3600"),
        ("SAP_GROUP", "PUBLIC"),
        ("SAP_CLIENT", "100"),
        ("SAP_USER", "ALICE"),
        ("SAP_PASSWD", "s3cret"),
        ("SAP_LANG", "EN"),
    ]);
    let direct = direct(config.resolve().map_err(|err| err.to_string())?)?;
    assert_eq!(direct.server, ServerAddress::MessageServer {
        host: "ms01".to_string(),
        service: Some("3600".to_string()),
        system_id: None,
        group: Some("PUBLIC".to_string()),
    });
    assert_eq!(direct.language.as_deref(), Some("EN"));
    Ok(())
}

#[test]
fn missing_credentials_are_listed_together() -> TestResult {
    let config = overlay(&[("SAP_ASHOST", "sap01"), ("SAP_USER", "ALICE")]);
    match config.resolve() {
        Err(err) => {
            let message = err.to_string();
            if message.contains("missing required env vars: SAP_CLIENT, SAP_PASSWD") {
                Ok(())
            } else {
                Err(format!("unexpected error {message}"))
            }
        }
        Ok(spec) => Err(format!("expected failure, got {spec:?}")),
    }
}

#[test]
fn empty_environment_values_count_as_unset() -> TestResult {
    let config = overlay(&[("SAP_DEST", ""), ("SAP_ASHOST", "  ")]);
    match config.resolve() {
        Err(err) if err.to_string().contains("SAP connection required") => Ok(()),
        other => Err(format!("expected connection-required error, got {other:?}")),
    }
}

#[test]
fn environment_overrides_file_values() -> TestResult {
    let mut config = RfcBridgeConfig::from_toml(
        "[connection]\nashost = \"file-host\"\nclient = \"001\"\nuser = \"FILE\"\npassword = \
         \"filepw\"\n",
    )
    .map_err(|err| err.to_string())?;
    config.connection.overlay_env(|name| match name {
        "SAP_USER" => Some("ENVUSER".to_string()),
        "SAP_CLIENT" => Some(String::new()),
        _ => None,
    });
    let direct = direct(config.connection.resolve().map_err(|err| err.to_string())?)?;
    assert_eq!(direct.server.host(), "file-host");
    assert_eq!(direct.user, "ENVUSER");
    assert_eq!(direct.client, "001");
    Ok(())
}

#[test]
fn passwords_are_redacted_in_debug_output() -> TestResult {
    let config = overlay(&[("SAP_PASSWD", "hunter2")]);
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("hunter2"));
    Ok(())
}
