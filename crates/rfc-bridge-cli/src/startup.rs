// crates/rfc-bridge-cli/src/startup.rs
// ============================================================================
// Module: Startup Settings
// Description: Layered settings resolution and operator-facing summaries.
// Purpose: Share resolution between `serve` and `config check`.
// Dependencies: rfc-bridge-config, rfc-bridge-core
// ============================================================================

//! ## Overview
//! [`load_settings`] applies the configuration file, then the `SAP_*`
//! environment, then a destination given on the command line (ignored when
//! `SAP_DEST` is set), and resolves the result into a [`ConnectionSpec`].
//! The rendering helpers never include the password.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use rfc_bridge_config::ConfigError;
use rfc_bridge_config::RfcBridgeConfig;
use rfc_bridge_config::ServerTransport;
use rfc_bridge_core::ConnectionSpec;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Loads configuration and resolves the connection target.
///
/// `lookup` reads environment variables; the binary passes the process
/// environment and tests pass a fixed map.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file cannot be loaded or the connection
/// settings are incomplete.
pub fn load_settings<F>(
    path: Option<&Path>,
    destination: Option<&str>,
    lookup: F,
) -> Result<(RfcBridgeConfig, ConnectionSpec), ConfigError>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = RfcBridgeConfig::load(path)?;
    config.connection.overlay_env(lookup);
    config.connection.override_destination(destination);
    let spec = config.connection.resolve()?;
    Ok((config, spec))
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Returns the transport label used in startup lines.
#[must_use]
pub const fn transport_label(transport: ServerTransport) -> &'static str {
    match transport {
        ServerTransport::Stdio => "stdio",
        ServerTransport::Http => "http",
    }
}

/// Returns the line logged before the initial connect.
#[must_use]
pub fn connecting_line(spec: &ConnectionSpec) -> String {
    match spec {
        ConnectionSpec::Destination(name) => format!("connecting to SAP destination \"{name}\""),
        ConnectionSpec::Direct(_) => format!("connecting directly to SAP ({})", spec.summary()),
    }
}

/// Returns the line logged once the server begins serving.
#[must_use]
pub fn starting_line(config: &RfcBridgeConfig) -> String {
    match (config.server.transport, config.server.bind.as_deref()) {
        (ServerTransport::Http, Some(bind)) => format!("MCP server starting (http on {bind})"),
        (transport, _) => format!("MCP server starting ({})", transport_label(transport)),
    }
}

/// Renders the `config check` report.
#[must_use]
pub fn config_summary(config: &RfcBridgeConfig, spec: &ConnectionSpec) -> Vec<String> {
    let audit = if !config.server.audit.enabled {
        "disabled".to_string()
    } else if let Some(path) = &config.server.audit.path {
        format!("file {path}")
    } else {
        "stderr".to_string()
    };
    vec![
        "config ok".to_string(),
        format!("target: {}", spec.summary()),
        format!("transport: {}", transport_label(config.server.transport)),
        format!(
            "session: max_attempts={}, initial_backoff_ms={}",
            config.session.max_attempts, config.session.initial_backoff_ms
        ),
        format!("bridge: {}", config.bridge.command.join(" ")),
        format!(
            "query: language={}, max_results={}, limit={}",
            config.query.default_language,
            config.query.default_max_results,
            config.query.max_results_limit
        ),
        format!("audit: {audit}"),
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================
