// crates/rfc-bridge-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic sample for operators and tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `rfc-bridge.toml`. The sample parses under
//! [`crate::RfcBridgeConfig::from_toml`]; credentials are left to the
//! `SAP_*` environment overlay.

/// Returns a canonical example `rfc-bridge.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
transport = "stdio"
max_body_bytes = 1048576
# bind = "127.0.0.1:8080"

[server.audit]
enabled = true
# path = "rfc-bridge-audit.jsonl"

[connection]
# destination = "NPL"
ashost = "sap.example.internal"
sysnr = "00"
client = "001"
user = "RFC_USER"
lang = "EN"
# password is read from SAP_PASSWD

[session]
max_attempts = 3
initial_backoff_ms = 100

[bridge]
command = ["rfc-bridge-helper"]
max_frame_bytes = 16777216

[query]
default_language = "D"
default_max_results = 100
max_results_limit = 10000
"#,
    )
}
