// crates/rfc-bridge-config/src/lib.rs
// ============================================================================
// Module: RFC Bridge Config Library
// Description: Config model, validation, and connection resolution.
// Purpose: Single source of truth for rfc-bridge.toml semantics.
// Dependencies: rfc-bridge-core, serde, toml
// ============================================================================

//! ## Overview
//! `rfc-bridge-config` defines the configuration model for the RFC bridge.
//! It provides strict, fail-closed validation, the `SAP_*` environment
//! overlay, and resolution of connection fields into a
//! [`rfc_bridge_core::ConnectionSpec`].
//!
//! Security posture: config inputs are untrusted and passwords stay wrapped
//! in [`rfc_bridge_core::Secret`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod connection;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use connection::ConnectionConfig;
pub use connection::SAP_ENV_VARS;
pub use examples::config_toml_example;
