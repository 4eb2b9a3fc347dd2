// crates/rfc-bridge-config/src/config.rs
// ============================================================================
// Module: RFC Bridge Configuration
// Description: Configuration loading and validation for the RFC bridge.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: rfc-bridge-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! When no path is given and the default file does not exist, defaults are
//! used so a deployment can be driven purely by `SAP_*` environment variables.
//! Security posture: config inputs are untrusted and credentials are never
//! rendered by `Debug`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rfc_bridge_core::RetryPolicy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::connection::ConnectionConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "rfc-bridge.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RFC_BRIDGE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum request body size accepted by the server.
pub(crate) const MAX_BODY_BYTES_LIMIT: usize = 16 * 1024 * 1024;
/// Maximum attempts per session call.
pub(crate) const MAX_SESSION_ATTEMPTS: u32 = 10;
/// Maximum initial backoff in milliseconds.
pub(crate) const MAX_INITIAL_BACKOFF_MS: u64 = 60_000;
/// Maximum frame size accepted from the native helper.
pub(crate) const MAX_BRIDGE_FRAME_BYTES: usize = 64 * 1024 * 1024;
/// Maximum number of helper command arguments.
pub(crate) const MAX_BRIDGE_ARGS: usize = 64;
/// Upper bound for the table-read row limit.
pub(crate) const MAX_QUERY_ROWS: u32 = 1_000_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// RFC bridge configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RfcBridgeConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Connection parameters (overlaid by `SAP_*` environment variables).
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Session retry configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Native helper process configuration.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Table query defaults and limits.
    #[serde(default)]
    pub query: QueryConfig,
}

impl RfcBridgeConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// Connection completeness is checked separately by
    /// [`ConnectionConfig::resolve`] after the environment overlay.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.session.validate()?;
        self.bridge.validate()?;
        self.query.validate()?;
        Ok(())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport type for MCP.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the HTTP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Permit binding HTTP to a non-loopback address.
    #[serde(default)]
    pub allow_non_loopback: bool,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Audit logging configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            allow_non_loopback: false,
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_BODY_BYTES_LIMIT {
            return Err(ConfigError::Invalid("max_body_bytes exceeds limit".to_string()));
        }
        self.audit.validate()?;
        if self.transport == ServerTransport::Http {
            let addr = self.bind_addr()?;
            if !addr.ip().is_loopback() && !self.allow_non_loopback {
                return Err(ConfigError::Invalid(
                    "non-loopback bind disallowed without allow_non_loopback".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parses the bind address for the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is missing or invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.bind.as_deref().unwrap_or_default().trim();
        if bind.is_empty() {
            return Err(ConfigError::Invalid("http transport requires bind address".to_string()));
        }
        bind.parse().map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }
}

/// Supported MCP transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Use stdin/stdout transport.
    #[default]
    Stdio,
    /// Use HTTP JSON-RPC transport.
    Http,
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

/// Session retry configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Attempts per call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the first retry in milliseconds; doubles per retry.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl SessionConfig {
    /// Validates retry bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 || self.max_attempts > MAX_SESSION_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "session.max_attempts must be between 1 and {MAX_SESSION_ATTEMPTS}"
            )));
        }
        if self.initial_backoff_ms == 0 || self.initial_backoff_ms > MAX_INITIAL_BACKOFF_MS {
            return Err(ConfigError::Invalid(format!(
                "session.initial_backoff_ms must be between 1 and {MAX_INITIAL_BACKOFF_MS}"
            )));
        }
        Ok(())
    }

    /// Returns the retry policy described by this section.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
        }
    }
}

/// Native helper process configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Helper command and arguments.
    #[serde(default = "default_bridge_command")]
    pub command: Vec<String>,
    /// Maximum response frame size accepted from the helper.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            command: default_bridge_command(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl BridgeConfig {
    /// Validates the helper command and frame limit.
    fn validate(&self) -> Result<(), ConfigError> {
        let Some(program) = self.command.first() else {
            return Err(ConfigError::Invalid("bridge.command must be non-empty".to_string()));
        };
        validate_path_string("bridge.command", program)?;
        if self.command.len() > MAX_BRIDGE_ARGS {
            return Err(ConfigError::Invalid("bridge.command has too many arguments".to_string()));
        }
        if self.max_frame_bytes == 0 || self.max_frame_bytes > MAX_BRIDGE_FRAME_BYTES {
            return Err(ConfigError::Invalid(format!(
                "bridge.max_frame_bytes must be between 1 and {MAX_BRIDGE_FRAME_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Table query defaults and limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Language key used when a tool call omits one.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Row limit used when a tool call omits one.
    #[serde(default = "default_max_results")]
    pub default_max_results: u32,
    /// Largest row limit a tool call may request.
    #[serde(default = "default_max_results_limit")]
    pub max_results_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            default_max_results: default_max_results(),
            max_results_limit: default_max_results_limit(),
        }
    }
}

impl QueryConfig {
    /// Validates query defaults.
    fn validate(&self) -> Result<(), ConfigError> {
        let language = self.default_language.trim();
        if language.is_empty() || language.chars().count() > 2 {
            return Err(ConfigError::Invalid(
                "query.default_language must be a 1 or 2 character language key".to_string(),
            ));
        }
        if self.max_results_limit == 0 || self.max_results_limit > MAX_QUERY_ROWS {
            return Err(ConfigError::Invalid(format!(
                "query.max_results_limit must be between 1 and {MAX_QUERY_ROWS}"
            )));
        }
        if self.default_max_results == 0 || self.default_max_results > self.max_results_limit {
            return Err(ConfigError::Invalid(
                "query.default_max_results must be between 1 and query.max_results_limit"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether it was requested explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Audit logging is on unless disabled.
const fn default_audit_enabled() -> bool {
    true
}

/// Default attempts per call.
const fn default_max_attempts() -> u32 {
    3
}

/// Default backoff before the first retry.
const fn default_initial_backoff_ms() -> u64 {
    100
}

/// Default helper command.
fn default_bridge_command() -> Vec<String> {
    vec!["rfc-bridge-helper".to_string()]
}

/// Default maximum helper frame size.
const fn default_max_frame_bytes() -> usize {
    16 * 1024 * 1024
}

/// Default language key for table queries.
fn default_language() -> String {
    "D".to_string()
}

/// Default row limit for table queries.
const fn default_max_results() -> u32 {
    100
}

/// Default upper bound for table query row limits.
const fn default_max_results_limit() -> u32 {
    10_000
}
