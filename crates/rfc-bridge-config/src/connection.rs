// crates/rfc-bridge-config/src/connection.rs
// ============================================================================
// Module: Connection Configuration
// Description: File connection fields, SAP_* overlay, and spec resolution.
// Purpose: Turn file, environment, and CLI inputs into one ConnectionSpec.
// Dependencies: rfc-bridge-core, serde
// ============================================================================

//! ## Overview
//! Connection settings come from three layers: the `[connection]` table, the
//! `SAP_*` environment variables, and a destination passed on the command
//! line. The environment overrides the file field by field, except that an
//! environment-selected mode replaces the file's mode: `SAP_ASHOST` or
//! `SAP_MSHOST` discards a file destination, and `SAP_MSHOST` alone discards
//! a file application server. A command-line destination overrides the file
//! and any direct mode but never `SAP_DEST`. Empty values count as unset at
//! every layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;

use rfc_bridge_core::ConnectionSpec;
use rfc_bridge_core::DirectConnection;
use rfc_bridge_core::Secret;
use rfc_bridge_core::ServerAddress;
use serde::Deserialize;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// System number used when application-server mode omits one.
const DEFAULT_SYSTEM_NUMBER: &str = "00";

/// Message returned when no connection mode is configured.
const CONNECTION_REQUIRED: &str = "SAP connection required: set SAP_DEST (or pass as argument) \
                                   for ini-based connections, or set SAP_ASHOST + SAP_CLIENT + \
                                   SAP_USER + SAP_PASSWD (or SAP_MSHOST for load-balancing) for \
                                   direct connections";

/// Environment variable names in overlay order.
pub const SAP_ENV_VARS: [&str; 11] = [
    "SAP_DEST",
    "SAP_ASHOST",
    "SAP_SYSNR",
    "SAP_MSHOST",
    "SAP_MSSERV",
    "SAP_SYSID",
    "SAP_GROUP",
    "SAP_CLIENT",
    "SAP_USER",
    "SAP_PASSWD",
    "SAP_LANG",
];

// ============================================================================
// SECTION: Types
// ============================================================================

/// Connection fields before resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Named destination (`SAP_DEST`).
    #[serde(default)]
    pub destination: Option<String>,
    /// Application server host (`SAP_ASHOST`).
    #[serde(default)]
    pub ashost: Option<String>,
    /// System number (`SAP_SYSNR`).
    #[serde(default)]
    pub sysnr: Option<String>,
    /// Message server host (`SAP_MSHOST`).
    #[serde(default)]
    pub mshost: Option<String>,
    /// Message server service (`SAP_MSSERV`).
    #[serde(default)]
    pub msserv: Option<String>,
    /// System identifier (`SAP_SYSID`).
    #[serde(default)]
    pub sysid: Option<String>,
    /// Logon group (`SAP_GROUP`).
    #[serde(default)]
    pub group: Option<String>,
    /// Client (`SAP_CLIENT`).
    #[serde(default)]
    pub client: Option<String>,
    /// Logon user (`SAP_USER`).
    #[serde(default)]
    pub user: Option<String>,
    /// Logon password (`SAP_PASSWD`).
    #[serde(default)]
    pub password: Option<Secret>,
    /// Logon language (`SAP_LANG`).
    #[serde(default)]
    pub lang: Option<String>,
    /// Set when `SAP_DEST` supplied the destination.
    #[serde(skip)]
    destination_from_env: bool,
}

// ============================================================================
// SECTION: Overlay
// ============================================================================

impl ConnectionConfig {
    /// Overlays `SAP_*` values read through `lookup`; empty values are ignored.
    pub fn overlay_env<F>(&mut self, mut lookup: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut env_ashost = false;
        let mut env_mshost = false;
        for name in SAP_ENV_VARS {
            let Some(value) = lookup(name).filter(|value| !value.trim().is_empty()) else {
                continue;
            };
            match name {
                "SAP_DEST" => {
                    self.destination = Some(value);
                    self.destination_from_env = true;
                }
                "SAP_ASHOST" => {
                    self.ashost = Some(value);
                    env_ashost = true;
                }
                "SAP_MSHOST" => {
                    self.mshost = Some(value);
                    env_mshost = true;
                }
                "SAP_SYSNR" => self.sysnr = Some(value),
                "SAP_MSSERV" => self.msserv = Some(value),
                "SAP_SYSID" => self.sysid = Some(value),
                "SAP_GROUP" => self.group = Some(value),
                "SAP_CLIENT" => self.client = Some(value),
                "SAP_USER" => self.user = Some(value),
                "SAP_PASSWD" => self.password = Some(Secret::new(value)),
                _ => self.lang = Some(value),
            }
        }
        if !self.destination_from_env && (env_ashost || env_mshost) {
            self.destination = None;
        }
        if env_mshost && !env_ashost {
            self.ashost = None;
        }
    }

    /// Overlays `SAP_*` values from the process environment.
    pub fn overlay_process_env(&mut self) {
        self.overlay_env(|name| env::var(name).ok());
    }

    /// Applies a destination given on the command line.
    ///
    /// A destination taken from `SAP_DEST` is kept.
    pub fn override_destination(&mut self, destination: Option<&str>) {
        if self.destination_from_env {
            return;
        }
        if let Some(destination) = present(destination) {
            self.destination = Some(destination.to_string());
        }
    }

    /// Resolves the layered fields into a connection spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when no mode is configured or a
    /// direct mode lacks credentials.
    pub fn resolve(&self) -> Result<ConnectionSpec, ConfigError> {
        if let Some(destination) = present(self.destination.as_deref()) {
            return Ok(ConnectionSpec::Destination(destination.to_string()));
        }
        let server = if let Some(host) = present(self.ashost.as_deref()) {
            ServerAddress::Application {
                host: host.to_string(),
                system_number: present(self.sysnr.as_deref())
                    .unwrap_or(DEFAULT_SYSTEM_NUMBER)
                    .to_string(),
            }
        } else if let Some(host) = present(self.mshost.as_deref()) {
            ServerAddress::MessageServer {
                host: host.to_string(),
                service: owned(self.msserv.as_deref()),
                system_id: owned(self.sysid.as_deref()),
                group: owned(self.group.as_deref()),
            }
        } else {
            return Err(ConfigError::Invalid(CONNECTION_REQUIRED.to_string()));
        };

        let client = present(self.client.as_deref());
        let user = present(self.user.as_deref());
        let password = self.password.as_ref().filter(|secret| !secret.expose().trim().is_empty());
        let mut missing = Vec::new();
        if client.is_none() {
            missing.push("SAP_CLIENT");
        }
        if user.is_none() {
            missing.push("SAP_USER");
        }
        if password.is_none() {
            missing.push("SAP_PASSWD");
        }
        let (Some(client), Some(user), Some(password)) = (client, user, password) else {
            return Err(ConfigError::Invalid(format!(
                "missing required env vars: {}",
                missing.join(", ")
            )));
        };

        Ok(ConnectionSpec::Direct(DirectConnection {
            server,
            client: client.to_string(),
            user: user.to_string(),
            password: password.clone(),
            language: owned(self.lang.as_deref()),
        }))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the trimmed value when it is non-empty.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Owned variant of [`present`].
fn owned(value: Option<&str>) -> Option<String> {
    present(value).map(str::to_string)
}
