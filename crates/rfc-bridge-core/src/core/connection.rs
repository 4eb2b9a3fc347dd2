// crates/rfc-bridge-core/src/core/connection.rs
// ============================================================================
// Module: Connection Specification
// Description: Immutable parameters used to (re)establish a session.
// Purpose: Describe destination and direct logon modes without leaking secrets.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ConnectionSpec`] is resolved once at startup and reused verbatim for
//! every reconnect. It renders to the flat lowercase parameter map understood
//! by the native RFC library (`dest`, `ashost`, `sysnr`, `client`, ...).
//!
//! Security posture: passwords are wrapped in [`Secret`], whose `Debug` output
//! is redacted so specs can be logged safely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Secret
// ============================================================================

/// Credential string with redacted debug output.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wraps a credential value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the raw credential value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when no credential is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ============================================================================
// SECTION: Connection Spec
// ============================================================================

/// Parameters for establishing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSpec {
    /// Named destination resolved by the native library configuration.
    Destination(String),
    /// Explicit host and credential fields.
    Direct(DirectConnection),
}

/// Direct logon parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectConnection {
    /// Server address.
    pub server: ServerAddress,
    /// Client (mandant).
    pub client: String,
    /// Logon user.
    pub user: String,
    /// Logon password.
    pub password: Secret,
    /// Logon language.
    pub language: Option<String>,
}

/// Server address for direct logon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerAddress {
    /// Specific application server.
    Application {
        /// Application server host.
        host: String,
        /// System number.
        system_number: String,
    },
    /// Load-balanced logon through a message server.
    MessageServer {
        /// Message server host.
        host: String,
        /// Message server service or port.
        service: Option<String>,
        /// System identifier.
        system_id: Option<String>,
        /// Logon group.
        group: Option<String>,
    },
}

impl ServerAddress {
    /// Returns the host name used for logging.
    #[must_use]
    pub fn host(&self) -> &str {
        match self {
            Self::Application {
                host, ..
            }
            | Self::MessageServer {
                host, ..
            } => host,
        }
    }
}

impl ConnectionSpec {
    /// Renders the flat parameter map passed to the native library.
    #[must_use]
    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut parameters = BTreeMap::new();
        match self {
            Self::Destination(name) => {
                parameters.insert("dest".to_string(), name.clone());
            }
            Self::Direct(direct) => {
                match &direct.server {
                    ServerAddress::Application {
                        host,
                        system_number,
                    } => {
                        parameters.insert("ashost".to_string(), host.clone());
                        parameters.insert("sysnr".to_string(), system_number.clone());
                    }
                    ServerAddress::MessageServer {
                        host,
                        service,
                        system_id,
                        group,
                    } => {
                        parameters.insert("mshost".to_string(), host.clone());
                        insert_optional(&mut parameters, "msserv", service.as_ref());
                        insert_optional(&mut parameters, "sysid", system_id.as_ref());
                        insert_optional(&mut parameters, "group", group.as_ref());
                    }
                }
                parameters.insert("client".to_string(), direct.client.clone());
                parameters.insert("user".to_string(), direct.user.clone());
                parameters.insert("passwd".to_string(), direct.password.expose().to_string());
                insert_optional(&mut parameters, "lang", direct.language.as_ref());
            }
        }
        parameters
    }

    /// Returns a log-safe one-line summary of the target.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Destination(name) => format!("destination \"{name}\""),
            Self::Direct(direct) => format!(
                "host={}, client={}, user={}",
                direct.server.host(),
                direct.client,
                direct.user
            ),
        }
    }
}

/// Inserts a parameter when a value is present.
fn insert_optional(parameters: &mut BTreeMap<String, String>, key: &str, value: Option<&String>) {
    if let Some(value) = value {
        parameters.insert(key.to_string(), value.clone());
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
