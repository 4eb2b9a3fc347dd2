// crates/rfc-bridge-core/src/interfaces/mod.rs
// ============================================================================
// Module: RFC Bridge Interfaces
// Description: Capability traits for native sessions and diagnostics.
// Purpose: Define the seams between the session manager and its collaborators.
// Dependencies: crate::core, serde, thiserror, tokio-util
// ============================================================================

//! ## Overview
//! The core never talks to the native RFC library directly. It consumes a
//! [`SessionConnector`] that produces [`NativeSession`] handles, and reports
//! reconnect activity through [`SessionDiagnostics`]. Callers above the core
//! see the retrying surface as [`RfcClient`].
//!
//! Errors are classified by their structured signature: connection-class
//! faults (communication failure, invalid handle, handle mismatch) are
//! retryable, every other remote fault is a business fault and is surfaced
//! unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::core::CoercedTree;
use crate::core::ConnectionSpec;
use crate::core::InterfaceDescription;

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Signatures marking a transport-level fault.
pub const CONNECTION_FAULT_SIGNATURES: [&str; 3] =
    ["RFC_COMMUNICATION_FAILURE", "RFC_INVALID_HANDLE", "HANDLE_MISMATCH"];

/// Error code used when the transport to the native library breaks.
pub const COMMUNICATION_FAILURE: &str = "RFC_COMMUNICATION_FAILURE";

/// Error code used when no live handle is available.
pub const INVALID_HANDLE: &str = "RFC_INVALID_HANDLE";

/// Structured error signature reported by the native library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfcErrorInfo {
    /// Error code (for example `RFC_ABAP_EXCEPTION`).
    pub code: String,
    /// Error group reported by the library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Exception key for business faults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

impl RfcErrorInfo {
    /// Creates an error signature with a code and message.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            group: None,
            key: None,
            message: message.into(),
        }
    }

    /// Creates a communication failure signature.
    #[must_use]
    pub fn communication_failure(message: impl Into<String>) -> Self {
        Self::new(COMMUNICATION_FAILURE, message)
    }

    /// Returns true when the signature marks a transport-level fault.
    #[must_use]
    pub fn is_connection_class(&self) -> bool {
        CONNECTION_FAULT_SIGNATURES
            .iter()
            .any(|signature| self.code.contains(signature) || self.message.contains(signature))
    }
}

impl fmt::Display for RfcErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(key) = &self.key {
            write!(f, " ({key})")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Session-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Establishing a session failed.
    #[error("connect failed: {0}")]
    Connect(RfcErrorInfo),
    /// Transport-level fault on a live session.
    #[error("connection fault: {0}")]
    ConnectionFault(RfcErrorInfo),
    /// Fault reported by remote business logic.
    #[error("remote fault: {0}")]
    BusinessFault(RfcErrorInfo),
    /// The caller canceled the call before any attempt ran.
    #[error("call canceled")]
    Canceled,
    /// A previous call panicked while holding the session lock.
    #[error("session lock poisoned")]
    LockPoisoned,
}

impl SessionError {
    /// Classifies a fault reported on a live session.
    #[must_use]
    pub fn remote(info: RfcErrorInfo) -> Self {
        if info.is_connection_class() {
            Self::ConnectionFault(info)
        } else {
            Self::BusinessFault(info)
        }
    }

    /// Builds the fault raised when no live handle exists.
    #[must_use]
    pub fn not_connected() -> Self {
        Self::ConnectionFault(RfcErrorInfo::new(INVALID_HANDLE, "no live session handle"))
    }

    /// Returns true when a reconnect may clear this error.
    #[must_use]
    pub fn is_connection_class(&self) -> bool {
        match self {
            Self::ConnectionFault(_) => true,
            Self::Connect(info) => info.is_connection_class(),
            Self::BusinessFault(_) | Self::Canceled | Self::LockPoisoned => false,
        }
    }

    /// Returns the structured signature when one is attached.
    #[must_use]
    pub const fn info(&self) -> Option<&RfcErrorInfo> {
        match self {
            Self::Connect(info) | Self::ConnectionFault(info) | Self::BusinessFault(info) => {
                Some(info)
            }
            Self::Canceled | Self::LockPoisoned => None,
        }
    }

    /// Returns a stable label for audit logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect_error",
            Self::ConnectionFault(_) => "connection_fault",
            Self::BusinessFault(_) => "business_fault",
            Self::Canceled => "canceled",
            Self::LockPoisoned => "lock_poisoned",
        }
    }
}

// ============================================================================
// SECTION: Native Session
// ============================================================================

/// Result map returned by a remote function module.
pub type ResultMap = Map<String, Value>;

/// Connection attributes reported by a live session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionAttributes {
    /// Attribute map (system id, client, host, user, ...).
    pub connection: BTreeMap<String, String>,
    /// Native library version when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_version: Option<String>,
}

/// Single-threaded native session handle.
///
/// # Invariants
/// - Callers never invoke two methods concurrently on one handle.
pub trait NativeSession: Send {
    /// Checks that the remote system is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the remote call fails.
    fn ping(&mut self) -> Result<(), SessionError>;

    /// Returns connection attributes.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the remote call fails.
    fn attributes(&mut self) -> Result<BTreeMap<String, String>, SessionError>;

    /// Fetches the interface description of a function module.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the remote call fails.
    fn describe(&mut self, name: &str) -> Result<InterfaceDescription, SessionError>;

    /// Invokes a function module with typed parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the remote call fails.
    fn invoke(&mut self, name: &str, parameters: &CoercedTree) -> Result<ResultMap, SessionError>;

    /// Returns the native library version when known.
    fn library_version(&self) -> Option<String> {
        None
    }
}

/// Factory for native sessions.
pub trait SessionConnector: Send + Sync {
    /// Session handle type produced by this connector.
    type Session: NativeSession;

    /// Establishes a new session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connect`] when the session cannot be established.
    fn connect(&self, spec: &ConnectionSpec) -> Result<Self::Session, SessionError>;
}

// ============================================================================
// SECTION: Client Surface
// ============================================================================

/// Retrying, serialized access to the remote system.
pub trait RfcClient: Send + Sync {
    /// Checks that the remote system is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when every attempt fails.
    fn ping(&self, cancel: &CancellationToken) -> Result<(), SessionError>;

    /// Returns connection attributes and the native library version.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when every attempt fails.
    fn connection_attributes(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConnectionAttributes, SessionError>;

    /// Fetches the interface description of a function module.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when every attempt fails.
    fn describe(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<InterfaceDescription, SessionError>;

    /// Invokes a function module with typed parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when every attempt fails.
    fn invoke(
        &self,
        name: &str,
        parameters: &CoercedTree,
        cancel: &CancellationToken,
    ) -> Result<ResultMap, SessionError>;
}

// ============================================================================
// SECTION: Diagnostics
// ============================================================================

/// Session lifecycle event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    /// Initial connect succeeded.
    Connected,
    /// A reconnect attempt is about to run.
    Reconnect,
    /// A reconnect attempt failed.
    ReconnectFailed,
    /// All attempts for one call failed.
    RetriesExhausted,
}

/// Diagnostic event emitted by the session manager.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event kind.
    pub kind: SessionEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Operation that triggered the event.
    pub operation: Option<String>,
    /// Attempt number (1-based) when applicable.
    pub attempt: Option<u32>,
    /// Backoff slept before the attempt.
    pub backoff_ms: Option<u128>,
    /// Error that triggered the event.
    pub error: Option<String>,
    /// Free-text diagnostic line.
    pub message: String,
}

impl SessionEvent {
    /// Builds an event with a consistent timestamp.
    fn new(kind: SessionEventKind, message: String) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "rfc_session",
            kind,
            timestamp_ms,
            operation: None,
            attempt: None,
            backoff_ms: None,
            error: None,
            message,
        }
    }

    /// Initial connect succeeded.
    #[must_use]
    pub fn connected(target: &str) -> Self {
        Self::new(SessionEventKind::Connected, format!("connected to {target}"))
    }

    /// Reconnect attempt about to run after a backoff.
    #[must_use]
    pub fn reconnect(
        operation: &str,
        attempt: u32,
        backoff: Duration,
        cause: &SessionError,
    ) -> Self {
        let backoff_ms = backoff.as_millis();
        let mut event = Self::new(
            SessionEventKind::Reconnect,
            format!("reconnect attempt {attempt} (backoff {backoff_ms}ms)"),
        );
        event.operation = Some(operation.to_string());
        event.attempt = Some(attempt);
        event.backoff_ms = Some(backoff_ms);
        event.error = Some(cause.to_string());
        event
    }

    /// Reconnect attempt failed.
    #[must_use]
    pub fn reconnect_failed(operation: &str, attempt: u32, error: &SessionError) -> Self {
        let mut event = Self::new(
            SessionEventKind::ReconnectFailed,
            format!("reconnect attempt {attempt} failed: {error}"),
        );
        event.operation = Some(operation.to_string());
        event.attempt = Some(attempt);
        event.error = Some(error.to_string());
        event
    }

    /// All attempts failed.
    #[must_use]
    pub fn retries_exhausted(operation: &str, attempts: u32, error: &SessionError) -> Self {
        let mut event = Self::new(
            SessionEventKind::RetriesExhausted,
            format!("{operation} failed after {attempts} attempts: {error}"),
        );
        event.operation = Some(operation.to_string());
        event.attempt = Some(attempts);
        event.error = Some(error.to_string());
        event
    }
}

/// Sink for session diagnostics.
pub trait SessionDiagnostics: Send + Sync {
    /// Records a session event.
    fn record_session(&self, event: &SessionEvent);
}

/// Diagnostics sink that drops every event.
pub struct NoopSessionDiagnostics;

impl SessionDiagnostics for NoopSessionDiagnostics {
    fn record_session(&self, _event: &SessionEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
