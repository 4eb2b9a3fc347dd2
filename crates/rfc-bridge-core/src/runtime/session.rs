// crates/rfc-bridge-core/src/runtime/session.rs
// ============================================================================
// Module: Session Manager
// Description: Serialized, retrying access to one native session handle.
// Purpose: Hide transient connection faults behind a bounded retry budget.
// Dependencies: crate::core, crate::interfaces, tokio-util
// ============================================================================

//! ## Overview
//! [`SessionManager`] owns the only live native handle. Every operation holds
//! the session lock for its whole duration, reconnects included, so the handle
//! never sees two calls at once.
//!
//! Retry rules for one call:
//! - attempt 1 runs on the current handle
//! - before each later attempt, the previous error must be connection-class;
//!   otherwise it is returned unretried
//! - a retry sleeps for the backoff (doubling each time), drops the old handle
//!   and connects afresh; a failed connect becomes the last error
//! - cancellation is checked before each attempt
//!
//! Security posture: the connection spec is reused verbatim and never logged
//! beyond its redacted summary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::CoercedTree;
use crate::core::ConnectionSpec;
use crate::core::InterfaceDescription;
use crate::interfaces::ConnectionAttributes;
use crate::interfaces::NativeSession;
use crate::interfaces::ResultMap;
use crate::interfaces::RfcClient;
use crate::interfaces::SessionConnector;
use crate::interfaces::SessionDiagnostics;
use crate::interfaces::SessionError;
use crate::interfaces::SessionEvent;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff before the first retry.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(100);

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Retry budget for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles for each later retry.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Returns the backoff slept before the given 1-based attempt.
    #[must_use]
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(2).min(16);
        self.initial_backoff.saturating_mul(1_u32 << doublings)
    }
}

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Lifecycle state of the logical session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No live handle.
    Disconnected,
    /// Initial connect in progress.
    Connecting,
    /// Live handle available.
    Ready,
    /// Reconnect in progress within a call.
    Reconnecting,
    /// The last call exhausted its attempts.
    Failed,
}

/// Lock-protected session slot.
struct SessionSlot<S> {
    /// Live handle, absent after a failed reconnect.
    session: Option<S>,
    /// Current lifecycle state.
    state: SessionState,
}

impl<S> SessionSlot<S> {
    /// Sets the resting state after a call returns early.
    fn settle(&mut self) {
        self.state = if self.session.is_some() {
            SessionState::Ready
        } else {
            SessionState::Disconnected
        };
    }
}

// ============================================================================
// SECTION: Session Manager
// ============================================================================

/// Serialized, retrying owner of one native session.
///
/// # Invariants
/// - At most one live native handle exists at a time.
/// - The handle is only touched while the session lock is held.
pub struct SessionManager<C: SessionConnector> {
    /// Connector used for the initial connect and every reconnect.
    connector: C,
    /// Immutable connection parameters.
    spec: ConnectionSpec,
    /// Retry budget per call.
    policy: RetryPolicy,
    /// Session slot guarded for the full duration of each call.
    slot: Mutex<SessionSlot<C::Session>>,
    /// Diagnostics sink for reconnect activity.
    diagnostics: Arc<dyn SessionDiagnostics>,
}

impl<C: SessionConnector> SessionManager<C> {
    /// Connects and returns a ready manager.
    ///
    /// # Errors
    ///
    /// Returns the connector error when the first connect fails.
    pub fn connect(
        connector: C,
        spec: ConnectionSpec,
        policy: RetryPolicy,
        diagnostics: Arc<dyn SessionDiagnostics>,
    ) -> Result<Self, SessionError> {
        let mut slot = SessionSlot {
            session: None,
            state: SessionState::Connecting,
        };
        slot.session = Some(connector.connect(&spec)?);
        slot.state = SessionState::Ready;
        diagnostics.record_session(&SessionEvent::connected(&spec.summary()));
        Ok(Self {
            connector,
            spec,
            policy,
            slot: Mutex::new(slot),
            diagnostics,
        })
    }

    /// Returns the connection spec used for reconnects.
    #[must_use]
    pub const fn spec(&self) -> &ConnectionSpec {
        &self.spec
    }

    /// Returns the current lifecycle state, waiting for any call in flight.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LockPoisoned`] when the lock is poisoned.
    pub fn state(&self) -> Result<SessionState, SessionError> {
        Ok(self.lock()?.state)
    }

    /// Runs a unit of work against the live session with reconnect and retry.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last error once the
    /// attempt budget is spent.
    pub fn with_session<T, F>(
        &self,
        operation: &str,
        cancel: &CancellationToken,
        mut work: F,
    ) -> Result<T, SessionError>
    where
        F: FnMut(&mut C::Session) -> Result<T, SessionError>,
    {
        let mut slot = self.lock()?;
        let mut last_error: Option<SessionError> = None;
        for attempt in 1 ..= self.policy.max_attempts {
            if cancel.is_cancelled() {
                slot.settle();
                return Err(last_error.unwrap_or(SessionError::Canceled));
            }
            if let Some(previous) = last_error.take() {
                if !previous.is_connection_class() {
                    slot.settle();
                    return Err(previous);
                }
                if let Err(error) = self.reconnect(&mut slot, operation, attempt, &previous) {
                    last_error = Some(error);
                    continue;
                }
            }
            let outcome = match slot.session.as_mut() {
                Some(session) => work(session),
                None => Err(SessionError::not_connected()),
            };
            match outcome {
                Ok(value) => {
                    slot.state = SessionState::Ready;
                    return Ok(value);
                }
                Err(error) => last_error = Some(error),
            }
        }
        let error = last_error.unwrap_or_else(SessionError::not_connected);
        if error.is_connection_class() {
            slot.state = SessionState::Failed;
            self.diagnostics.record_session(&SessionEvent::retries_exhausted(
                operation,
                self.policy.max_attempts,
                &error,
            ));
        } else {
            slot.settle();
        }
        Err(error)
    }

    /// Sleeps for the backoff and replaces the handle with a fresh session.
    fn reconnect(
        &self,
        slot: &mut SessionSlot<C::Session>,
        operation: &str,
        attempt: u32,
        cause: &SessionError,
    ) -> Result<(), SessionError> {
        let backoff = self.policy.backoff_before(attempt);
        let event = SessionEvent::reconnect(operation, attempt, backoff, cause);
        self.diagnostics.record_session(&event);
        slot.state = SessionState::Reconnecting;
        thread::sleep(backoff);
        slot.session = None;
        match self.connector.connect(&self.spec) {
            Ok(session) => {
                slot.session = Some(session);
                Ok(())
            }
            Err(error) => {
                self.diagnostics.record_session(&SessionEvent::reconnect_failed(
                    operation, attempt, &error,
                ));
                Err(error)
            }
        }
    }

    /// Acquires the session lock.
    fn lock(&self) -> Result<MutexGuard<'_, SessionSlot<C::Session>>, SessionError> {
        self.slot.lock().map_err(|_| SessionError::LockPoisoned)
    }
}

impl<C: SessionConnector> RfcClient for SessionManager<C> {
    fn ping(&self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.with_session("ping", cancel, NativeSession::ping)
    }

    fn connection_attributes(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ConnectionAttributes, SessionError> {
        self.with_session("connection_attributes", cancel, |session| {
            Ok(ConnectionAttributes {
                connection: session.attributes()?,
                sdk_version: session.library_version(),
            })
        })
    }

    fn describe(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<InterfaceDescription, SessionError> {
        self.with_session("describe", cancel, |session| session.describe(name))
    }

    fn invoke(
        &self,
        name: &str,
        parameters: &CoercedTree,
        cancel: &CancellationToken,
    ) -> Result<ResultMap, SessionError> {
        self.with_session("invoke", cancel, |session| session.invoke(name, parameters))
    }
}
