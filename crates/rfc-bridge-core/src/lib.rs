// crates/rfc-bridge-core/src/lib.rs
// ============================================================================
// Module: RFC Bridge Core Library
// Description: Public API surface for the RFC bridge core.
// Purpose: Expose value types, session interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! RFC bridge core exposes a remote function-module backend, reachable only
//! through a single non-reentrant native session, to many concurrent callers.
//! It serializes and retries session access, coerces loosely typed parameters
//! against interface descriptions, decodes fixed-width table rows, and keeps
//! call metrics. Transport and tool dispatch live in other crates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::COMMUNICATION_FAILURE;
pub use interfaces::CONNECTION_FAULT_SIGNATURES;
pub use interfaces::ConnectionAttributes;
pub use interfaces::INVALID_HANDLE;
pub use interfaces::NativeSession;
pub use interfaces::NoopSessionDiagnostics;
pub use interfaces::ResultMap;
pub use interfaces::RfcClient;
pub use interfaces::RfcErrorInfo;
pub use interfaces::SessionConnector;
pub use interfaces::SessionDiagnostics;
pub use interfaces::SessionError;
pub use interfaces::SessionEvent;
pub use interfaces::SessionEventKind;
pub use runtime::CallMetrics;
pub use runtime::CoercionError;
pub use runtime::FieldSpec;
pub use runtime::MetricsSnapshot;
pub use runtime::RetryPolicy;
pub use runtime::RowDecodeError;
pub use runtime::RowRecord;
pub use runtime::SessionManager;
pub use runtime::SessionState;
pub use runtime::coerce_parameters;
pub use runtime::coerce_value;
pub use runtime::decode_row;
pub use runtime::decode_rows;
pub use runtime::field_specs;
pub use runtime::validate_parameters;
