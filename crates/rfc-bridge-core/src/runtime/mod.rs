// crates/rfc-bridge-core/src/runtime/mod.rs
// ============================================================================
// Module: RFC Bridge Runtime
// Description: Session management, coercion, row decoding, and metrics.
// Purpose: Group the stateful and pure runtime components.
// Dependencies: crate::runtime::{coerce, metrics, rows, session}
// ============================================================================

//! ## Overview
//! The runtime layer is synchronous. Blocking points are the session lock, the
//! backoff sleep, and the native calls themselves; async front ends run it on
//! blocking worker threads.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod coerce;
pub mod metrics;
pub mod rows;
pub mod session;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use coerce::CoercionError;
pub use coerce::coerce_parameters;
pub use coerce::coerce_value;
pub use coerce::validate_parameters;
pub use metrics::CallMetrics;
pub use metrics::MetricsSnapshot;
pub use rows::FieldSpec;
pub use rows::RowDecodeError;
pub use rows::RowRecord;
pub use rows::decode_row;
pub use rows::decode_rows;
pub use rows::field_specs;
pub use session::RetryPolicy;
pub use session::SessionManager;
pub use session::SessionState;
