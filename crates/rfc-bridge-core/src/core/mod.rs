// crates/rfc-bridge-core/src/core/mod.rs
// ============================================================================
// Module: RFC Bridge Core Types
// Description: Data model shared by the session, coercion, and decoding layers.
// Purpose: Group value, description, and connection types.
// Dependencies: crate::core::{connection, description, value}
// ============================================================================

//! ## Overview
//! Core types are plain data with no I/O. They are serializable where they
//! cross the native helper or tool boundary.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod connection;
pub mod description;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use connection::ConnectionSpec;
pub use connection::DirectConnection;
pub use connection::Secret;
pub use connection::ServerAddress;
pub use description::FieldDescription;
pub use description::InterfaceDescription;
pub use description::KindFamily;
pub use description::ParameterDescription;
pub use description::ParameterDirection;
pub use description::ParameterKind;
pub use description::TypeDescription;
pub use value::CoercedTree;
pub use value::ParameterTree;
pub use value::RfcValue;
pub use value::encode_bytes;
pub use value::format_date;
pub use value::format_time;
