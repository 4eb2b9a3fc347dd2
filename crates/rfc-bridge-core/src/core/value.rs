// crates/rfc-bridge-core/src/core/value.rs
// ============================================================================
// Module: RFC Value Model
// Description: Tagged value tree exchanged with remote function modules.
// Purpose: Represent untyped caller input and typed coerced parameters.
// Dependencies: base64, serde, serde_json, time
// ============================================================================

//! ## Overview
//! [`RfcValue`] is the single value type used on both sides of coercion. Caller
//! input arrives as JSON and is lifted with [`RfcValue::from_json`], which only
//! produces the untyped variants (null, boolean, number, text, table,
//! structure). Coercion then rewrites leaves into the typed variants
//! (decimal, date, time, bytes) demanded by the interface description.
//!
//! Serialization renders the typed variants in the text encodings used by the
//! RFC layer: dates as `YYYYMMDD`, times as `HHMMSS`, bytes as standard base64.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::Serializer;
use serde_json::Map;
use serde_json::Value;
use time::Date;
use time::Time;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Caller-supplied parameter tree keyed by parameter name (any case).
pub type ParameterTree = BTreeMap<String, RfcValue>;

/// Typed parameter tree keyed by uppercased parameter name.
pub type CoercedTree = BTreeMap<String, RfcValue>;

/// Value node in a parameter or result tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RfcValue {
    /// Explicit absence of a value.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer number.
    Int(i64),
    /// Binary floating point number.
    Float(f64),
    /// Decimal number kept as text to preserve precision.
    Decimal(String),
    /// Character data.
    Text(String),
    /// Calendar date.
    Date(Date),
    /// Wall clock time.
    Time(Time),
    /// Raw byte sequence.
    Bytes(Vec<u8>),
    /// Named fields of a structure.
    Structure(BTreeMap<String, Self>),
    /// Ordered rows of a table (or any ordered sequence before coercion).
    Table(Vec<Self>),
}

// ============================================================================
// SECTION: Construction
// ============================================================================

impl RfcValue {
    /// Lifts a JSON value into the untyped subset of the value model.
    ///
    /// Integral numbers that fit in `i64` become [`RfcValue::Int`]; all other
    /// numbers become [`RfcValue::Float`].
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => number
                .as_i64()
                .map_or_else(|| Self::Float(number.as_f64().unwrap_or(f64::NAN)), Self::Int),
            Value::String(text) => Self::Text(text.clone()),
            Value::Array(items) => Self::Table(items.iter().map(Self::from_json).collect()),
            Value::Object(fields) => Self::Structure(
                fields.iter().map(|(name, value)| (name.clone(), Self::from_json(value))).collect(),
            ),
        }
    }

    /// Builds an untyped parameter tree from a JSON object.
    #[must_use]
    pub fn tree_from_json(object: &Map<String, Value>) -> ParameterTree {
        object.iter().map(|(name, value)| (name.clone(), Self::from_json(value))).collect()
    }

    /// Returns a short label describing the shape of this value.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "number",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::Bytes(_) => "bytes",
            Self::Structure(_) => "structure",
            Self::Table(_) => "table",
        }
    }
}

// ============================================================================
// SECTION: Text Encodings
// ============================================================================

/// Formats a date as `YYYYMMDD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Formats a time as `HHMMSS`.
#[must_use]
pub fn format_time(time: Time) -> String {
    format!("{:02}{:02}{:02}", time.hour(), time.minute(), time.second())
}

/// Encodes bytes as standard base64.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

impl Serialize for RfcValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Int(number) => serializer.serialize_i64(*number),
            Self::Float(number) => serializer.serialize_f64(*number),
            Self::Decimal(text) | Self::Text(text) => serializer.serialize_str(text),
            Self::Date(date) => serializer.serialize_str(&format_date(*date)),
            Self::Time(time) => serializer.serialize_str(&format_time(*time)),
            Self::Bytes(bytes) => serializer.serialize_str(&encode_bytes(bytes)),
            Self::Structure(fields) => serializer.collect_map(fields),
            Self::Table(rows) => serializer.collect_seq(rows),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
