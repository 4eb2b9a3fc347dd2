// crates/rfc-bridge-core/src/runtime/rows.rs
// ============================================================================
// Module: Fixed-Width Row Decoding
// Description: Slice concatenated row buffers into named fields.
// Purpose: Turn table-read results into row records.
// Dependencies: crate::interfaces, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Table reads return a field table (`FIELDS`: name, offset, length as text)
//! and a row table (`DATA`) whose rows hold one concatenated buffer (`WA`).
//! Decoding is tolerant: malformed field entries are skipped, short buffers
//! yield truncated or empty values, and a missing row table means no rows.
//!
//! Offsets and lengths count characters, not bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::interfaces::ResultMap;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Result key of the field table.
pub const FIELD_TABLE: &str = "FIELDS";

/// Result key of the row table.
pub const ROW_TABLE: &str = "DATA";

/// Row key holding the concatenated buffer.
pub const ROW_BUFFER: &str = "WA";

// ============================================================================
// SECTION: Types
// ============================================================================

/// One decoded row keyed by field name.
pub type RowRecord = BTreeMap<String, String>;

/// Field position within a row buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, trimmed.
    pub name: String,
    /// Start offset in characters.
    pub offset: usize,
    /// Length in characters.
    pub length: usize,
}

/// Row decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowDecodeError {
    /// The row table is present but not a sequence.
    #[error("unexpected {table} shape: expected array, got {shape}")]
    UnexpectedShape {
        /// Result key of the offending table.
        table: &'static str,
        /// JSON shape received.
        shape: &'static str,
    },
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Parses the field table, skipping malformed entries.
#[must_use]
pub fn field_specs(result: &ResultMap) -> Vec<FieldSpec> {
    let Some(Value::Array(entries)) = result.get(FIELD_TABLE) else {
        return Vec::new();
    };
    entries.iter().filter_map(parse_field_entry).collect()
}

/// Decodes every row of a table-read result.
///
/// # Errors
///
/// Returns [`RowDecodeError::UnexpectedShape`] when the row table is present
/// but is not an array.
pub fn decode_rows(result: &ResultMap) -> Result<Vec<RowRecord>, RowDecodeError> {
    let rows = match result.get(ROW_TABLE) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(other) => {
            return Err(RowDecodeError::UnexpectedShape {
                table: ROW_TABLE,
                shape: json_shape(other),
            });
        }
    };
    let fields = field_specs(result);
    Ok(rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| row.get(ROW_BUFFER).and_then(Value::as_str).unwrap_or_default())
        .map(|buffer| decode_row(buffer, &fields))
        .collect())
}

/// Slices one buffer into a record.
#[must_use]
pub fn decode_row(buffer: &str, fields: &[FieldSpec]) -> RowRecord {
    fields
        .iter()
        .map(|field| {
            let value = char_slice(buffer, field.offset, field.length).trim().to_string();
            (field.name.clone(), value)
        })
        .collect()
}

/// Parses one field table entry.
fn parse_field_entry(entry: &Value) -> Option<FieldSpec> {
    let name = entry.get("FIELDNAME")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(FieldSpec {
        name: name.to_string(),
        offset: parse_count(entry.get("OFFSET")?)?,
        length: parse_count(entry.get("LENGTH")?)?,
    })
}

/// Parses a non-negative count from text or a JSON integer.
fn parse_count(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_u64().and_then(|count| usize::try_from(count).ok()),
        _ => None,
    }
}

/// Returns the characters in `[offset, offset + length)`, clamped to the buffer.
fn char_slice(buffer: &str, offset: usize, length: usize) -> &str {
    let byte_at = |index: usize| {
        buffer.char_indices().nth(index).map_or(buffer.len(), |(position, _)| position)
    };
    let start = byte_at(offset);
    let end = byte_at(offset.saturating_add(length));
    buffer.get(start .. end).unwrap_or_default()
}

/// Returns the JSON shape label of a value.
const fn json_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
