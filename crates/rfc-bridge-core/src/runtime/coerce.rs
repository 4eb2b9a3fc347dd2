// crates/rfc-bridge-core/src/runtime/coerce.rs
// ============================================================================
// Module: Value Coercion
// Description: Schema-driven conversion of untyped parameters.
// Purpose: Produce typed parameter trees with precise error attribution.
// Dependencies: crate::core, base64, thiserror, time
// ============================================================================

//! ## Overview
//! [`validate_parameters`] rejects names the interface does not declare.
//! [`coerce_parameters`] converts each declared value into the kind its
//! description demands, recursing through structures and tables. Names are
//! uppercased on the way through. Undeclared names are passed through
//! unchanged by coercion, so callers validate first.
//!
//! Error paths use `.` for structure fields and `[i]` for table rows, for
//! example `ITEMS[2].MATNR`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use time::Date;
use time::Time;
use time::macros::format_description;

use crate::core::CoercedTree;
use crate::core::InterfaceDescription;
use crate::core::KindFamily;
use crate::core::ParameterKind;
use crate::core::ParameterTree;
use crate::core::RfcValue;
use crate::core::TypeDescription;
use crate::core::encode_bytes;
use crate::core::format_date;
use crate::core::format_time;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Parameter validation and coercion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    /// A supplied name is not declared by the interface.
    #[error("unknown parameter \"{name}\" for function \"{operation}\"")]
    UnknownParameter {
        /// Uppercased parameter name.
        name: String,
        /// Function module name.
        operation: String,
    },
    /// Two supplied names collide after uppercasing.
    #[error("duplicate parameter \"{path}\" after case normalization")]
    DuplicateParameter {
        /// Path of the colliding name.
        path: String,
    },
    /// A value cannot be converted to its declared kind.
    #[error("parameter {path}: cannot coerce {received} to {expected}: {reason}")]
    TypeCoercion {
        /// Parameter path (`PARAM`, `PARAM.FIELD`, `PARAM[row].FIELD`).
        path: String,
        /// Declared kind.
        expected: String,
        /// Shape of the received value.
        received: &'static str,
        /// Failure detail.
        reason: String,
    },
}

/// Builds a type coercion error for a value at a path.
fn mismatch(
    path: &str,
    kind: &ParameterKind,
    value: &RfcValue,
    reason: impl Into<String>,
) -> CoercionError {
    CoercionError::TypeCoercion {
        path: path.to_string(),
        expected: kind.as_str().to_string(),
        received: value.shape(),
        reason: reason.into(),
    }
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Confirms that every supplied name is declared by the interface.
///
/// Names are checked in sorted order, so the first unknown name reported is
/// deterministic.
///
/// # Errors
///
/// Returns [`CoercionError::UnknownParameter`] for the first undeclared name
/// and [`CoercionError::DuplicateParameter`] when names collide.
pub fn validate_parameters(
    tree: &ParameterTree,
    description: &InterfaceDescription,
) -> Result<(), CoercionError> {
    for (name, _) in normalized_entries(tree, "")? {
        if description.parameter(&name).is_none() {
            return Err(CoercionError::UnknownParameter {
                name,
                operation: description.name.clone(),
            });
        }
    }
    Ok(())
}

/// Converts an untyped tree into the typed tree the interface demands.
///
/// # Errors
///
/// Returns [`CoercionError::TypeCoercion`] naming the offending path when a
/// value cannot be converted.
pub fn coerce_parameters(
    tree: &ParameterTree,
    description: &InterfaceDescription,
) -> Result<CoercedTree, CoercionError> {
    let mut coerced = CoercedTree::new();
    for (name, value) in normalized_entries(tree, "")? {
        let typed = match description.parameter(&name) {
            Some(parameter) => coerce_value(
                value,
                &parameter.kind,
                parameter.type_description.as_ref(),
                &name,
            )?,
            None => value.clone(),
        };
        coerced.insert(name, typed);
    }
    Ok(coerced)
}

/// Converts one value to a declared kind.
///
/// # Errors
///
/// Returns [`CoercionError`] when the value does not fit the kind.
pub fn coerce_value(
    value: &RfcValue,
    kind: &ParameterKind,
    layout: Option<&TypeDescription>,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    if matches!(value, RfcValue::Null) {
        return Ok(RfcValue::Null);
    }
    match kind.family() {
        KindFamily::Integer => coerce_integer(value, kind, path),
        KindFamily::Decimal => coerce_decimal(value, kind, path),
        KindFamily::Text => coerce_text(value, kind, path),
        KindFamily::Date => coerce_date(value, kind, path),
        KindFamily::Time => coerce_time(value, kind, path),
        KindFamily::Binary => coerce_binary(value, kind, path),
        KindFamily::Structure => coerce_structure(value, kind, layout, path),
        KindFamily::Table => coerce_table(value, kind, layout, path),
        KindFamily::Unknown => Ok(value.clone()),
    }
}

// ============================================================================
// SECTION: Names
// ============================================================================

/// Uppercases names, rejecting collisions.
fn normalized_entries<'a>(
    entries: &'a BTreeMap<String, RfcValue>,
    parent: &str,
) -> Result<Vec<(String, &'a RfcValue)>, CoercionError> {
    let mut normalized: BTreeMap<String, &'a RfcValue> = BTreeMap::new();
    for (name, value) in entries {
        let upper = name.to_uppercase();
        if normalized.contains_key(&upper) {
            return Err(CoercionError::DuplicateParameter {
                path: join_field(parent, &upper),
            });
        }
        normalized.insert(upper, value);
    }
    Ok(normalized.into_iter().collect())
}

/// Appends a field name to a path.
fn join_field(parent: &str, field: &str) -> String {
    if parent.is_empty() { field.to_string() } else { format!("{parent}.{field}") }
}

// ============================================================================
// SECTION: Scalars
// ============================================================================

/// Converts numbers and numeric text to a range-checked integer.
fn coerce_integer(
    value: &RfcValue,
    kind: &ParameterKind,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    let number = match value {
        RfcValue::Int(number) => *number,
        RfcValue::Float(number) => float_to_integer(*number)
            .ok_or_else(|| mismatch(path, kind, value, format!("{number} is not a whole number")))?,
        RfcValue::Text(text) => parse_integer_text(text).ok_or_else(|| {
            mismatch(path, kind, value, format!("expected integer, got \"{text}\""))
        })?,
        _ => return Err(mismatch(path, kind, value, "expected number or numeric text")),
    };
    if let Some((min, max)) = kind.integer_bounds()
        && !(min ..= max).contains(&number)
    {
        return Err(mismatch(path, kind, value, format!("{number} outside {min}..={max}")));
    }
    Ok(RfcValue::Int(number))
}

/// Parses integer text made only of ASCII digits with an optional leading `-`.
fn parse_integer_text(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Converts a whole, in-range float to an integer.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Range and fraction are checked before the cast."
)]
fn float_to_integer(number: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if number.is_finite() && number.fract() == 0.0 && (-LIMIT .. LIMIT).contains(&number) {
        Some(number as i64)
    } else {
        None
    }
}

/// Keeps numbers as floats and text verbatim for decimal kinds.
#[allow(
    clippy::cast_precision_loss,
    reason = "Integer input for float kinds accepts binary rounding."
)]
fn coerce_decimal(
    value: &RfcValue,
    kind: &ParameterKind,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    match value {
        RfcValue::Float(number) => Ok(RfcValue::Float(*number)),
        RfcValue::Int(number) => Ok(RfcValue::Float(*number as f64)),
        RfcValue::Text(text) | RfcValue::Decimal(text) => Ok(RfcValue::Decimal(text.clone())),
        _ => Err(mismatch(path, kind, value, "expected number or decimal text")),
    }
}

/// Renders scalars as character data.
fn coerce_text(
    value: &RfcValue,
    kind: &ParameterKind,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    let text = match value {
        RfcValue::Text(text) | RfcValue::Decimal(text) => text.clone(),
        RfcValue::Int(number) => number.to_string(),
        RfcValue::Float(number) => number.to_string(),
        RfcValue::Bool(flag) => flag.to_string(),
        RfcValue::Date(date) => format_date(*date),
        RfcValue::Time(time) => format_time(*time),
        RfcValue::Bytes(bytes) => encode_bytes(bytes),
        RfcValue::Null | RfcValue::Structure(_) | RfcValue::Table(_) => {
            return Err(mismatch(path, kind, value, "expected a scalar"));
        }
    };
    Ok(RfcValue::Text(text))
}

/// Parses `YYYYMMDD` text into a date.
fn coerce_date(
    value: &RfcValue,
    kind: &ParameterKind,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    match value {
        RfcValue::Date(date) => Ok(RfcValue::Date(*date)),
        RfcValue::Text(text) => {
            let format = format_description!("[year][month][day]");
            fixed_digits(text, 8)
                .then(|| Date::parse(text, format).ok())
                .flatten()
                .map(RfcValue::Date)
                .ok_or_else(|| {
                    mismatch(path, kind, value, format!("expected YYYYMMDD, got \"{text}\""))
                })
        }
        _ => Err(mismatch(path, kind, value, "expected YYYYMMDD text")),
    }
}

/// Parses `HHMMSS` text into a time.
fn coerce_time(
    value: &RfcValue,
    kind: &ParameterKind,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    match value {
        RfcValue::Time(time) => Ok(RfcValue::Time(*time)),
        RfcValue::Text(text) => {
            let format = format_description!("[hour][minute][second]");
            fixed_digits(text, 6)
                .then(|| Time::parse(text, format).ok())
                .flatten()
                .map(RfcValue::Time)
                .ok_or_else(|| {
                    mismatch(path, kind, value, format!("expected HHMMSS, got \"{text}\""))
                })
        }
        _ => Err(mismatch(path, kind, value, "expected HHMMSS text")),
    }
}

/// Returns true when text is exactly `len` ASCII digits.
fn fixed_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|byte| byte.is_ascii_digit())
}

/// Decodes base64 text into bytes.
fn coerce_binary(
    value: &RfcValue,
    kind: &ParameterKind,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    match value {
        RfcValue::Bytes(bytes) => Ok(RfcValue::Bytes(bytes.clone())),
        RfcValue::Text(text) => STANDARD
            .decode(text)
            .map(RfcValue::Bytes)
            .map_err(|err| mismatch(path, kind, value, format!("invalid base64: {err}"))),
        _ => Err(mismatch(path, kind, value, "expected base64 text")),
    }
}

// ============================================================================
// SECTION: Structures and Tables
// ============================================================================

/// Coerces a mapping field by field using the structure layout.
fn coerce_structure(
    value: &RfcValue,
    kind: &ParameterKind,
    layout: Option<&TypeDescription>,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    let RfcValue::Structure(fields) = value else {
        return Err(mismatch(path, kind, value, "expected an object"));
    };
    let mut coerced = BTreeMap::new();
    for (name, field_value) in normalized_entries(fields, path)? {
        let field_path = join_field(path, &name);
        let typed = match layout.and_then(|layout| layout.field(&name)) {
            Some(field) => coerce_value(
                field_value,
                &field.kind,
                field.type_description.as_ref(),
                &field_path,
            )?,
            None => field_value.clone(),
        };
        coerced.insert(name, typed);
    }
    Ok(RfcValue::Structure(coerced))
}

/// Coerces each row of a sequence as a structure, preserving order.
fn coerce_table(
    value: &RfcValue,
    kind: &ParameterKind,
    layout: Option<&TypeDescription>,
    path: &str,
) -> Result<RfcValue, CoercionError> {
    let RfcValue::Table(rows) = value else {
        return Err(mismatch(path, kind, value, "expected an array of rows"));
    };
    let row_kind = ParameterKind::Structure;
    let mut coerced = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let row_path = format!("{path}[{index}]");
        coerced.push(coerce_structure(row, &row_kind, layout, &row_path)?);
    }
    Ok(RfcValue::Table(coerced))
}
