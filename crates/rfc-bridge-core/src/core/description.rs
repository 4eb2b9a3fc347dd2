// crates/rfc-bridge-core/src/core/description.rs
// ============================================================================
// Module: Interface Descriptions
// Description: Parameter metadata for remote function modules.
// Purpose: Drive validation and coercion from the declared interface.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`InterfaceDescription`] is fetched from the remote system for every call
//! and treated as authoritative. Parameter and field names are stored in
//! uppercase; lookups expect callers to normalize first.
//!
//! Kinds use the `RFCTYPE_*` wire names. Kinds this crate does not recognize
//! are preserved in [`ParameterKind::Other`] so newer remote systems keep
//! working with passthrough semantics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Parameter Kinds
// ============================================================================

/// Declared primitive kind of a parameter or structure field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParameterKind {
    /// 4-byte signed integer.
    Int,
    /// 1-byte unsigned integer.
    Int1,
    /// 2-byte signed integer.
    Int2,
    /// 8-byte signed integer.
    Int8,
    /// Binary floating point.
    Float,
    /// Packed decimal.
    Bcd,
    /// Decimal floating point with 16 digits.
    Decf16,
    /// Decimal floating point with 34 digits.
    Decf34,
    /// Fixed-length character field.
    Char,
    /// Variable-length string.
    String,
    /// Numeric character field.
    Num,
    /// UTC timestamp in long form.
    UtcLong,
    /// Calendar date.
    Date,
    /// Wall clock time.
    Time,
    /// Fixed-length byte field.
    Byte,
    /// Variable-length byte string.
    XString,
    /// Flat or nested structure.
    Structure,
    /// Table of structures.
    Table,
    /// Kind not known to this crate.
    Other(String),
}

/// Coercion family shared by several parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFamily {
    /// Integer kinds.
    Integer,
    /// Floating and decimal kinds.
    Decimal,
    /// Character kinds.
    Text,
    /// Date kind.
    Date,
    /// Time kind.
    Time,
    /// Byte kinds.
    Binary,
    /// Structure kind.
    Structure,
    /// Table kind.
    Table,
    /// Unrecognized kind.
    Unknown,
}

impl ParameterKind {
    /// Parses an `RFCTYPE_*` wire name.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "RFCTYPE_INT" => Self::Int,
            "RFCTYPE_INT1" => Self::Int1,
            "RFCTYPE_INT2" => Self::Int2,
            "RFCTYPE_INT8" => Self::Int8,
            "RFCTYPE_FLOAT" => Self::Float,
            "RFCTYPE_BCD" => Self::Bcd,
            "RFCTYPE_DECF16" => Self::Decf16,
            "RFCTYPE_DECF34" => Self::Decf34,
            "RFCTYPE_CHAR" => Self::Char,
            "RFCTYPE_STRING" => Self::String,
            "RFCTYPE_NUM" => Self::Num,
            "RFCTYPE_UTCLONG" => Self::UtcLong,
            "RFCTYPE_DATE" => Self::Date,
            "RFCTYPE_TIME" => Self::Time,
            "RFCTYPE_BYTE" => Self::Byte,
            "RFCTYPE_XSTRING" => Self::XString,
            "RFCTYPE_STRUCTURE" => Self::Structure,
            "RFCTYPE_TABLE" => Self::Table,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the `RFCTYPE_*` wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Int => "RFCTYPE_INT",
            Self::Int1 => "RFCTYPE_INT1",
            Self::Int2 => "RFCTYPE_INT2",
            Self::Int8 => "RFCTYPE_INT8",
            Self::Float => "RFCTYPE_FLOAT",
            Self::Bcd => "RFCTYPE_BCD",
            Self::Decf16 => "RFCTYPE_DECF16",
            Self::Decf34 => "RFCTYPE_DECF34",
            Self::Char => "RFCTYPE_CHAR",
            Self::String => "RFCTYPE_STRING",
            Self::Num => "RFCTYPE_NUM",
            Self::UtcLong => "RFCTYPE_UTCLONG",
            Self::Date => "RFCTYPE_DATE",
            Self::Time => "RFCTYPE_TIME",
            Self::Byte => "RFCTYPE_BYTE",
            Self::XString => "RFCTYPE_XSTRING",
            Self::Structure => "RFCTYPE_STRUCTURE",
            Self::Table => "RFCTYPE_TABLE",
            Self::Other(name) => name,
        }
    }

    /// Returns the coercion family for this kind.
    #[must_use]
    pub const fn family(&self) -> KindFamily {
        match self {
            Self::Int | Self::Int1 | Self::Int2 | Self::Int8 => KindFamily::Integer,
            Self::Float | Self::Bcd | Self::Decf16 | Self::Decf34 => KindFamily::Decimal,
            Self::Char | Self::String | Self::Num | Self::UtcLong => KindFamily::Text,
            Self::Date => KindFamily::Date,
            Self::Time => KindFamily::Time,
            Self::Byte | Self::XString => KindFamily::Binary,
            Self::Structure => KindFamily::Structure,
            Self::Table => KindFamily::Table,
            Self::Other(_) => KindFamily::Unknown,
        }
    }

    /// Returns the inclusive value range for integer kinds.
    #[must_use]
    pub const fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            Self::Int1 => Some((0, u8::MAX as i64)),
            Self::Int2 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Int => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Int8 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl From<String> for ParameterKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<ParameterKind> for String {
    fn from(kind: ParameterKind) -> Self {
        kind.as_str().to_string()
    }
}

// ============================================================================
// SECTION: Descriptions
// ============================================================================

/// Direction of a function module parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDirection {
    /// Input parameter.
    #[serde(rename = "RFC_IMPORT")]
    Import,
    /// Output parameter.
    #[serde(rename = "RFC_EXPORT")]
    Export,
    /// Input and output parameter.
    #[serde(rename = "RFC_CHANGING")]
    Changing,
    /// Table parameter.
    #[serde(rename = "RFC_TABLES")]
    Tables,
}

/// Metadata for one remote function module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescription {
    /// Function module name.
    pub name: String,
    /// Declared parameters in interface order.
    #[serde(default)]
    pub parameters: Vec<ParameterDescription>,
}

impl InterfaceDescription {
    /// Looks up a parameter by its uppercased name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescription> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }
}

/// Declared shape of one function module parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescription {
    /// Parameter name (uppercase).
    pub name: String,
    /// Declared kind.
    #[serde(rename = "parameter_type")]
    pub kind: ParameterKind,
    /// Parameter direction.
    pub direction: ParameterDirection,
    /// Declared length in characters or bytes.
    #[serde(default)]
    pub length: u32,
    /// Declared decimal places.
    #[serde(default)]
    pub decimals: u32,
    /// Whether the caller may omit the parameter.
    #[serde(default)]
    pub optional: bool,
    /// Default value declared by the interface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Short text describing the parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field layout for structure and table parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_description: Option<TypeDescription>,
}

/// Field layout of a structure or table row type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescription {
    /// Dictionary type name.
    pub name: String,
    /// Fields in layout order.
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

impl TypeDescription {
    /// Looks up a field by its uppercased name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Declared shape of one structure field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Field name (uppercase).
    pub name: String,
    /// Declared kind.
    #[serde(rename = "field_type")]
    pub kind: ParameterKind,
    /// Declared length in characters or bytes.
    #[serde(default)]
    pub length: u32,
    /// Declared decimal places.
    #[serde(default)]
    pub decimals: u32,
    /// Nested layout for structure and table fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_description: Option<TypeDescription>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
