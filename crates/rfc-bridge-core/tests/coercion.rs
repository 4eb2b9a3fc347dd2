//! Parameter validation and coercion tests for rfc-bridge-core.
// crates/rfc-bridge-core/tests/coercion.rs
// =============================================================================
// Module: Coercion Tests
// Description: Validate schema-driven conversion of untyped parameter trees.
// Purpose: Ensure every kind converts strictly and errors name their path.
// =============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

use proptest::prelude::*;
use rfc_bridge_core::CoercionError;
use rfc_bridge_core::FieldDescription;
use rfc_bridge_core::InterfaceDescription;
use rfc_bridge_core::ParameterDescription;
use rfc_bridge_core::ParameterDirection;
use rfc_bridge_core::ParameterKind;
use rfc_bridge_core::RfcValue;
use rfc_bridge_core::TypeDescription;
use rfc_bridge_core::coerce_parameters;
use rfc_bridge_core::validate_parameters;
use serde_json::Value;
use serde_json::json;
use time::macros::date;
use time::macros::time;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

type TestResult = Result<(), String>;

fn field(name: &str, kind: ParameterKind) -> FieldDescription {
    FieldDescription {
        name: name.to_string(),
        kind,
        length: 0,
        decimals: 0,
        type_description: None,
    }
}

fn parameter(name: &str, kind: ParameterKind) -> ParameterDescription {
    ParameterDescription {
        name: name.to_string(),
        kind,
        direction: ParameterDirection::Import,
        length: 0,
        decimals: 0,
        optional: true,
        default_value: None,
        description: None,
        type_description: None,
    }
}

fn item_layout() -> TypeDescription {
    TypeDescription {
        name: "ZITEM".to_string(),
        fields: vec![
            field("MATNR", ParameterKind::Char),
            field("QUANTITY", ParameterKind::Bcd),
            field("DELIV_DATE", ParameterKind::Date),
            field("POS", ParameterKind::Int2),
        ],
    }
}

fn description() -> InterfaceDescription {
    let mut header = parameter("HEADER", ParameterKind::Structure);
    header.type_description = Some(TypeDescription {
        name: "ZHEADER".to_string(),
        fields: vec![field("DOC_TYPE", ParameterKind::Char), {
            let mut nested = field("CREATED", ParameterKind::Structure);
            nested.type_description = Some(TypeDescription {
                name: "ZSTAMP".to_string(),
                fields: vec![field("ON", ParameterKind::Date), field("AT", ParameterKind::Time)],
            });
            nested
        }],
    });
    let mut items = parameter("ITEMS", ParameterKind::Table);
    items.type_description = Some(item_layout());
    InterfaceDescription {
        name: "Z_ORDER_CREATE".to_string(),
        parameters: vec![
            parameter("COUNT", ParameterKind::Int),
            parameter("TINY", ParameterKind::Int1),
            parameter("AMOUNT", ParameterKind::Decf34),
            parameter("RATE", ParameterKind::Float),
            parameter("TEXT", ParameterKind::String),
            parameter("BUDAT", ParameterKind::Date),
            parameter("UZEIT", ParameterKind::Time),
            parameter("PAYLOAD", ParameterKind::XString),
            parameter("FUTURE", ParameterKind::Other("RFCTYPE_FUTURE".to_string())),
            header,
            items,
        ],
    }
}

fn tree(value: &Value) -> rfc_bridge_core::ParameterTree {
    RfcValue::tree_from_json(value.as_object().unwrap())
}

fn coerce_json(value: &Value) -> Result<Value, String> {
    let coerced = coerce_parameters(&tree(value), &description()).map_err(|err| err.to_string())?;
    serde_json::to_value(&coerced).map_err(|err| err.to_string())
}

fn type_error(value: &Value) -> Result<(String, &'static str, String), String> {
    match coerce_parameters(&tree(value), &description()) {
        Err(CoercionError::TypeCoercion {
            path,
            received,
            reason,
            ..
        }) => Ok((path, received, reason)),
        other => Err(format!("expected type coercion error, got {other:?}")),
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn validate_rejects_undeclared_names() -> TestResult {
    match validate_parameters(&tree(&json!({"FOO": 1})), &description()) {
        Err(CoercionError::UnknownParameter {
            name,
            operation,
        }) => {
            assert_eq!(name, "FOO");
            assert_eq!(operation, "Z_ORDER_CREATE");
            Ok(())
        }
        other => Err(format!("unexpected outcome {other:?}")),
    }
}

#[test]
fn validate_matches_names_case_insensitively() -> TestResult {
    validate_parameters(&tree(&json!({"count": 1, "Budat": "20240101"})), &description())
        .map_err(|err| err.to_string())
}

#[test]
fn validate_rejects_names_colliding_after_uppercasing() {
    let outcome = validate_parameters(&tree(&json!({"count": 1, "COUNT": 2})), &description());
    assert_eq!(
        outcome,
        Err(CoercionError::DuplicateParameter {
            path: "COUNT".to_string()
        })
    );
}

// ============================================================================
// SECTION: Scalars
// ============================================================================

#[test]
fn scalars_convert_to_declared_kinds() -> TestResult {
    let coerced = coerce_parameters(
        &tree(&json!({
            "count": "42",
            "amount": "1234.5678",
            "rate": 2,
            "text": 1.5,
            "budat": "20240229",
            "uzeit": "235959",
            "payload": "aGVsbG8=",
            "future": {"anything": [1, 2]},
        })),
        &description(),
    )
    .map_err(|err| err.to_string())?;

    assert_eq!(coerced.get("COUNT"), Some(&RfcValue::Int(42)));
    assert_eq!(coerced.get("AMOUNT"), Some(&RfcValue::Decimal("1234.5678".to_string())));
    assert_eq!(coerced.get("RATE"), Some(&RfcValue::Float(2.0)));
    assert_eq!(coerced.get("TEXT"), Some(&RfcValue::Text("1.5".to_string())));
    assert_eq!(coerced.get("BUDAT"), Some(&RfcValue::Date(date!(2024 - 02 - 29))));
    assert_eq!(coerced.get("UZEIT"), Some(&RfcValue::Time(time!(23:59:59))));
    assert_eq!(coerced.get("PAYLOAD"), Some(&RfcValue::Bytes(b"hello".to_vec())));
    assert_eq!(coerced.get("FUTURE"), Some(&RfcValue::from_json(&json!({"anything": [1, 2]}))));
    Ok(())
}

#[test]
fn undeclared_names_pass_through_uppercased() -> TestResult {
    let coerced = coerce_json(&json!({"extra": {"x": 1}}))?;
    assert_eq!(coerced, json!({"EXTRA": {"x": 1}}));
    Ok(())
}

#[test]
fn null_bypasses_kind_conversion() -> TestResult {
    let coerced = coerce_json(&json!({"budat": null, "items": null}))?;
    assert_eq!(coerced, json!({"BUDAT": null, "ITEMS": null}));
    Ok(())
}

#[test]
fn integer_text_must_be_fully_numeric() -> TestResult {
    let (path, received, reason) = type_error(&json!({"count": "12abc"}))?;
    assert_eq!(path, "COUNT");
    assert_eq!(received, "text");
    assert!(reason.contains("12abc"), "{reason}");
    for bad in [" 12 ", "+12", "", "-", "1 2"] {
        let (path, _, _) = type_error(&json!({"count": bad}))?;
        assert_eq!(path, "COUNT");
    }
    let coerced = coerce_json(&json!({"count": "-42"}))?;
    assert_eq!(coerced, json!({"COUNT": -42}));
    Ok(())
}

#[test]
fn integers_respect_declared_width() -> TestResult {
    let (path, _, reason) = type_error(&json!({"tiny": 256}))?;
    assert_eq!(path, "TINY");
    assert!(reason.contains("outside"), "{reason}");
    let (_, received, _) = type_error(&json!({"count": 1.5}))?;
    assert_eq!(received, "number");
    Ok(())
}

#[test]
fn dates_and_times_are_parsed_strictly() -> TestResult {
    for bad in ["2024-02-29", "20240230", "2024022", "２０２４０２２９"] {
        let (path, _, reason) = type_error(&json!({"budat": bad}))?;
        assert_eq!(path, "BUDAT");
        assert!(reason.contains("YYYYMMDD"), "{reason}");
    }
    let (path, received, _) = type_error(&json!({"uzeit": 120000}))?;
    assert_eq!((path.as_str(), received), ("UZEIT", "integer"));
    let (_, _, reason) = type_error(&json!({"uzeit": "246000"}))?;
    assert!(reason.contains("HHMMSS"), "{reason}");
    Ok(())
}

#[test]
fn invalid_base64_is_a_decode_error() -> TestResult {
    let (path, received, reason) = type_error(&json!({"payload": "not base64!"}))?;
    assert_eq!((path.as_str(), received), ("PAYLOAD", "text"));
    assert!(reason.contains("base64"), "{reason}");
    Ok(())
}

// ============================================================================
// SECTION: Structures and Tables
// ============================================================================

#[test]
fn nested_structures_coerce_recursively() -> TestResult {
    let coerced = coerce_json(&json!({
        "header": {"doc_type": "NB", "created": {"on": "20240101", "at": "080000"}, "note": 7}
    }))?;
    assert_eq!(
        coerced,
        json!({"HEADER": {
            "CREATED": {"AT": "080000", "ON": "20240101"},
            "DOC_TYPE": "NB",
            "NOTE": 7
        }})
    );
    Ok(())
}

#[test]
fn nested_errors_carry_the_full_path() -> TestResult {
    let (path, received, _) =
        type_error(&json!({"header": {"created": {"on": "yesterday"}}}))?;
    assert_eq!(path, "HEADER.CREATED.ON");
    assert_eq!(received, "text");
    Ok(())
}

#[test]
fn tables_preserve_row_order_and_report_row_index() -> TestResult {
    let coerced = coerce_json(&json!({"items": [
        {"matnr": "M-3", "quantity": "1.000", "pos": "30"},
        {"matnr": "M-1", "quantity": 2, "pos": 10},
        {"matnr": 200, "deliv_date": "20241231", "pos": 20},
    ]}))?;
    let matnrs: Vec<&str> = coerced["ITEMS"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["MATNR"].as_str().unwrap())
        .collect();
    assert_eq!(matnrs, vec!["M-3", "M-1", "200"]);
    assert_eq!(coerced["ITEMS"][0]["POS"], json!(30));
    assert_eq!(coerced["ITEMS"][1]["QUANTITY"], json!(2.0));

    let (path, _, _) = type_error(&json!({"items": [{"pos": 1}, {"pos": "x"}]}))?;
    assert_eq!(path, "ITEMS[1].POS");
    Ok(())
}

#[test]
fn shape_errors_for_structures_and_tables() -> TestResult {
    let (path, received, _) = type_error(&json!({"header": "flat"}))?;
    assert_eq!((path.as_str(), received), ("HEADER", "text"));
    let (path, received, _) = type_error(&json!({"items": {"matnr": "M-1"}}))?;
    assert_eq!((path.as_str(), received), ("ITEMS", "structure"));
    let (path, received, _) = type_error(&json!({"items": [1]}))?;
    assert_eq!((path.as_str(), received), ("ITEMS[0]", "integer"));
    Ok(())
}

// ============================================================================
// SECTION: Properties
// ============================================================================

fn date_text() -> impl Strategy<Value = String> {
    (1970_i32 .. 2100, 1_u8 .. 13, 1_u8 .. 29)
        .prop_map(|(year, month, day)| format!("{year:04}{month:02}{day:02}"))
}

fn time_text() -> impl Strategy<Value = String> {
    (0_u8 .. 24, 0_u8 .. 60, 0_u8 .. 60)
        .prop_map(|(hour, minute, second)| format!("{hour:02}{minute:02}{second:02}"))
}

fn item_row() -> impl Strategy<Value = Value> {
    ("[A-Z0-9-]{1,10}", "[0-9]{1,4}\\.[0-9]{3}", date_text(), any::<i16>()).prop_map(
        |(matnr, quantity, deliv_date, pos)| {
            let values = [json!(matnr), json!(quantity), json!(deliv_date), json!(pos)];
            let row: serde_json::Map<String, Value> =
                item_layout().fields.into_iter().map(|field| field.name).zip(values).collect();
            Value::Object(row)
        },
    )
}

fn header_value() -> impl Strategy<Value = Value> {
    ("[A-Z]{2,4}", date_text(), time_text()).prop_map(|(doc_type, on, at)| {
        json!({"DOC_TYPE": doc_type, "CREATED": {"ON": on, "AT": at}})
    })
}

fn matching_value() -> impl Strategy<Value = (String, Value)> {
    prop_oneof![
        any::<i32>().prop_map(|number| ("COUNT".to_string(), json!(number))),
        "[A-Za-z0-9 ]{0,20}".prop_map(|text| ("TEXT".to_string(), json!(text))),
        date_text().prop_map(|text| ("BUDAT".to_string(), json!(text))),
        time_text().prop_map(|text| ("UZEIT".to_string(), json!(text))),
        "[0-9]{1,6}\\.[0-9]{1,4}".prop_map(|text| ("AMOUNT".to_string(), json!(text))),
        header_value().prop_map(|value| ("HEADER".to_string(), value)),
        proptest::collection::vec(item_row(), 0 .. 4)
            .prop_map(|rows| ("ITEMS".to_string(), Value::Array(rows))),
    ]
}

proptest! {
    #[test]
    fn coercion_of_matching_values_only_normalizes_names(
        entries in proptest::collection::vec(matching_value(), 0 .. 6),
        lowercase in any::<bool>(),
    ) {
        let mut input = serde_json::Map::new();
        let mut expected = serde_json::Map::new();
        for (name, value) in entries {
            let key = if lowercase { name.to_lowercase() } else { name.clone() };
            input.insert(key, value.clone());
            expected.insert(name, value);
        }
        let coerced = coerce_json(&Value::Object(input)).unwrap();
        prop_assert_eq!(coerced, Value::Object(expected));
    }
}
