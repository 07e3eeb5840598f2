//! Tests for decoder module

use super::*;
use crate::error::Error;
use crate::types::FieldValue;
use bigdecimal::BigDecimal;
use pretty_assertions::assert_eq;
use std::str::FromStr;

const PATH: &str = "/ItemCard";

fn decimal(s: &str) -> FieldValue {
    FieldValue::Decimal(BigDecimal::from_str(s).unwrap())
}

#[test]
fn test_decode_odata_envelope() {
    let body = r#"{
        "@odata.context": "https://api/$metadata#ItemCard",
        "value": [
            {"No": "1000", "Description": "Bicycle", "Unit_Price": 19.99, "Blocked": false},
            {"No": "1001", "Description": "Tire", "Unit_Price": 4.5, "Blocked": true}
        ]
    }"#;

    let records = RecordDecoder::new().decode(PATH, body).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("No"), Some(&FieldValue::from("1000")));
    assert_eq!(records[0].get("Unit_Price"), Some(&decimal("19.99")));
    assert_eq!(records[1].get("Blocked"), Some(&FieldValue::Bool(true)));
}

#[test]
fn test_decimal_text_is_preserved() {
    let body = r#"{"value": [{"Unit_Price": 19.99, "Amount": 12.10, "Big": 123456789012345678901234567890.123456789, "Tiny": 0.00000001, "Rate": 0.0000012300}]}"#;

    let records = RecordDecoder::new().decode(PATH, body).unwrap();
    let json = records[0].to_json_string().unwrap();

    assert_eq!(
        json,
        r#"{"Unit_Price":19.99,"Amount":12.10,"Big":123456789012345678901234567890.123456789,"Tiny":0.00000001,"Rate":0.0000012300}"#
    );
}

#[test]
fn test_field_order_is_preserved() {
    let body = r#"{"value": [{"z": 1, "a": 2, "m": 3}]}"#;
    let records = RecordDecoder::new().decode(PATH, body).unwrap();
    let keys: Vec<_> = records[0].keys().collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_nested_numbers_are_decimals() {
    let body = r#"{"value": [{"lines": [{"qty": 1.25}], "dims": {"w": 0.1}}]}"#;
    let records = RecordDecoder::new().decode(PATH, body).unwrap();

    let Some(FieldValue::List(lines)) = records[0].get("lines") else {
        panic!("expected list")
    };
    let FieldValue::Object(line) = &lines[0] else {
        panic!("expected object")
    };
    assert_eq!(line.get("qty"), Some(&decimal("1.25")));

    let Some(FieldValue::Object(dims)) = records[0].get("dims") else {
        panic!("expected object")
    };
    assert_eq!(dims.get("w"), Some(&decimal("0.1")));
}

#[test]
fn test_nulls_and_strings_pass_through() {
    let body = r#"{"value": [{"Name": "Ann", "Phone": null, "Modified": "2024-01-02T03:04:05Z"}]}"#;
    let records = RecordDecoder::new().decode(PATH, body).unwrap();

    assert_eq!(records[0].get("Phone"), Some(&FieldValue::Null));
    assert_eq!(
        records[0].get("Modified"),
        Some(&FieldValue::from("2024-01-02T03:04:05Z"))
    );
    assert!(records[0].get("Modified").unwrap().as_timestamp().is_some());
}

#[test]
fn test_decode_top_level_array() {
    let body = r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#;
    let records = RecordDecoder::new().decode(PATH, body).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].get("id"), Some(&decimal("3")));
}

#[test]
fn test_decode_custom_key() {
    let decoder = RecordDecoder::with_location(RecordLocation::Key("items".to_string()));
    let records = decoder.decode(PATH, r#"{"items": [{"id": 1}]}"#).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_custom_key_page_counts_its_records() {
    let decoder = RecordDecoder::with_location(RecordLocation::Key("items".to_string()));
    let page = decoder
        .decode_page(PATH, r#"{"items": [{"id": 1}, {"id": 2}], "@odata.nextLink": "next"}"#)
        .unwrap();
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.shape.record_count, 2);
    assert!(page.shape.has_continuation);
}

#[test]
fn test_root_location_rejects_object() {
    let decoder = RecordDecoder::with_location(RecordLocation::Root);
    let err = decoder.decode(PATH, r#"{"value": []}"#).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_decode_page_reports_shape() {
    let body = r#"{"value": [{"id": 1}], "@odata.nextLink": "https://api/next"}"#;
    let page = RecordDecoder::new().decode_page(PATH, body).unwrap();
    assert_eq!(page.records.len(), 1);
    assert!(page.shape.has_continuation);
    assert_eq!(page.shape.record_count, 1);
}

#[test]
fn test_empty_value_list() {
    let page = RecordDecoder::new()
        .decode_page(PATH, r#"{"value": []}"#)
        .unwrap();
    assert!(page.records.is_empty());
    assert_eq!(page.shape.record_count, 0);
}

#[test]
fn test_invalid_json_is_fatal() {
    let err = RecordDecoder::new().decode(PATH, "{not json").unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains(PATH));
}

#[test]
fn test_empty_body_is_fatal() {
    let err = RecordDecoder::new().decode(PATH, "   ").unwrap_err();
    assert!(err.to_string().contains("empty response body"));
}

#[test]
fn test_missing_value_key_is_fatal() {
    let err = RecordDecoder::new()
        .decode(PATH, r#"{"error": {"code": "BadRequest"}}"#)
        .unwrap_err();
    assert!(err.to_string().contains("missing 'value'"));
}

#[test]
fn test_non_array_value_is_fatal() {
    let err = RecordDecoder::new()
        .decode(PATH, r#"{"value": {"id": 1}}"#)
        .unwrap_err();
    assert!(err.to_string().contains("expected array"));
}

#[test]
fn test_non_object_record_is_fatal() {
    let err = RecordDecoder::new()
        .decode(PATH, r#"{"value": [{"id": 1}, 2]}"#)
        .unwrap_err();
    assert!(err.to_string().contains("record 1"));
}

#[test]
fn test_record_location_default() {
    assert_eq!(RecordLocation::default(), RecordLocation::Auto);
    assert_eq!(RecordLocation::odata(), RecordLocation::Key("value".to_string()));
}
