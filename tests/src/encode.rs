use prost::Message;
use prost_reflect::{DynamicMessage, ReflectMessage};
use prost_reflect_table::{ErrorCategory, Table, Value};

use crate::{point, table, test_bridge};

#[test]
fn encode_path() {
    let points = Table::from_sequence([point(1, 2), point(3, 4)]);
    let message = test_bridge()
        .encode("test.Path", &Value::Table(table([("points", points.into())])))
        .unwrap();

    let points = message.get_field_by_name("points").unwrap();
    let points = points.as_list().unwrap();
    assert_eq!(points.len(), 2);
    let coordinates: Vec<_> = points
        .iter()
        .map(|point| {
            let point = point.as_message().unwrap();
            (
                point.get_field_by_name("x").unwrap().as_i32().unwrap(),
                point.get_field_by_name("y").unwrap().as_i32().unwrap(),
            )
        })
        .collect();
    assert_eq!(coordinates, vec![(1, 2), (3, 4)]);
}

#[test]
fn encode_accepts_leading_dot() {
    let message = test_bridge().encode(".test.Point", &point(1, 2)).unwrap();
    assert_eq!(message.descriptor().full_name(), "test.Point");
}

#[test]
fn encode_rejects_non_table() {
    let err = test_bridge()
        .encode("test.Point", &Value::Integer(3))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Shape);
    assert_eq!(
        err.to_string(),
        "bad argument #2 to 'encode' (table expected, got number)"
    );

    let err = test_bridge().encode("test.Point", &Value::Nil).unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad argument #2 to 'encode' (table expected, got nil)"
    );
}

#[test]
fn encode_unknown_type() {
    let err = test_bridge()
        .encode("test.Nope", &Value::Table(Table::new()))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Schema);
    assert_eq!(err.to_string(), "No message type: test.Nope");
}

#[test]
fn encode_error_names_field() {
    let err = test_bridge()
        .encode(
            "test.Paint",
            &Value::Table(table([("color", Value::from("BLUE"))])),
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Coercion);
    let encode_err = err.as_encode_error().unwrap();
    assert_eq!(encode_err.path(), "color");
    assert!(err.to_string().contains("BLUE"));
    assert!(err.to_string().contains("test.Color"));
}

#[test]
fn encode_failure_returns_no_message() {
    // The first field is valid, the second is not: nothing partially built is returned.
    let input = table([("x", Value::Integer(1)), ("y", Value::Number(0.5))]);
    let result = test_bridge().encode("test.Point", &Value::Table(input));
    assert!(result.is_err());

    let message = test_bridge()
        .encode("test.Point", &Value::Table(table([("y", Value::Integer(2))])))
        .unwrap();
    assert!(!message.has_field_by_name("x"));
}

#[test]
fn encode_to_vec() {
    let bytes = test_bridge()
        .encode_to_vec("test.Point", &point(1, 150))
        .unwrap();
    assert_eq!(bytes, b"\x08\x01\x10\x96\x01");

    let desc = test_bridge()
        .registry()
        .find_message_type("test.Point")
        .unwrap();
    let message = DynamicMessage::decode(desc, bytes.as_slice()).unwrap();
    assert_eq!(message.get_field_by_name("y").unwrap().as_i32(), Some(150));
    assert_eq!(message.encoded_len(), bytes.len());
}

#[test]
fn encode_well_known_type() {
    let at = table([("seconds", Value::Integer(1_600_000_000)), ("nanos", Value::Integer(5))]);
    let message = test_bridge()
        .encode(
            "test.Event",
            &Value::Table(table([("name", Value::from("launch")), ("at", at.into())])),
        )
        .unwrap();
    let at = message.get_field_by_name("at").unwrap();
    let at = at.as_message().unwrap();
    assert_eq!(
        at.get_field_by_name("seconds").unwrap().as_i64(),
        Some(1_600_000_000)
    );
}

#[test]
fn encode_required_field_missing() {
    let err = test_bridge()
        .encode(
            "legacy.Account",
            &Value::Table(table([("balance", Value::Integer(5))])),
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Shape);
    assert_eq!(
        err.to_string(),
        "required field 'id' of message 'legacy.Account' is not set"
    );
}
