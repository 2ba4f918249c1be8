use prost_reflect::Value as ReflectValue;
use prost_reflect_table::{Bridge, DecodeOptions, ErrorCategory, Registry, Table, Value};

use crate::{point, proto_dir, table, test_bridge};

#[test]
fn color_scenario() {
    let bridge = test_bridge();
    let input = table([("color", Value::from("GREEN"))]);
    let message = bridge.encode("test.Paint", &Value::Table(input)).unwrap();
    assert_eq!(
        message.get_field_by_name("color").unwrap().as_enum_number(),
        Some(1)
    );

    let decoded = bridge.decode(&message);
    assert_eq!(decoded.get_field("color"), Some(&Value::from("GREEN")));

    let err = bridge
        .encode(
            "test.Paint",
            &Value::Table(table([("color", Value::from("BLUE"))])),
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Coercion);
}

#[test]
fn path_scenario() {
    let bridge = test_bridge();
    let input = table([(
        "points",
        Table::from_sequence([point(1, 2), point(3, 4)]).into(),
    )]);
    let message = bridge
        .encode("test.Path", &Value::Table(input.clone()))
        .unwrap();
    assert_eq!(bridge.decode(&message), input);
}

#[test]
fn make_message_decodes_to_empty_fields() {
    let bridge = test_bridge();
    let message = bridge.make_message("test.Path").unwrap();
    assert_eq!(bridge.decode(&message), table([("points", Table::new().into())]));

    let message = bridge.make_message("test.Point").unwrap();
    assert!(bridge.decode(&message).is_empty());
}

#[test]
fn decode_from_slice() {
    let bridge = test_bridge();
    let decoded = bridge
        .decode_from_slice("test.Point", b"\x08\x01\x10\x96\x01")
        .unwrap();
    assert_eq!(Value::Table(decoded), point(1, 150));
}

#[test]
fn decode_from_slice_invalid_bytes() {
    let err = test_bridge()
        .decode_from_slice("test.Point", b"\x08")
        .unwrap_err();
    assert!(
        err.to_string().starts_with("failed to decode 'test.Point': "),
        "unexpected error: {}",
        err
    );

    let err = test_bridge()
        .decode_from_slice("test.Unknown", b"")
        .unwrap_err();
    assert_eq!(err.to_string(), "No message type: test.Unknown");
}

#[test]
fn decode_with_bridge_options() {
    let registry = Registry::new();
    registry.add_proto_path(proto_dir());
    registry.import("test.proto").unwrap();
    let bridge = Bridge::with_registry(registry).decode_options(
        DecodeOptions::new()
            .stringify_64_bit_integers(true)
            .use_enum_numbers(true),
    );

    let mut message = bridge.make_message("test.Scalars").unwrap();
    message.set_field_by_name("uint64", ReflectValue::U64(u64::MAX));
    message.set_field_by_name("int32", ReflectValue::I32(-1));
    let decoded = bridge.decode(&message);
    assert_eq!(
        decoded.get_field("uint64"),
        Some(&Value::from("18446744073709551615"))
    );
    assert_eq!(decoded.get_field("int32"), Some(&Value::Integer(-1)));

    let message = bridge
        .encode(
            "test.Paint",
            &Value::Table(table([("color", Value::from("GREEN"))])),
        )
        .unwrap();
    assert_eq!(
        bridge.decode(&message).get_field("color"),
        Some(&Value::Integer(1))
    );
}

#[test]
fn large_uint64_round_trip() {
    let bridge = test_bridge();
    let input = table([
        ("uint64", Value::from("18446744073709551615")),
        ("fixed64", Value::from("9223372036854775808")),
    ]);
    let message = bridge
        .encode("test.Scalars", &Value::Table(input.clone()))
        .unwrap();

    let decoded = bridge.decode(&message);
    assert_eq!(decoded, input);
    assert_eq!(
        bridge.encode("test.Scalars", &Value::Table(decoded)).unwrap(),
        message
    );
}

#[test]
fn decode_maps_round_trip() {
    let bridge = test_bridge();
    let counts: Table = [("a", 1), ("b", 2)].into_iter().collect();
    let names: Table = [(1, "one"), (-5, "minus five")].into_iter().collect();
    let flags: Table = [(true, point(1, 1)), (false, point(2, 2))]
        .into_iter()
        .collect();
    let colors: Table = [(7, "GREEN")].into_iter().collect();
    let weights: Table = [(3, 0.5)].into_iter().collect();
    let input = table([
        ("counts", counts.into()),
        ("names", names.into()),
        ("flags", flags.into()),
        ("colors", colors.into()),
        ("weights", weights.into()),
    ]);

    let message = bridge.encode("test.Maps", &Value::Table(input.clone())).unwrap();
    assert_eq!(bridge.decode(&message), input);
}
