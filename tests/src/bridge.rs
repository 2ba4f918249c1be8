use std::error::Error;

use prost_reflect::{DynamicMessage, MessageDescriptor};
use prost_reflect_table::{
    Bridge, EncodeOptions, ErrorCategory, MessageFactory, Registry, Table, Value,
};

use crate::{empty_bridge, point, proto_dir, table, test_bridge};

#[derive(Debug)]
struct RefusingFactory(&'static str);

impl MessageFactory for RefusingFactory {
    fn new_message(&self, desc: &MessageDescriptor) -> Option<DynamicMessage> {
        if desc.full_name() == self.0 {
            None
        } else {
            Some(DynamicMessage::new(desc.clone()))
        }
    }
}

fn refusing_bridge(refused: &'static str) -> Bridge {
    let registry = Registry::new();
    registry.add_proto_path(proto_dir());
    registry.import("test.proto").unwrap();
    Bridge::with_registry(registry).with_factory(RefusingFactory(refused))
}

#[test]
fn import_proto_file() {
    let bridge = empty_bridge();
    assert!(bridge.make_message("test.Point").is_err());
    bridge.import_proto_file("test.proto").unwrap();
    assert!(bridge.make_message("test.Point").is_ok());
    bridge.import_proto_file("test.proto").unwrap();
}

#[test]
fn import_failure_message() {
    let bridge = empty_bridge();
    let err = bridge.import_proto_file("broken_b.proto").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Schema);
    assert!(
        err.to_string()
            .starts_with("Failed to import: broken_b.proto:5: "),
        "unexpected error: {}",
        err
    );
    let import_err = err.as_import_error().unwrap();
    assert_eq!(import_err.line(), Some(5));
    assert!(err.source().is_some());
}

#[test]
fn import_failure_after_other_failure() {
    let bridge = empty_bridge();
    bridge.import_proto_file("broken_a.proto").unwrap_err();
    let err = bridge.import_proto_file("broken_b.proto").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("broken_b.proto:5"), "{}", message);
    assert!(!message.contains("broken_a.proto"), "{}", message);
}

#[test]
fn default_bridge_searches_current_dir() {
    // Tests run with the package root as the working directory.
    let bridge = Bridge::new();
    bridge
        .import_proto_file("src/proto/mapped/geometry.proto")
        .unwrap();
    assert!(bridge.make_message("geo.Polygon").is_ok());
}

#[test]
fn map_path() {
    let bridge = empty_bridge();
    bridge.map_path("geo", proto_dir().join("mapped"));
    bridge.import_proto_file("geo/geometry.proto").unwrap();

    let vertices = Table::from_sequence([table([
        ("lat", Value::Number(51.5)),
        ("lon", Value::Number(-0.12)),
    ])]);
    let input = table([("vertices", vertices.into())]);
    let message = bridge
        .encode("geo.Polygon", &Value::Table(input.clone()))
        .unwrap();
    assert_eq!(bridge.decode(&message), input);
}

#[test]
fn make_message_unknown_type() {
    let err = test_bridge().make_message("test.Nope").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Schema);
    assert_eq!(err.to_string(), "No message type: test.Nope");
}

#[test]
fn make_message_no_prototype() {
    let bridge = refusing_bridge("test.Point");
    let err = bridge.make_message("test.Point").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Allocation);
    assert_eq!(err.to_string(), "No prototype for test.Point");

    assert!(bridge.make_message("test.Path").is_ok());
}

#[test]
fn encode_nested_no_prototype() {
    let bridge = refusing_bridge("test.Point");
    let points = Table::from_sequence([point(1, 2)]);
    let err = bridge
        .encode("test.Path", &Value::Table(table([("points", points.into())])))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Allocation);
    assert_eq!(err.as_encode_error().unwrap().path(), "points[1]");

    // An empty list never needs a prototype.
    bridge
        .encode(
            "test.Path",
            &Value::Table(table([("points", Table::new().into())])),
        )
        .unwrap();
}

#[test]
fn encode_options() {
    let registry = Registry::new();
    registry.add_proto_path(proto_dir());
    registry.import("test.proto").unwrap();
    let bridge = Bridge::with_registry(registry)
        .encode_options(EncodeOptions::new().deny_unknown_fields(true));

    let input = table([("x", Value::Integer(1)), ("z", Value::Integer(2))]);
    let err = bridge
        .encode("test.Point", &Value::Table(input))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Schema);
    assert_eq!(
        err.to_string(),
        "field 'z' not found for message 'test.Point'"
    );
}

#[test]
fn bridge_is_shareable() {
    fn assert_send_sync<T: Send + Sync>(_: &T) {}
    assert_send_sync(test_bridge());
}
