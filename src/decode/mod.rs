
use std::collections::HashMap;

use prost_reflect::{
    DynamicMessage, FieldDescriptor, Kind, MapKey, ReflectMessage, Value as ReflectValue,
};

use crate::{field::FieldShape, Key, Table, Value};

/// Options to control decoding of messages into tables.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    stringify_64_bit_integers: bool,
    use_enum_numbers: bool,
    emit_unpopulated_fields: bool,
}

/// Decodes `message` into a table keyed by field name.
///
/// Singular fields that are not set are omitted. Repeated and map fields are always present,
/// as an array-shaped table and a keyed table respectively.
pub fn decode(message: &DynamicMessage) -> Table {
    decode_with_options(message, &DecodeOptions::default())
}

/// Decodes `message` into a table, using the behaviour specified by `options`.
pub fn decode_with_options(message: &DynamicMessage, options: &DecodeOptions) -> Table {
    Decoder { options }.decode_message(message)
}

struct Decoder<'a> {
    options: &'a DecodeOptions,
}

impl<'a> Decoder<'a> {
    fn decode_message(&self, message: &DynamicMessage) -> Table {
        let mut table = Table::new();
        for field in message.descriptor().fields() {
            if !self.is_emitted(message, &field) {
                continue;
            }

            let value = message.get_field(&field);
            table.insert(field.name(), self.decode_value(&field.kind(), &value));
        }
        table
    }

    fn is_emitted(&self, message: &DynamicMessage, field: &FieldDescriptor) -> bool {
        match FieldShape::of(field) {
            FieldShape::List | FieldShape::Map => true,
            FieldShape::Singular if message.has_field(field) => true,
            FieldShape::Singular => {
                self.options.emit_unpopulated_fields && field.containing_oneof().is_none()
            }
        }
    }

    fn decode_value(&self, kind: &Kind, value: &ReflectValue) -> Value {
        match value {
            ReflectValue::Bool(v) => Value::Boolean(*v),
            ReflectValue::I32(v) => Value::Integer((*v).into()),
            ReflectValue::U32(v) => Value::Integer((*v).into()),
            ReflectValue::I64(v) if self.options.stringify_64_bit_integers => {
                Value::String(v.to_string())
            }
            ReflectValue::I64(v) => Value::Integer(*v),
            ReflectValue::U64(v) if self.options.stringify_64_bit_integers => {
                Value::String(v.to_string())
            }
            ReflectValue::U64(v) => match i64::try_from(*v) {
                Ok(v) => Value::Integer(v),
                Err(_) => Value::String(v.to_string()),
            },
            ReflectValue::F32(v) => Value::Number((*v).into()),
            ReflectValue::F64(v) => Value::Number(*v),
            ReflectValue::String(v) => Value::String(v.clone()),
            ReflectValue::Bytes(v) => Value::Bytes(v.clone()),
            ReflectValue::EnumNumber(number) => self.decode_enum(kind, *number),
            ReflectValue::Message(message) => Value::Table(self.decode_message(message)),
            ReflectValue::List(values) => Value::Table(Table::from_sequence(
                values.iter().map(|value| self.decode_value(kind, value)),
            )),
            ReflectValue::Map(entries) => Value::Table(self.decode_map(kind, entries)),
        }
    }

    fn decode_enum(&self, kind: &Kind, number: i32) -> Value {
        match kind {
            Kind::Enum(desc) if !self.options.use_enum_numbers => match desc.get_value(number) {
                Some(enum_value) => Value::String(enum_value.name().to_owned()),
                None => Value::Integer(number.into()),
            },
            _ => Value::Integer(number.into()),
        }
    }

    fn decode_map(&self, kind: &Kind, entries: &HashMap<MapKey, ReflectValue>) -> Table {
        let value_kind = match kind {
            Kind::Message(entry_desc) => entry_desc.map_entry_value_field().kind(),
            _ => unreachable!("map field without an entry message"),
        };

        entries
            .iter()
            .map(|(key, value)| (decode_map_key(key), self.decode_value(&value_kind, value)))
            .collect()
    }
}

fn decode_map_key(key: &MapKey) -> Key {
    match key {
        MapKey::Bool(key) => Key::Boolean(*key),
        MapKey::I32(key) => Key::Integer((*key).into()),
        MapKey::I64(key) => Key::Integer(*key),
        MapKey::U32(key) => Key::Integer((*key).into()),
        MapKey::U64(key) => match i64::try_from(*key) {
            Ok(key) => Key::Integer(key),
            Err(_) => Key::String(key.to_string()),
        },
        MapKey::String(key) => Key::String(key.clone()),
    }
}

impl DecodeOptions {
    /// Creates a new instance of [`DecodeOptions`], with the default options.
    pub const fn new() -> Self {
        DecodeOptions {
            stringify_64_bit_integers: false,
            use_enum_numbers: false,
            emit_unpopulated_fields: false,
        }
    }

    /// Whether to decode 64-bit integral types as decimal strings.
    ///
    /// Scripting runtimes typically represent numbers as doubles or signed 64-bit integers, so
    /// large `uint64` values cannot be represented exactly. Strings can be encoded again without
    /// loss of precision. If this option is disabled, only a `uint64` above `i64::MAX` is decoded
    /// as a string.
    ///
    /// The default value is `false`.
    pub const fn stringify_64_bit_integers(mut self, yes: bool) -> Self {
        self.stringify_64_bit_integers = yes;
        self
    }

    /// Whether to decode enum values as their numeric value.
    ///
    /// If `false`, enum values are decoded as the name specified in the proto file, or as their
    /// number if no value with that number is defined.
    ///
    /// The default value is `false`.
    pub const fn use_enum_numbers(mut self, yes: bool) -> Self {
        self.use_enum_numbers = yes;
        self
    }

    /// Whether to emit unpopulated singular fields.
    ///
    /// If `false`, any singular field for which [`has_field`][DynamicMessage::has_field]
    /// returns `false` is omitted. If `true`, such fields are decoded with their default value,
    /// except for members of a oneof.
    ///
    /// The default value is `false`.
    pub const fn emit_unpopulated_fields(mut self, yes: bool) -> Self {
        self.emit_unpopulated_fields = yes;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}
