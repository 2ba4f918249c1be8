mod error;
mod kind;

use std::collections::HashMap;

use prost_reflect::{
    Cardinality, DynamicMessage, FieldDescriptor, Kind, MessageDescriptor, ReflectMessage,
    Value as ReflectValue,
};

pub use self::error::{EncodeError, ErrorCategory};

use self::error::EncodeErrorKind;
use crate::{
    factory::{DynamicMessageFactory, MessageFactory},
    field::FieldShape,
    Key, Table, Value,
};

/// Options to control encoding of tables into messages.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    deny_unknown_fields: bool,
    check_required_fields: bool,
}

/// Encodes `value` as a message of type `desc`.
///
/// `value` must be a [`Value::Table`] whose string keys name fields of the message, or a
/// [`Value::Message`] of the same type. Fields absent from the table are left unset. On error,
/// the partially built message is discarded.
///
/// # Examples
///
/// ```
/// # use prost_reflect::DescriptorPool;
/// # use prost_reflect_table::{Table, Value};
/// # fn example(pool: &DescriptorPool) -> Result<(), prost_reflect_table::EncodeError> {
/// let desc = pool.get_message_by_name("test.Point").unwrap();
/// let table: Table = [("x", 1), ("y", 2)].into_iter().collect();
/// let message = prost_reflect_table::encode(&desc, &Value::Table(table))?;
/// assert_eq!(message.get_field_by_name("x").unwrap().as_i32(), Some(1));
/// # Ok(())
/// # }
/// ```
pub fn encode(desc: &MessageDescriptor, value: &Value) -> Result<DynamicMessage, EncodeError> {
    encode_with_options(desc, value, &EncodeOptions::default())
}

/// Encodes `value` as a message of type `desc`, using the behaviour specified by `options`.
pub fn encode_with_options(
    desc: &MessageDescriptor,
    value: &Value,
    options: &EncodeOptions,
) -> Result<DynamicMessage, EncodeError> {
    encode_with_factory(desc, value, options, &DynamicMessageFactory)
}

/// Encodes `value` as a message of type `desc`, obtaining every message instance, including
/// nested ones, from `factory`.
pub fn encode_with_factory(
    desc: &MessageDescriptor,
    value: &Value,
    options: &EncodeOptions,
    factory: &dyn MessageFactory,
) -> Result<DynamicMessage, EncodeError> {
    Encoder { options, factory }.encode_message(desc, value)
}

struct Encoder<'a> {
    options: &'a EncodeOptions,
    factory: &'a dyn MessageFactory,
}

impl<'a> Encoder<'a> {
    fn encode_message(
        &self,
        desc: &MessageDescriptor,
        value: &Value,
    ) -> Result<DynamicMessage, EncodeError> {
        match value {
            Value::Table(table) => self.encode_table(desc, table),
            Value::Message(message) => adopt_message(desc, message),
            value => Err(EncodeError::new(EncodeErrorKind::ExpectedTable {
                found: value.type_name(),
            })),
        }
    }

    fn encode_table(
        &self,
        desc: &MessageDescriptor,
        table: &Table,
    ) -> Result<DynamicMessage, EncodeError> {
        let mut message = self.factory.new_message(desc).ok_or_else(|| {
            EncodeError::new(EncodeErrorKind::NoPrototype {
                message_name: desc.full_name().to_owned(),
            })
        })?;

        if self.options.deny_unknown_fields {
            check_unknown_fields(desc, table)?;
        }

        // Fields are applied in declaration order, so when several members of a oneof are
        // present the one declared last remains set.
        for field in desc.fields() {
            let value = match table.get_field(field.name()) {
                Some(value) => value,
                None => continue,
            };

            let value = self
                .encode_field(&field, value)
                .map_err(|err| err.in_field(field.name()))?;
            message.try_set_field(&field, value).map_err(|err| {
                EncodeError::new(EncodeErrorKind::InvalidValue {
                    message: err.to_string(),
                })
                .in_field(field.name())
            })?;
        }

        if self.options.check_required_fields {
            check_required_fields(desc, &message)?;
        }

        Ok(message)
    }

    fn encode_field(
        &self,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<ReflectValue, EncodeError> {
        match FieldShape::of(field) {
            FieldShape::Singular => self.encode_value(&field.kind(), value),
            FieldShape::List => self.encode_list(&field.kind(), value),
            FieldShape::Map => self.encode_map(&field.kind(), value),
        }
    }

    fn encode_value(&self, kind: &Kind, value: &Value) -> Result<ReflectValue, EncodeError> {
        match kind {
            Kind::Message(desc) => self.encode_message(desc, value).map(ReflectValue::Message),
            kind => kind::encode_scalar(kind, value).map_err(EncodeError::new),
        }
    }

    fn encode_list(&self, kind: &Kind, value: &Value) -> Result<ReflectValue, EncodeError> {
        let elements = expect_table(value)?
            .as_sequence()
            .ok_or_else(|| EncodeError::new(EncodeErrorKind::ExpectedSequence))?;

        elements
            .enumerate()
            .map(|(index, element)| {
                self.encode_value(kind, element)
                    .map_err(|err| err.at_index(index + 1))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(ReflectValue::List)
    }

    fn encode_map(&self, kind: &Kind, value: &Value) -> Result<ReflectValue, EncodeError> {
        let table = expect_table(value)?;
        let entry_desc = match kind {
            Kind::Message(entry_desc) => entry_desc,
            _ => unreachable!("map field without an entry message"),
        };
        let key_kind = entry_desc.map_entry_key_field().kind();
        let value_kind = entry_desc.map_entry_value_field().kind();

        let mut result = HashMap::with_capacity(table.len());
        for (key, value) in table.iter() {
            let map_key = match kind::encode_map_key(&key_kind, &key) {
                Ok(map_key) => map_key,
                Err(err) => return Err(EncodeError::new(err).at_key(key)),
            };
            let value = match self.encode_value(&value_kind, value) {
                Ok(value) => value,
                Err(err) => return Err(err.at_key(key)),
            };
            result.insert(map_key, value);
        }

        Ok(ReflectValue::Map(result))
    }
}

fn expect_table(value: &Value) -> Result<&Table, EncodeError> {
    match value {
        Value::Table(table) => Ok(table),
        value => Err(EncodeError::new(EncodeErrorKind::ExpectedTable {
            found: value.type_name(),
        })),
    }
}

fn adopt_message(
    desc: &MessageDescriptor,
    message: &DynamicMessage,
) -> Result<DynamicMessage, EncodeError> {
    let message_desc = message.descriptor();
    if message_desc.full_name() == desc.full_name() {
        Ok(message.clone())
    } else {
        Err(EncodeError::new(EncodeErrorKind::MessageTypeMismatch {
            expected: desc.full_name().to_owned(),
            found: message_desc.full_name().to_owned(),
        }))
    }
}

fn check_unknown_fields(desc: &MessageDescriptor, table: &Table) -> Result<(), EncodeError> {
    let unknown = table.iter().find_map(|(key, _)| match key {
        Key::String(name) if desc.get_field_by_name(&name).is_some() => None,
        Key::String(name) => Some(name),
        key => Some(key.to_string()),
    });

    match unknown {
        Some(field_name) => Err(EncodeError::new(EncodeErrorKind::FieldNotFound {
            field_name,
            message_name: desc.full_name().to_owned(),
        })),
        None => Ok(()),
    }
}

fn check_required_fields(
    desc: &MessageDescriptor,
    message: &DynamicMessage,
) -> Result<(), EncodeError> {
    match desc
        .fields()
        .find(|field| field.cardinality() == Cardinality::Required && !message.has_field(field))
    {
        Some(field) => Err(EncodeError::new(EncodeErrorKind::MissingRequiredField {
            field_name: field.name().to_owned(),
            message_name: desc.full_name().to_owned(),
        })),
        None => Ok(()),
    }
}

impl EncodeOptions {
    /// Creates a new instance of [`EncodeOptions`], with the default options.
    pub const fn new() -> Self {
        EncodeOptions {
            deny_unknown_fields: false,
            check_required_fields: true,
        }
    }

    /// Whether to error when a table contains a key that does not name a field of the message.
    ///
    /// If `false`, such keys, including all integer and boolean keys, are ignored.
    ///
    /// The default value is `false`.
    pub const fn deny_unknown_fields(mut self, yes: bool) -> Self {
        self.deny_unknown_fields = yes;
        self
    }

    /// Whether to error when a `required` field of a message built from a table is not set.
    ///
    /// Messages passed in as [`Value::Message`] are not checked.
    ///
    /// The default value is `true`.
    pub const fn check_required_fields(mut self, yes: bool) -> Self {
        self.check_required_fields = yes;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new()
    }
}
