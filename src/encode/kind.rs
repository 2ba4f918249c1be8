use std::{fmt::Display, str::FromStr};

use prost::bytes::Bytes;
use prost_reflect::{EnumDescriptor, Kind, MapKey, Value as ReflectValue};

use super::error::EncodeErrorKind;
use crate::{field::kind_name, Key, Value};

/// Converts a leaf value to the scalar or enum `kind`.
pub(super) fn encode_scalar(kind: &Kind, value: &Value) -> Result<ReflectValue, EncodeErrorKind> {
    match kind {
        Kind::Double => encode_double(value).map(ReflectValue::F64),
        Kind::Float => encode_float(value).map(ReflectValue::F32),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            encode_integer(value, kind_name(kind)).map(ReflectValue::I32)
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            encode_integer(value, kind_name(kind)).map(ReflectValue::I64)
        }
        Kind::Uint32 | Kind::Fixed32 => {
            encode_integer(value, kind_name(kind)).map(ReflectValue::U32)
        }
        Kind::Uint64 | Kind::Fixed64 => {
            encode_integer(value, kind_name(kind)).map(ReflectValue::U64)
        }
        Kind::Bool => encode_bool(value).map(ReflectValue::Bool),
        Kind::String => encode_string(value).map(ReflectValue::String),
        Kind::Bytes => encode_bytes(value).map(ReflectValue::Bytes),
        Kind::Enum(desc) => encode_enum(desc, value).map(ReflectValue::EnumNumber),
        Kind::Message(_) => unreachable!("message values are encoded by the caller"),
    }
}

/// Converts a table key to the key type of a map field.
pub(super) fn encode_map_key(kind: &Kind, key: &Key) -> Result<MapKey, EncodeErrorKind> {
    let result = match kind {
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => integer_key(key).map(MapKey::I32),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => integer_key(key).map(MapKey::I64),
        Kind::Uint32 | Kind::Fixed32 => integer_key(key).map(MapKey::U32),
        Kind::Uint64 | Kind::Fixed64 => integer_key(key).map(MapKey::U64),
        Kind::Bool => match key {
            Key::Boolean(key) => Some(MapKey::Bool(*key)),
            Key::String(key) => bool::from_str(key).ok().map(MapKey::Bool),
            Key::Integer(_) => None,
        },
        Kind::String => match key {
            Key::String(key) => Some(MapKey::String(key.clone())),
            Key::Integer(key) => Some(MapKey::String(key.to_string())),
            Key::Boolean(_) => None,
        },
        _ => unreachable!("invalid type for map key"),
    };

    result.ok_or_else(|| EncodeErrorKind::InvalidMapKey {
        key: key.to_string(),
        expected: kind_name(kind),
    })
}

trait Integer: TryFrom<i128> + FromStr + Display + Copy {
    const MIN: Self;
    const MAX: Self;
}

macro_rules! impl_integer {
    ($($ty:ty),*) => {
        $(
            impl Integer for $ty {
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;
            }
        )*
    };
}

impl_integer!(i32, i64, u32, u64);

fn encode_integer<T: Integer>(value: &Value, expected: &'static str) -> Result<T, EncodeErrorKind> {
    let wide = match value {
        Value::Integer(v) => i128::from(*v),
        Value::Number(v) => float_to_integer(*v, expected)?,
        Value::String(v) => {
            let trimmed = v.trim();
            match i128::from_str(trimmed) {
                Ok(v) => v,
                Err(_) => match f64::from_str(trimmed) {
                    Ok(v) => float_to_integer(v, expected)?,
                    Err(_) => {
                        return Err(EncodeErrorKind::InvalidNumber {
                            expected,
                            actual: v.clone(),
                        })
                    }
                },
            }
        }
        value => {
            return Err(EncodeErrorKind::UnexpectedType {
                expected: "number",
                found: value.type_name(),
            })
        }
    };

    T::try_from(wide).map_err(|_| EncodeErrorKind::ValueOutOfRange {
        expected,
        actual: wide.to_string(),
        min: T::MIN.to_string(),
        max: T::MAX.to_string(),
    })
}

fn float_to_integer(v: f64, expected: &'static str) -> Result<i128, EncodeErrorKind> {
    if !v.is_finite() || v.fract() != 0.0 {
        return Err(EncodeErrorKind::NotAnInteger {
            expected,
            actual: v.to_string(),
        });
    }

    // Every integral f64 below 2^127 in magnitude is exactly representable as i128; larger
    // values saturate, which is out of range for any field type.
    Ok(v as i128)
}

fn integer_key<T: Integer>(key: &Key) -> Option<T> {
    match key {
        Key::Integer(key) => T::try_from(i128::from(*key)).ok(),
        Key::String(key) => T::from_str(key).ok(),
        Key::Boolean(_) => None,
    }
}

fn encode_double(value: &Value) -> Result<f64, EncodeErrorKind> {
    match value {
        Value::Number(v) => Ok(*v),
        Value::Integer(v) => Ok(*v as f64),
        Value::String(v) => f64::from_str(v.trim()).map_err(|_| EncodeErrorKind::InvalidNumber {
            expected: "double",
            actual: v.clone(),
        }),
        value => Err(EncodeErrorKind::UnexpectedType {
            expected: "number",
            found: value.type_name(),
        }),
    }
}

fn encode_float(value: &Value) -> Result<f32, EncodeErrorKind> {
    let v = match value {
        Value::String(v) => f64::from_str(v.trim()).map_err(|_| EncodeErrorKind::InvalidNumber {
            expected: "float",
            actual: v.clone(),
        })?,
        value => encode_double(value)?,
    };

    let narrowed = v as f32;
    if v.is_finite() && narrowed.is_infinite() {
        Err(EncodeErrorKind::ValueOutOfRange {
            expected: "float",
            actual: v.to_string(),
            min: f32::MIN.to_string(),
            max: f32::MAX.to_string(),
        })
    } else {
        Ok(narrowed)
    }
}

fn encode_bool(value: &Value) -> Result<bool, EncodeErrorKind> {
    match value {
        Value::Boolean(v) => Ok(*v),
        value => Err(EncodeErrorKind::UnexpectedType {
            expected: "boolean",
            found: value.type_name(),
        }),
    }
}

fn encode_string(value: &Value) -> Result<String, EncodeErrorKind> {
    match value {
        Value::String(v) => Ok(v.clone()),
        Value::Bytes(v) => {
            String::from_utf8(v.to_vec()).map_err(|_| EncodeErrorKind::InvalidUtf8)
        }
        value => Err(EncodeErrorKind::UnexpectedType {
            expected: "string",
            found: value.type_name(),
        }),
    }
}

fn encode_bytes(value: &Value) -> Result<Bytes, EncodeErrorKind> {
    match value {
        Value::Bytes(v) => Ok(v.clone()),
        Value::String(v) => Ok(Bytes::from(v.clone().into_bytes())),
        value => Err(EncodeErrorKind::UnexpectedType {
            expected: "string",
            found: value.type_name(),
        }),
    }
}

fn encode_enum(desc: &EnumDescriptor, value: &Value) -> Result<i32, EncodeErrorKind> {
    match value {
        Value::String(name) => match desc.get_value_by_name(name) {
            Some(enum_value) => Ok(enum_value.number()),
            None => Err(EncodeErrorKind::EnumValueNotFound {
                value_name: name.clone(),
                enum_name: desc.full_name().to_owned(),
            }),
        },
        Value::Integer(_) | Value::Number(_) => {
            let number: i32 = encode_integer(value, "enum")?;
            match desc.get_value(number) {
                Some(_) => Ok(number),
                None => Err(EncodeErrorKind::EnumValueNotFound {
                    value_name: number.to_string(),
                    enum_name: desc.full_name().to_owned(),
                }),
            }
        }
        value => Err(EncodeErrorKind::UnexpectedType {
            expected: "enum name or number",
            found: value.type_name(),
        }),
    }
}
