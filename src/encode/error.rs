use std::{
    error::Error,
    fmt::{self, Display, Write},
};

use miette::Diagnostic;

use crate::Key;

/// The broad class of a conversion failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The schema does not define the requested type or field, or could not be imported.
    Schema,
    /// A value has the wrong shape, for example a scalar where a table was required.
    Shape,
    /// A value has the right shape but cannot be converted to the field's type, for example an
    /// out-of-range integer or an unknown enum value name.
    Coercion,
    /// No message instance could be created for an otherwise valid message type.
    Allocation,
}

/// An error that may occur while encoding a [`Value`][crate::Value] into a message.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeError {
    kind: EncodeErrorKind,
    // Innermost segment first.
    path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq)]
enum PathSegment {
    Field(String),
    Index(usize),
    Key(Key),
}

#[derive(Debug, Clone, PartialEq, Diagnostic)]
pub(crate) enum EncodeErrorKind {
    ExpectedTable {
        found: &'static str,
    },
    #[diagnostic(help("repeated fields require a table with the keys 1, 2, ..., n"))]
    ExpectedSequence,
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    MessageTypeMismatch {
        expected: String,
        found: String,
    },
    #[diagnostic(help("the value must be between {min} and {max} inclusive"))]
    ValueOutOfRange {
        expected: &'static str,
        actual: String,
        min: String,
        max: String,
    },
    #[diagnostic(help("integer fields only accept numbers without a fractional part"))]
    NotAnInteger {
        expected: &'static str,
        actual: String,
    },
    InvalidNumber {
        expected: &'static str,
        actual: String,
    },
    InvalidUtf8,
    EnumValueNotFound {
        value_name: String,
        enum_name: String,
    },
    InvalidMapKey {
        key: String,
        expected: &'static str,
    },
    FieldNotFound {
        field_name: String,
        message_name: String,
    },
    MissingRequiredField {
        field_name: String,
        message_name: String,
    },
    NoPrototype {
        message_name: String,
    },
    InvalidValue {
        message: String,
    },
}

impl EncodeError {
    pub(crate) fn new(kind: EncodeErrorKind) -> Self {
        EncodeError {
            kind,
            path: Vec::new(),
        }
    }

    pub(crate) fn in_field(mut self, name: &str) -> Self {
        self.path.push(PathSegment::Field(name.to_owned()));
        self
    }

    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.path.push(PathSegment::Index(index));
        self
    }

    pub(crate) fn at_key(mut self, key: Key) -> Self {
        self.path.push(PathSegment::Key(key));
        self
    }

    /// The broad class of this error.
    pub fn category(&self) -> ErrorCategory {
        match self.kind {
            EncodeErrorKind::FieldNotFound { .. } => ErrorCategory::Schema,
            EncodeErrorKind::ExpectedTable { .. }
            | EncodeErrorKind::ExpectedSequence
            | EncodeErrorKind::UnexpectedType { .. }
            | EncodeErrorKind::MessageTypeMismatch { .. }
            | EncodeErrorKind::MissingRequiredField { .. }
            | EncodeErrorKind::InvalidValue { .. } => ErrorCategory::Shape,
            EncodeErrorKind::ValueOutOfRange { .. }
            | EncodeErrorKind::NotAnInteger { .. }
            | EncodeErrorKind::InvalidNumber { .. }
            | EncodeErrorKind::InvalidUtf8
            | EncodeErrorKind::EnumValueNotFound { .. }
            | EncodeErrorKind::InvalidMapKey { .. } => ErrorCategory::Coercion,
            EncodeErrorKind::NoPrototype { .. } => ErrorCategory::Allocation,
        }
    }

    /// The location of the offending value within the input, for example `points[2].x`.
    ///
    /// List indices are 1-based. The path is empty if the error occurred at the top level.
    pub fn path(&self) -> String {
        let mut result = String::new();
        for segment in self.path.iter().rev() {
            match segment {
                PathSegment::Field(name) if result.is_empty() => result.push_str(name),
                PathSegment::Field(name) => {
                    result.push('.');
                    result.push_str(name);
                }
                PathSegment::Index(index) => {
                    let _ = write!(result, "[{}]", index);
                }
                PathSegment::Key(key) => {
                    let _ = write!(result, "[{}]", key);
                }
            }
        }
        result
    }
}

impl Display for EncodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeErrorKind::ExpectedTable { found } => {
                write!(f, "table expected, got {}", found)
            }
            EncodeErrorKind::ExpectedSequence => write!(
                f,
                "array-shaped table expected, got a table with non-sequential keys"
            ),
            EncodeErrorKind::UnexpectedType { expected, found } => {
                write!(f, "{} expected, got {}", expected, found)
            }
            EncodeErrorKind::MessageTypeMismatch { expected, found } => write!(
                f,
                "message of type '{}' expected, got '{}'",
                expected, found
            ),
            EncodeErrorKind::ValueOutOfRange {
                expected, actual, ..
            } => write!(
                f,
                "expected value to be {}, but the value {} is out of range",
                expected, actual
            ),
            EncodeErrorKind::NotAnInteger { expected, actual } => write!(
                f,
                "expected value to be {}, but the number {} is not an integer",
                expected, actual
            ),
            EncodeErrorKind::InvalidNumber { expected, actual } => write!(
                f,
                "expected value to be {}, but the string '{}' is not a number",
                expected, actual
            ),
            EncodeErrorKind::InvalidUtf8 => write!(f, "string is not valid utf-8"),
            EncodeErrorKind::EnumValueNotFound {
                value_name,
                enum_name,
            } => write!(f, "unknown value '{}' for enum '{}'", value_name, enum_name),
            EncodeErrorKind::InvalidMapKey { key, expected } => {
                write!(f, "invalid key {} for map with {} keys", key, expected)
            }
            EncodeErrorKind::FieldNotFound {
                field_name,
                message_name,
            } => write!(
                f,
                "field '{}' not found for message '{}'",
                field_name, message_name
            ),
            EncodeErrorKind::MissingRequiredField {
                field_name,
                message_name,
            } => write!(
                f,
                "required field '{}' of message '{}' is not set",
                field_name, message_name
            ),
            EncodeErrorKind::NoPrototype { message_name } => {
                write!(f, "no prototype for '{}'", message_name)
            }
            EncodeErrorKind::InvalidValue { message } => write!(f, "{}", message),
        }
    }
}

impl Error for EncodeErrorKind {}

impl Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            self.kind.fmt(f)
        } else {
            write!(f, "field '{}': {}", self.path(), self.kind)
        }
    }
}

impl Error for EncodeError {}

impl Diagnostic for EncodeError {
    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        self.kind.help()
    }
}
