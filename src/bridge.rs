use std::{error::Error, fmt, path::Path};

use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage};
use tracing::trace;

use crate::{
    decode_with_options, encode_with_factory, DecodeOptions, DynamicMessageFactory, EncodeError,
    EncodeOptions, ErrorCategory, ImportError, MessageFactory, Registry, Table, Value,
};

/// The operations exposed to a scripting runtime, bundling a [`Registry`] with a
/// [`MessageFactory`] and encoding options.
///
/// Types are referred to by their fully-qualified name, and failures are reported as
/// [`BridgeError`]s whose messages are suitable for raising in the runtime.
#[derive(Debug)]
pub struct Bridge {
    registry: Registry,
    factory: Box<dyn MessageFactory + Send + Sync>,
    encode_options: EncodeOptions,
    decode_options: DecodeOptions,
}

/// An error returned by an operation of a [`Bridge`].
#[derive(Debug)]
pub struct BridgeError {
    kind: BridgeErrorKind,
}

#[derive(Debug)]
enum BridgeErrorKind {
    Import(ImportError),
    NoMessageType {
        name: String,
    },
    NoPrototype {
        name: String,
    },
    BadArgument {
        position: usize,
        function: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    Encode(EncodeError),
    Decode {
        name: String,
        err: prost::DecodeError,
    },
}

impl Bridge {
    /// Creates a new bridge with an empty registry, which searches for `.proto` files in the
    /// current directory.
    pub fn new() -> Self {
        let registry = Registry::new();
        registry.add_proto_path(".");
        Bridge::with_registry(registry)
    }

    /// Creates a new bridge using `registry` to find message types.
    pub fn with_registry(registry: Registry) -> Self {
        Bridge {
            registry,
            factory: Box::new(DynamicMessageFactory),
            encode_options: EncodeOptions::new(),
            decode_options: DecodeOptions::new(),
        }
    }

    /// Sets the factory used to create messages.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: MessageFactory + Send + Sync + 'static,
    {
        self.factory = Box::new(factory);
        self
    }

    /// Sets the options used by [`encode`][Bridge::encode].
    pub fn encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode_options = options;
        self
    }

    /// Sets the options used by [`decode`][Bridge::decode].
    pub fn decode_options(mut self, options: DecodeOptions) -> Self {
        self.decode_options = options;
        self
    }

    /// Gets the registry of this bridge.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// See [`Registry::add_proto_path`].
    pub fn add_proto_path(&self, path: impl AsRef<Path>) {
        self.registry.add_proto_path(path)
    }

    /// See [`Registry::map_path`].
    pub fn map_path(&self, virtual_path: &str, disk_path: impl AsRef<Path>) {
        self.registry.map_path(virtual_path, disk_path)
    }

    /// Imports a `.proto` file, making its message types available.
    pub fn import_proto_file(&self, file_name: &str) -> Result<(), BridgeError> {
        self.registry
            .import(file_name)
            .map(drop)
            .map_err(|err| BridgeError::new(BridgeErrorKind::Import(err)))
    }

    /// Creates a new, zero-valued message of the given type.
    pub fn make_message(&self, type_name: &str) -> Result<DynamicMessage, BridgeError> {
        let desc = self.message_type(type_name)?;
        self.factory.new_message(&desc).ok_or_else(|| {
            BridgeError::new(BridgeErrorKind::NoPrototype {
                name: desc.full_name().to_owned(),
            })
        })
    }

    /// Encodes a table as a message of the given type.
    pub fn encode(&self, type_name: &str, value: &Value) -> Result<DynamicMessage, BridgeError> {
        if !matches!(value, Value::Table(_) | Value::Message(_)) {
            return Err(BridgeError::new(BridgeErrorKind::BadArgument {
                position: 2,
                function: "encode",
                expected: "table",
                found: value.type_name(),
            }));
        }

        let desc = self.message_type(type_name)?;
        trace!(message = desc.full_name(), "encoding table");
        encode_with_factory(&desc, value, &self.encode_options, &*self.factory)
            .map_err(|err| BridgeError::new(BridgeErrorKind::Encode(err)))
    }

    /// Encodes a table as a message of the given type, and serializes it to bytes.
    pub fn encode_to_vec(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, BridgeError> {
        self.encode(type_name, value)
            .map(|message| message.encode_to_vec())
    }

    /// Decodes a message into a table.
    pub fn decode(&self, message: &DynamicMessage) -> Table {
        trace!(message = message.descriptor().full_name(), "decoding message");
        decode_with_options(message, &self.decode_options)
    }

    /// Parses a serialized message of the given type, and decodes it into a table.
    pub fn decode_from_slice(&self, type_name: &str, bytes: &[u8]) -> Result<Table, BridgeError> {
        let desc = self.message_type(type_name)?;
        let message = DynamicMessage::decode(desc.clone(), bytes).map_err(|err| {
            BridgeError::new(BridgeErrorKind::Decode {
                name: desc.full_name().to_owned(),
                err,
            })
        })?;
        Ok(self.decode(&message))
    }

    fn message_type(&self, type_name: &str) -> Result<MessageDescriptor, BridgeError> {
        self.registry.find_message_type(type_name).ok_or_else(|| {
            BridgeError::new(BridgeErrorKind::NoMessageType {
                name: type_name.to_owned(),
            })
        })
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Bridge::new()
    }
}

impl BridgeError {
    fn new(kind: BridgeErrorKind) -> Self {
        BridgeError { kind }
    }

    /// The broad class of this error.
    pub fn category(&self) -> ErrorCategory {
        match &self.kind {
            BridgeErrorKind::Import(_) | BridgeErrorKind::NoMessageType { .. } => {
                ErrorCategory::Schema
            }
            BridgeErrorKind::NoPrototype { .. } => ErrorCategory::Allocation,
            BridgeErrorKind::BadArgument { .. } | BridgeErrorKind::Decode { .. } => {
                ErrorCategory::Shape
            }
            BridgeErrorKind::Encode(err) => err.category(),
        }
    }

    /// Gets the underlying import error, if this error was caused by a failed import.
    pub fn as_import_error(&self) -> Option<&ImportError> {
        match &self.kind {
            BridgeErrorKind::Import(err) => Some(err),
            _ => None,
        }
    }

    /// Gets the underlying encode error, if this error was caused by a failed conversion.
    pub fn as_encode_error(&self) -> Option<&EncodeError> {
        match &self.kind {
            BridgeErrorKind::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BridgeErrorKind::Import(err) => write!(f, "Failed to import: {}", err),
            BridgeErrorKind::NoMessageType { name } => write!(f, "No message type: {}", name),
            BridgeErrorKind::NoPrototype { name } => write!(f, "No prototype for {}", name),
            BridgeErrorKind::BadArgument {
                position,
                function,
                expected,
                found,
            } => write!(
                f,
                "bad argument #{} to '{}' ({} expected, got {})",
                position, function, expected, found
            ),
            BridgeErrorKind::Encode(err) => err.fmt(f),
            BridgeErrorKind::Decode { name, err } => {
                write!(f, "failed to decode '{}': {}", name, err)
            }
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            BridgeErrorKind::Import(err) => Some(err),
            BridgeErrorKind::Encode(err) => Some(err),
            BridgeErrorKind::Decode { err, .. } => Some(err),
            _ => None,
        }
    }
}
