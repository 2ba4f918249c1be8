//! This crate converts between dynamically-typed, table-shaped values, as used by embedded
//! scripting runtimes, and protobuf messages whose types are loaded from `.proto` files at
//! runtime.
//!
//! Message types are imported into a [`Registry`] and represented by
//! [`MessageDescriptor`][prost_reflect::MessageDescriptor]s from [`prost_reflect`]. A [`Value`]
//! is converted to a [`DynamicMessage`][prost_reflect::DynamicMessage] with [`encode`], and
//! back with [`decode`]. No code is generated for any message type.
//!
//! # Example
//!
//! ```no_run
//! use prost_reflect_table::{Bridge, Table, Value};
//!
//! # fn main() -> Result<(), prost_reflect_table::BridgeError> {
//! let bridge = Bridge::new();
//! bridge.add_proto_path("protos");
//! bridge.import_proto_file("geometry.proto")?;
//!
//! let point: Table = [("x", 1), ("y", 2)].into_iter().collect();
//! let points = Table::from_sequence([point.clone(), point]);
//! let path: Table = [("points", points)].into_iter().collect();
//!
//! let message = bridge.encode("geometry.Path", &Value::Table(path.clone()))?;
//! assert_eq!(bridge.decode(&message), path);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "serde1")]
extern crate serde1 as serde;

mod bridge;
mod decode;
mod encode;
mod factory;
mod field;
mod registry;
mod value;

pub use prost_reflect;

pub use self::bridge::{Bridge, BridgeError};
pub use self::decode::{decode, decode_with_options, DecodeOptions};
pub use self::encode::{
    encode, encode_with_factory, encode_with_options, EncodeError, EncodeOptions, ErrorCategory,
};
pub use self::factory::{DynamicMessageFactory, MessageFactory};
pub use self::registry::{ImportError, Registry};
pub use self::value::{Key, Table, Value};
