use prost_reflect::{FieldDescriptor, Kind};

/// How the values of a field are laid out, independent of their [`Kind`].
///
/// Together with the field's kind this selects the conversion used in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldShape {
    /// A single value, possibly part of a oneof.
    Singular,
    /// A repeated field, exchanged as an array-shaped table.
    List,
    /// A map field: a repeated field of implicit key/value entry messages, exchanged as a
    /// keyed table.
    Map,
}

impl FieldShape {
    pub(crate) fn of(field: &FieldDescriptor) -> Self {
        if field.is_map() {
            FieldShape::Map
        } else if field.is_list() {
            FieldShape::List
        } else {
            FieldShape::Singular
        }
    }
}

/// The protobuf type name of a scalar kind, used in diagnostics.
pub(crate) fn kind_name(kind: &Kind) -> &'static str {
    match kind {
        Kind::Double => "double",
        Kind::Float => "float",
        Kind::Int32 => "int32",
        Kind::Int64 => "int64",
        Kind::Uint32 => "uint32",
        Kind::Uint64 => "uint64",
        Kind::Sint32 => "sint32",
        Kind::Sint64 => "sint64",
        Kind::Fixed32 => "fixed32",
        Kind::Fixed64 => "fixed64",
        Kind::Sfixed32 => "sfixed32",
        Kind::Sfixed64 => "sfixed64",
        Kind::Bool => "bool",
        Kind::String => "string",
        Kind::Bytes => "bytes",
        Kind::Message(_) => "message",
        Kind::Enum(_) => "enum",
    }
}
