use std::fmt;

use prost_reflect::{DynamicMessage, MessageDescriptor};

/// Allocates zero-valued message instances for a message type.
///
/// The encoder obtains every message it builds from a factory, so an implementation can refuse
/// types for which it has no prototype.
pub trait MessageFactory {
    /// Creates a new, zero-valued message of type `desc`, or returns `None` if this factory
    /// cannot create messages of that type.
    fn new_message(&self, desc: &MessageDescriptor) -> Option<DynamicMessage>;
}

/// A [`MessageFactory`] that can create a [`DynamicMessage`] for any descriptor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicMessageFactory;

impl MessageFactory for DynamicMessageFactory {
    fn new_message(&self, desc: &MessageDescriptor) -> Option<DynamicMessage> {
        Some(DynamicMessage::new(desc.clone()))
    }
}

impl fmt::Debug for dyn MessageFactory + Send + Sync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageFactory").finish_non_exhaustive()
    }
}
