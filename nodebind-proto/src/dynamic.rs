//! Messages whose layout comes from a descriptor at runtime.

use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage, Value};
use tracing::debug;

use crate::error::ProtoResult;

/// Creates an empty message laid out by `descriptor`.
pub fn new_dynamic(descriptor: MessageDescriptor) -> DynamicMessage {
    DynamicMessage::new(descriptor)
}

/// Decodes `bytes` against `descriptor`.
///
/// Field numbers and wire types are checked against the descriptor instead of
/// a compiled type; failure conditions match [`crate::deserialize`].
pub fn decode_dynamic(descriptor: MessageDescriptor, bytes: &[u8]) -> ProtoResult<DynamicMessage> {
    let mut message = new_dynamic(descriptor);
    message.merge(bytes)?;
    debug!(
        "Decoded {} bytes into dynamic {}",
        bytes.len(),
        message.descriptor().full_name()
    );
    Ok(message)
}

/// The fields that are set on `message`, keyed by field number.
pub fn field_values(message: &DynamicMessage) -> Vec<(u32, Value)> {
    message
        .fields()
        .map(|(field, value)| (field.number(), value.clone()))
        .collect()
}

/// Re-encodes a dynamic message and decodes it as the static type `M`.
pub fn to_static<M: Message + Default>(message: &DynamicMessage) -> ProtoResult<M> {
    Ok(message.transcode_to::<M>()?)
}
