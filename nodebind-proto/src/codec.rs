//! Binary round trips for statically typed messages.

use prost::Message;

use crate::error::ProtoResult;

/// Encodes `message` to the binary wire format, fields in tag order.
pub fn serialize<M: Message>(message: &M) -> ProtoResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(message.encoded_len());
    message.encode(&mut buf)?;
    Ok(buf)
}

/// Decodes a fresh message from `bytes`.
///
/// Unknown fields are skipped; truncated or malformed input is a
/// [`ProtoError::Decode`](crate::ProtoError::Decode).
pub fn deserialize<M: Message + Default>(bytes: &[u8]) -> ProtoResult<M> {
    Ok(M::decode(bytes)?)
}

/// Merges `bytes` into an existing message in place.
pub fn merge_into<M: Message>(target: &mut M, bytes: &[u8]) -> ProtoResult<()> {
    target.merge(bytes)?;
    Ok(())
}
