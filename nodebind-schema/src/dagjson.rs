//! DAG-JSON encoder.
//!
//! Maps become objects, lists arrays, bytes `{"/":{"bytes":"..."}}` with
//! unpadded standard base64. Map keys are written in canonical order (shorter
//! keys first, then bytewise) unless [`MapSortMode::Insertion`] is chosen.
//! A map with a `"/"` key cannot be written and is an encode error.

use std::io::Write;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::bind::Representation;
use crate::error::{SchemaError, SchemaResult};
use crate::node::Node;

/// Order in which map keys are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapSortMode {
    /// Length-first, then bytewise (RFC 7049 canonical ordering).
    #[default]
    Canonical,
    /// The order the node holds them in.
    Insertion,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeOptions {
    pub map_sort: MapSortMode,
}

/// Encodes a bound value's representation with default options.
pub fn encode<T, W>(repr: &Representation<'_, '_, T>, writer: W) -> SchemaResult<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    encode_with(repr, writer, EncodeOptions::default())
}

/// Encodes a bound value's representation.
pub fn encode_with<T, W>(
    repr: &Representation<'_, '_, T>,
    writer: W,
    options: EncodeOptions,
) -> SchemaResult<()>
where
    T: Serialize + ?Sized,
    W: Write,
{
    encode_node(&repr.to_node()?, writer, options)
}

/// Writes `node` and flushes the sink.
pub fn encode_node<W: Write>(node: &Node, mut writer: W, options: EncodeOptions) -> SchemaResult<()> {
    write_node(node, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Encodes a node to an in-memory buffer.
pub fn encode_to_vec(node: &Node, options: EncodeOptions) -> SchemaResult<Vec<u8>> {
    let mut buf = Vec::new();
    encode_node(node, &mut buf, options)?;
    Ok(buf)
}

/// Encodes a node to a `String`.
pub fn encode_to_string(node: &Node, options: EncodeOptions) -> SchemaResult<String> {
    let buf = encode_to_vec(node, options)?;
    String::from_utf8(buf).map_err(|e| SchemaError::Encode(e.to_string()))
}

fn write_json<W: Write, V: Serialize + ?Sized>(writer: &mut W, value: &V) -> SchemaResult<()> {
    serde_json::to_writer(&mut *writer, value).map_err(|e| {
        if e.is_io() {
            SchemaError::Io(e.into())
        } else {
            SchemaError::Encode(e.to_string())
        }
    })
}

fn write_node<W: Write>(node: &Node, writer: &mut W, options: EncodeOptions) -> SchemaResult<()> {
    match node {
        Node::Null => writer.write_all(b"null")?,
        Node::Bool(true) => writer.write_all(b"true")?,
        Node::Bool(false) => writer.write_all(b"false")?,
        Node::Int(i) => write!(writer, "{i}")?,
        Node::Float(f) => {
            if !f.is_finite() {
                return Err(SchemaError::Encode(format!(
                    "{f} has no DAG-JSON representation"
                )));
            }
            write_json(writer, f)?;
        }
        Node::String(s) => write_json(writer, s)?,
        Node::Bytes(b) => {
            writer.write_all(br#"{"/":{"bytes":"#)?;
            write_json(writer, &STANDARD_NO_PAD.encode(b))?;
            writer.write_all(b"}}")?;
        }
        Node::List(items) => {
            writer.write_all(b"[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    writer.write_all(b",")?;
                }
                write_node(item, writer, options)?;
            }
            writer.write_all(b"]")?;
        }
        Node::Map(entries) => {
            // "/" is reserved for bytes and links.
            if entries.iter().any(|(key, _)| key == "/") {
                return Err(SchemaError::Encode(
                    "map key \"/\" is reserved in DAG-JSON".into(),
                ));
            }
            let mut ordered: Vec<&(String, Node)> = entries.iter().collect();
            if options.map_sort == MapSortMode::Canonical {
                ordered.sort_by(|(a, _), (b, _)| {
                    a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes()))
                });
            }
            writer.write_all(b"{")?;
            for (i, (key, value)) in ordered.into_iter().enumerate() {
                if i > 0 {
                    writer.write_all(b",")?;
                }
                write_json(writer, key)?;
                writer.write_all(b":")?;
                write_node(value, writer, options)?;
            }
            writer.write_all(b"}")?;
        }
    }
    Ok(())
}
