//! `serde` adapter that lets a dynamic message bind to a translated schema.

use prost_reflect::{DynamicMessage, Kind, MapKey, ReflectMessage, Value};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Borrows a [`DynamicMessage`] and serializes it field by field using the
/// proto field names, in descriptor order.
///
/// Fields with explicit presence are skipped when unset; implicit-presence
/// fields are written with their default value. Enum values are written by
/// name when the number is known.
#[derive(Debug, Clone, Copy)]
pub struct MessageNode<'a> {
    message: &'a DynamicMessage,
}

impl<'a> MessageNode<'a> {
    pub fn new(message: &'a DynamicMessage) -> Self {
        Self { message }
    }

    pub fn message(&self) -> &'a DynamicMessage {
        self.message
    }
}

impl Serialize for MessageNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let descriptor = self.message.descriptor();
        let mut map = serializer.serialize_map(Some(descriptor.fields().len()))?;
        for field in descriptor.fields() {
            if field.supports_presence() && !self.message.has_field(&field) {
                continue;
            }
            let value = self.message.get_field(&field);
            let kind = match field.kind() {
                Kind::Message(entry) if field.is_map() => entry.map_entry_value_field().kind(),
                kind => kind,
            };
            map.serialize_entry(
                field.name(),
                &ValueNode {
                    value: &value,
                    kind: &kind,
                },
            )?;
        }
        map.end()
    }
}

/// A field value together with the element kind it was declared with.
struct ValueNode<'a> {
    value: &'a Value,
    kind: &'a Kind,
}

fn key_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(b) => b.to_string(),
        MapKey::I32(i) => i.to_string(),
        MapKey::I64(i) => i.to_string(),
        MapKey::U32(u) => u.to_string(),
        MapKey::U64(u) => u.to_string(),
        MapKey::String(s) => s.clone(),
    }
}

impl Serialize for ValueNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I32(i) => serializer.serialize_i32(*i),
            Value::I64(i) => serializer.serialize_i64(*i),
            Value::U32(u) => serializer.serialize_u32(*u),
            Value::U64(u) => serializer.serialize_u64(*u),
            Value::F32(f) => serializer.serialize_f32(*f),
            Value::F64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::EnumNumber(number) => {
                let name = match self.kind {
                    Kind::Enum(en) => en.get_value(*number).map(|v| v.name().to_string()),
                    _ => None,
                };
                match name {
                    Some(name) => serializer.serialize_str(&name),
                    None => serializer.serialize_i32(*number),
                }
            }
            Value::Message(message) => MessageNode::new(message).serialize(serializer),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&ValueNode {
                        value: item,
                        kind: self.kind,
                    })?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                // Sorted so insertion-order encodings are stable.
                let mut sorted: Vec<_> = entries.iter().map(|(k, v)| (key_string(k), v)).collect();
                sorted.sort_by(|a, b| a.0.cmp(&b.0));
                let mut map = serializer.serialize_map(Some(sorted.len()))?;
                for (key, value) in sorted {
                    map.serialize_entry(
                        &key,
                        &ValueNode {
                            value,
                            kind: self.kind,
                        },
                    )?;
                }
                map.end()
            }
        }
    }
}
