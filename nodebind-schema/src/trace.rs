//! Walks a host value through `serde` and records its shape.
//!
//! The trace is the only view the binder and the inferrer get of a host
//! value: struct names and field names come from the value's `Serialize`
//! impl, everything else from the data it emits.

use serde::ser::{self, Impossible, Serialize, Serializer};

use crate::error::{SchemaError, SchemaResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Traced {
    /// `Option::None`.
    Absent,
    /// `()` or a unit struct.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Seq(Vec<Traced>),
    /// A struct whose name and field names are fixed by its Rust type.
    Struct {
        name: &'static str,
        fields: Vec<(&'static str, Traced)>,
    },
    /// A map whose keys are only known once the value is walked.
    Map(Vec<(String, Traced)>),
    /// A unit enum variant.
    Variant {
        name: &'static str,
        variant: &'static str,
    },
}

impl Traced {
    pub(crate) fn describe(&self) -> String {
        match self {
            Traced::Absent => "an absent value".into(),
            Traced::Null => "null".into(),
            Traced::Bool(_) => "bool".into(),
            Traced::Int(_) => "int".into(),
            Traced::Float(_) => "float".into(),
            Traced::Str(_) => "string".into(),
            Traced::Bytes(_) => "bytes".into(),
            Traced::Seq(_) => "list".into(),
            Traced::Struct { name, .. } => format!("struct `{name}`"),
            Traced::Map(_) => "map".into(),
            Traced::Variant { name, variant } => format!("variant `{name}::{variant}`"),
        }
    }
}

pub(crate) fn trace<T: Serialize + ?Sized>(value: &T) -> SchemaResult<Traced> {
    value.serialize(Tracer)
}

fn out_of_range(v: impl std::fmt::Display) -> SchemaError {
    SchemaError::Unrepresentable(format!("{v} is outside the Int range"))
}

fn carries_data(name: &str, variant: &str) -> SchemaError {
    SchemaError::Unrepresentable(format!(
        "enum variant `{name}::{variant}` carries data"
    ))
}

struct Tracer;

impl Serializer for Tracer {
    type Ok = Traced;
    type Error = SchemaError;
    type SerializeSeq = SeqTracer;
    type SerializeTuple = SeqTracer;
    type SerializeTupleStruct = SeqTracer;
    type SerializeTupleVariant = Impossible<Traced, SchemaError>;
    type SerializeMap = MapTracer;
    type SerializeStruct = StructTracer;
    type SerializeStructVariant = Impossible<Traced, SchemaError>;

    fn serialize_bool(self, v: bool) -> SchemaResult<Traced> {
        Ok(Traced::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> SchemaResult<Traced> {
        Ok(Traced::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> SchemaResult<Traced> {
        Ok(Traced::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> SchemaResult<Traced> {
        Ok(Traced::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> SchemaResult<Traced> {
        Ok(Traced::Int(v))
    }

    fn serialize_i128(self, v: i128) -> SchemaResult<Traced> {
        i64::try_from(v).map(Traced::Int).map_err(|_| out_of_range(v))
    }

    fn serialize_u8(self, v: u8) -> SchemaResult<Traced> {
        Ok(Traced::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> SchemaResult<Traced> {
        Ok(Traced::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> SchemaResult<Traced> {
        Ok(Traced::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> SchemaResult<Traced> {
        i64::try_from(v).map(Traced::Int).map_err(|_| out_of_range(v))
    }

    fn serialize_u128(self, v: u128) -> SchemaResult<Traced> {
        i64::try_from(v).map(Traced::Int).map_err(|_| out_of_range(v))
    }

    fn serialize_f32(self, v: f32) -> SchemaResult<Traced> {
        Ok(Traced::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> SchemaResult<Traced> {
        Ok(Traced::Float(v))
    }

    fn serialize_char(self, v: char) -> SchemaResult<Traced> {
        Ok(Traced::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> SchemaResult<Traced> {
        Ok(Traced::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> SchemaResult<Traced> {
        Ok(Traced::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> SchemaResult<Traced> {
        Ok(Traced::Absent)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> SchemaResult<Traced> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> SchemaResult<Traced> {
        Ok(Traced::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> SchemaResult<Traced> {
        Ok(Traced::Null)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> SchemaResult<Traced> {
        Ok(Traced::Variant { name, variant })
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> SchemaResult<Traced> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> SchemaResult<Traced> {
        Err(carries_data(name, variant))
    }

    fn serialize_seq(self, len: Option<usize>) -> SchemaResult<SeqTracer> {
        Ok(SeqTracer {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> SchemaResult<SeqTracer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> SchemaResult<SeqTracer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> SchemaResult<Self::SerializeTupleVariant> {
        Err(carries_data(name, variant))
    }

    fn serialize_map(self, len: Option<usize>) -> SchemaResult<MapTracer> {
        Ok(MapTracer {
            entries: Vec::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> SchemaResult<StructTracer> {
        Ok(StructTracer {
            name,
            fields: Vec::with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> SchemaResult<Self::SerializeStructVariant> {
        Err(carries_data(name, variant))
    }
}

pub(crate) struct SeqTracer {
    items: Vec<Traced>,
}

impl ser::SerializeSeq for SeqTracer {
    type Ok = Traced;
    type Error = SchemaError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> SchemaResult<()> {
        self.items.push(trace(value)?);
        Ok(())
    }

    fn end(self) -> SchemaResult<Traced> {
        Ok(Traced::Seq(self.items))
    }
}

impl ser::SerializeTuple for SeqTracer {
    type Ok = Traced;
    type Error = SchemaError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> SchemaResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> SchemaResult<Traced> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqTracer {
    type Ok = Traced;
    type Error = SchemaError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> SchemaResult<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> SchemaResult<Traced> {
        ser::SerializeSeq::end(self)
    }
}

pub(crate) struct MapTracer {
    entries: Vec<(String, Traced)>,
    key: Option<String>,
}

impl ser::SerializeMap for MapTracer {
    type Ok = Traced;
    type Error = SchemaError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> SchemaResult<()> {
        let key = match trace(key)? {
            Traced::Str(s) => s,
            Traced::Int(i) => i.to_string(),
            Traced::Variant { variant, .. } => variant.to_string(),
            other => {
                return Err(SchemaError::Unrepresentable(format!(
                    "map keys must be strings, found {}",
                    other.describe()
                )));
            }
        };
        self.key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> SchemaResult<()> {
        let key = self
            .key
            .take()
            .ok_or_else(|| SchemaError::Unrepresentable("map value without a key".into()))?;
        self.entries.push((key, trace(value)?));
        Ok(())
    }

    fn end(self) -> SchemaResult<Traced> {
        Ok(Traced::Map(self.entries))
    }
}

pub(crate) struct StructTracer {
    name: &'static str,
    fields: Vec<(&'static str, Traced)>,
}

impl ser::SerializeStruct for StructTracer {
    type Ok = Traced;
    type Error = SchemaError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> SchemaResult<()> {
        self.fields.push((key, trace(value)?));
        Ok(())
    }

    fn end(self) -> SchemaResult<Traced> {
        Ok(Traced::Struct {
            name: self.name,
            fields: self.fields,
        })
    }
}
