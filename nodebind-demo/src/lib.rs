//! The nodebind walkthrough.
//!
//! [`run`] binds a plain value to an inline schema and writes it as DAG-JSON,
//! round trips a `Person` message through the protobuf wire format, decodes
//! the same bytes as a dynamic message laid out by a descriptor set, shows
//! that the dynamic message cannot be bound without a schema, and finally
//! binds it through a schema translated from its descriptor.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use nodebind_proto::prost_reflect::{DynamicMessage, ReflectMessage};
use nodebind_proto::{
    decode_dynamic, describe_file, describe_message, deserialize, find_message,
    schema_for_message, schema_type_name, serialize, DescriptorSet, MessageNode, Person,
};
use nodebind_schema::dagjson::{self, EncodeOptions, MapSortMode};
use nodebind_schema::{bind, bind_inferred, load_schema, SchemaError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Schema the plain value is bound to.
pub const PERSON_SCHEMA: &str = r#"
type Person struct {
    Name    String
    Age     optional Int
    Friends optional [String]
}
"#;

/// Where the walkthrough finds its inputs and how it encodes.
#[derive(Debug, Clone)]
pub struct Config {
    /// Compiled `FileDescriptorSet`.
    pub descriptor_set: PathBuf,
    /// Path of the `.proto` file inside the set.
    pub proto_file: String,
    /// Short name of the message inside that file.
    pub message: String,
    /// Sort map keys canonically; otherwise keep insertion order.
    pub sort_keys: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            descriptor_set: PathBuf::from("model/descriptor.pb"),
            proto_file: "person.proto".to_string(),
            message: "Person".to_string(),
            sort_keys: true,
        }
    }
}

impl Config {
    pub fn encode_options(&self) -> EncodeOptions {
        let map_sort = if self.sort_keys {
            MapSortMode::Canonical
        } else {
            MapSortMode::Insertion
        };
        EncodeOptions { map_sort }
    }
}

/// The plain host value bound to [`PERSON_SCHEMA`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlainPerson {
    pub name: String,
    pub age: Option<i64>,
    pub friends: Option<Vec<String>>,
}

impl PlainPerson {
    pub fn michael() -> Self {
        Self {
            name: "Michael".to_string(),
            age: None,
            friends: Some(vec!["Sarah".to_string(), "Alex".to_string()]),
        }
    }
}

/// Runs every step in order, writing the walkthrough to `out`.
pub fn run(config: &Config, out: &mut impl Write) -> Result<()> {
    let options = config.encode_options();

    encode_plain(&PlainPerson::michael(), options, out)?;

    let bytes = round_trip_person(&Person::new("Alex", 20), out)?;

    let descriptors = DescriptorSet::load(&config.descriptor_set).with_context(|| {
        format!(
            "loading descriptor set {}",
            config.descriptor_set.display()
        )
    })?;
    let dynamic = decode_with_descriptor(&descriptors, config, &bytes, out)?;

    report_schemaless_bind(&dynamic, out)?;

    encode_translated(&dynamic, options, out)?;
    info!("Walkthrough complete");
    Ok(())
}

/// Binds `person` to `Person` in [`PERSON_SCHEMA`] and writes its DAG-JSON
/// representation followed by a newline.
pub fn encode_plain(person: &PlainPerson, options: EncodeOptions, out: &mut impl Write) -> Result<()> {
    let system = load_schema(PERSON_SCHEMA).context("loading the inline schema")?;
    let person_type = system
        .type_by_name("Person")
        .context("inline schema does not define `Person`")?;

    let bound = bind(person, person_type).context("binding the plain person")?;
    debug!("Bound plain value to {}", bound.type_name());

    dagjson::encode_with(&bound.representation(), &mut *out, options)
        .context("encoding the plain person")?;
    writeln!(out)?;
    Ok(())
}

/// Serializes `person`, reads it back and prints both. Returns the wire bytes.
pub fn round_trip_person(person: &Person, out: &mut impl Write) -> Result<Vec<u8>> {
    writeln!(out, "Original person: {person:?}")?;

    let bytes = serialize(person).context("serializing person")?;
    debug!("Serialized person into {} bytes", bytes.len());

    let decoded: Person = deserialize(&bytes).context("deserializing person")?;
    writeln!(out, "Deserialized person: {decoded:?}")?;

    if &decoded != person {
        bail!("person changed across the round trip: {person:?} became {decoded:?}");
    }
    Ok(bytes)
}

/// Resolves the configured file and message, prints them, and decodes
/// `bytes` as a dynamic message of that type.
pub fn decode_with_descriptor(
    descriptors: &DescriptorSet,
    config: &Config,
    bytes: &[u8],
    out: &mut impl Write,
) -> Result<DynamicMessage> {
    let file = descriptors.find_file(&config.proto_file)?;
    writeln!(out)?;
    writeln!(out, "{}", describe_file(&file))?;
    writeln!(out)?;

    let descriptor = find_message(&file, &config.message)?;
    writeln!(
        out,
        "{} message descriptor: {}",
        config.message,
        describe_message(&descriptor)
    )?;
    writeln!(out)?;

    let dynamic = decode_dynamic(descriptor, bytes)
        .with_context(|| format!("decoding {} as a dynamic message", config.message))?;
    writeln!(out, "Deserialized dynamic person: {dynamic}")?;
    Ok(dynamic)
}

/// Binds `dynamic` with no schema. This is expected to fail; the failure is
/// reported and returned so the walkthrough can continue.
pub fn report_schemaless_bind(dynamic: &DynamicMessage, out: &mut impl Write) -> Result<SchemaError> {
    match bind_inferred(dynamic) {
        Ok(bound) => bail!(
            "schema-less binding of {} unexpectedly succeeded as `{}`",
            dynamic.descriptor().full_name(),
            bound.type_name()
        ),
        Err(err) => {
            warn!("Schema-less binding failed: {}", err);
            writeln!(out, "Schema-less binding failed: {err}")?;
            Ok(err)
        }
    }
}

/// Binds `dynamic` to a schema translated from its own descriptor and
/// writes the DAG-JSON representation followed by a newline.
pub fn encode_translated(
    dynamic: &DynamicMessage,
    options: EncodeOptions,
    out: &mut impl Write,
) -> Result<()> {
    let descriptor = dynamic.descriptor();
    let system = schema_for_message(&descriptor)
        .with_context(|| format!("translating {}", descriptor.full_name()))?;
    let root = schema_type_name(&descriptor);
    let ty = system
        .type_by_name(&root)
        .with_context(|| format!("translated schema has no `{root}`"))?;

    let node = MessageNode::new(dynamic);
    let bound = bind(&node, ty).context("binding the dynamic message")?;
    dagjson::encode_with(&bound.representation(), &mut *out, options)
        .context("encoding the dynamic message")?;
    writeln!(out)?;
    Ok(())
}
