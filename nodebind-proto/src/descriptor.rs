//! Loading descriptor sets and resolving files and messages in them.
//!
//! A descriptor set is the binary `FileDescriptorSet` written by
//! `protoc --include_imports --descriptor_set_out=...`. Loading happens in
//! three steps (read, parse, resolve) so each failure keeps its own error.

use std::fs;
use std::path::Path;

use prost::Message;
use prost_reflect::{DescriptorPool, FieldDescriptor, FileDescriptor, Kind, MessageDescriptor};
use prost_types::FileDescriptorSet;
use tracing::{debug, info};

use crate::error::{ProtoError, ProtoResult};

/// Reads the raw bytes of a descriptor set file.
pub fn read_descriptor_set(path: impl AsRef<Path>) -> ProtoResult<Vec<u8>> {
    let path = path.as_ref();
    debug!("Reading descriptor set from {:?}", path);
    fs::read(path).map_err(|source| ProtoError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses bytes as a `FileDescriptorSet`.
pub fn parse_descriptor_set(bytes: &[u8]) -> ProtoResult<FileDescriptorSet> {
    Ok(FileDescriptorSet::decode(bytes)?)
}

/// A resolved set of file descriptors.
///
/// Cheap to clone; the underlying pool is reference counted.
#[derive(Debug, Clone)]
pub struct DescriptorSet {
    pool: DescriptorPool,
}

impl DescriptorSet {
    /// Reads, parses and resolves the descriptor set at `path`.
    pub fn load(path: impl AsRef<Path>) -> ProtoResult<Self> {
        let bytes = read_descriptor_set(path)?;
        Self::from_bytes(&bytes)
    }

    /// Parses and resolves an encoded descriptor set.
    pub fn from_bytes(bytes: &[u8]) -> ProtoResult<Self> {
        Self::from_file_descriptor_set(parse_descriptor_set(bytes)?)
    }

    /// Resolves cross-file references; fails if any referenced type or
    /// dependency is missing from the set.
    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> ProtoResult<Self> {
        let pool = DescriptorPool::from_file_descriptor_set(set)?;
        info!("Resolved descriptor set with {} files", pool.files().len());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// All files in the set.
    pub fn files(&self) -> impl ExactSizeIterator<Item = FileDescriptor> + '_ {
        self.pool.files()
    }

    /// Looks up a file by the path it was compiled under.
    pub fn find_file(&self, path: &str) -> ProtoResult<FileDescriptor> {
        self.pool
            .get_file_by_name(path)
            .ok_or_else(|| ProtoError::FileNotFound(path.to_string()))
    }

    /// Looks up a message anywhere in the set by its fully qualified name.
    pub fn find_message_by_full_name(&self, full_name: &str) -> ProtoResult<MessageDescriptor> {
        self.pool
            .get_message_by_name(full_name)
            .ok_or_else(|| ProtoError::MessageNotFound {
                file: "*".to_string(),
                name: full_name.to_string(),
            })
    }
}

/// Looks up a top-level message of `file` by its short name.
pub fn find_message(file: &FileDescriptor, name: &str) -> ProtoResult<MessageDescriptor> {
    file.messages()
        .find(|message| message.name() == name)
        .ok_or_else(|| ProtoError::MessageNotFound {
            file: file.name().to_string(),
            name: name.to_string(),
        })
}

/// Renders a file's path, package and top-level message names.
pub fn describe_file(file: &FileDescriptor) -> String {
    let messages: Vec<_> = file.messages().map(|m| m.name().to_string()).collect();
    format!(
        "File path: {}\nPackage name: {}\nMessages: [{}]",
        file.name(),
        file.package_name(),
        messages.join(", ")
    )
}

/// Renders a message as `full.Name { field = number: type, ... }`.
pub fn describe_message(message: &MessageDescriptor) -> String {
    let fields: Vec<_> = message
        .fields()
        .map(|field| format!("{} = {}: {}", field.name(), field.number(), field_type_name(&field)))
        .collect();
    format!("{} {{ {} }}", message.full_name(), fields.join(", "))
}

/// The `.proto` spelling of a field's type.
pub fn field_type_name(field: &FieldDescriptor) -> String {
    if field.is_map() {
        if let Kind::Message(entry) = field.kind() {
            return format!(
                "map<{}, {}>",
                kind_name(&entry.map_entry_key_field().kind()),
                kind_name(&entry.map_entry_value_field().kind())
            );
        }
    }
    let name = kind_name(&field.kind());
    if field.is_list() {
        format!("repeated {name}")
    } else {
        name
    }
}

fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".into(),
        Kind::Float => "float".into(),
        Kind::Int32 => "int32".into(),
        Kind::Int64 => "int64".into(),
        Kind::Uint32 => "uint32".into(),
        Kind::Uint64 => "uint64".into(),
        Kind::Sint32 => "sint32".into(),
        Kind::Sint64 => "sint64".into(),
        Kind::Fixed32 => "fixed32".into(),
        Kind::Fixed64 => "fixed64".into(),
        Kind::Sfixed32 => "sfixed32".into(),
        Kind::Sfixed64 => "sfixed64".into(),
        Kind::Bool => "bool".into(),
        Kind::String => "string".into(),
        Kind::Bytes => "bytes".into(),
        Kind::Message(message) => message.full_name().to_string(),
        Kind::Enum(en) => en.full_name().to_string(),
    }
}
