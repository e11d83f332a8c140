//! Error types for the protobuf layer.

use std::path::PathBuf;

use nodebind_schema::SchemaError;
use thiserror::Error;

/// Result type for protobuf operations.
pub type ProtoResult<T> = Result<T, ProtoError>;

#[derive(Debug, Error)]
pub enum ProtoError {
    /// The descriptor set file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes are not a valid encoding of the target message.
    #[error("decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    /// The descriptor set refers to types or files it does not contain.
    #[error("descriptor resolution error: {0}")]
    Resolution(#[from] prost_reflect::DescriptorError),

    #[error("file not found in descriptor set: {0}")]
    FileNotFound(String),

    #[error("message `{name}` not found in file `{file}`")]
    MessageNotFound { file: String, name: String },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}
