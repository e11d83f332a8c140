//! Error types for schema loading, binding and encoding.

use std::fmt::Display;

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading a schema, binding a value to it, or
/// encoding a bound value.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Schema text is not well-formed.
    #[error("schema parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A type name was referenced but never defined.
    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// The same type name was defined twice.
    #[error("type `{0}` is defined more than once")]
    DuplicateType(String),

    /// A definition is syntactically valid but not usable.
    #[error("invalid definition of `{name}`: {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// The bound value does not have the shape the schema declares.
    #[error("value does not match schema at `{path}`: {reason}")]
    Mismatch { path: String, reason: String },

    /// No schema was supplied and none could be derived from the value.
    #[error("cannot infer a schema at `{path}`: {reason}")]
    Uninferable { path: String, reason: String },

    /// The host value holds something outside the data model (e.g. a `u64`
    /// above `i64::MAX`).
    #[error("value cannot be represented in the data model: {0}")]
    Unrepresentable(String),

    /// The encoder met a node it cannot write.
    #[error("encode error: {0}")]
    Encode(String),

    /// The output sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    pub(crate) fn mismatch(path: &str, reason: impl Into<String>) -> Self {
        Self::Mismatch {
            path: display_path(path),
            reason: reason.into(),
        }
    }

    pub(crate) fn uninferable(path: &str, reason: impl Into<String>) -> Self {
        Self::Uninferable {
            path: display_path(path),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

impl serde::ser::Error for SchemaError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Unrepresentable(msg.to_string())
    }
}
