//! Schema-typed views over plain Rust values.
//!
//! - [`load_schema`] parses the schema DSL into a [`TypeSystem`]
//! - [`bind`] checks a `Serialize` value against a type and returns a
//!   [`BoundNode`] that borrows it
//! - [`BoundNode::representation`] projects the view to its wire shape, which
//!   [`dagjson::encode`] writes as DAG-JSON
//! - [`bind_inferred`] binds without a schema when the value's shape is
//!   fixed by its Rust type, and fails with [`SchemaError::Uninferable`]
//!   when it is not

mod bind;
pub mod dagjson;
mod error;
mod infer;
mod node;
mod parser;
mod schema;
mod trace;

pub use bind::{bind, bind_inferred, BoundNode, Representation};
pub use error::{SchemaError, SchemaResult};
pub use infer::infer_schema;
pub use node::{Kind, Node};
pub use parser::{load_schema, load_schema_bytes};
pub use schema::{
    EnumType, ListType, MapType, StructField, StructRepr, StructType, TypeBody, TypeDef, TypeExpr,
    TypeRef, TypeSystem, PRELUDE,
};
