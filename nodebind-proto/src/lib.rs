//! Protobuf messages for the node-binding walkthrough.
//!
//! Static messages go through [`serialize`] and [`deserialize`]. Dynamic
//! messages are laid out by a [`DescriptorSet`] loaded at runtime and decoded
//! with [`decode_dynamic`]. [`schema_for_message`] turns a message descriptor
//! into a schema so a dynamic message can be bound through [`MessageNode`].

mod codec;
mod descriptor;
mod dynamic;
mod error;
mod model;
mod node;
mod translate;

pub use codec::{deserialize, merge_into, serialize};
pub use descriptor::{
    describe_file, describe_message, field_type_name, find_message, parse_descriptor_set,
    read_descriptor_set, DescriptorSet,
};
pub use dynamic::{decode_dynamic, field_values, new_dynamic, to_static};
pub use error::{ProtoError, ProtoResult};
pub use model::{Person, PERSON_FULL_NAME};
pub use node::MessageNode;
pub use translate::{schema_for_message, schema_type_name};

pub use prost_reflect;
