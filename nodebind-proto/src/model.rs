//! Statically typed messages for `model/person.proto`.

/// `model.Person`.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Person {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub age: i32,
}

impl Person {
    pub fn new(name: impl Into<String>, age: i32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// Fully qualified name of [`Person`] in the descriptor set.
pub const PERSON_FULL_NAME: &str = "model.Person";
