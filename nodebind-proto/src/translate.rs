//! Translating message descriptors into schema type systems.
//!
//! | protobuf | schema |
//! |---|---|
//! | implicit-presence scalar | required field |
//! | `optional`, message-typed, oneof member | `optional` field |
//! | `repeated T` | `[T]` |
//! | `map<K, V>` | `{String:V}` (keys written as strings) |
//! | enum | enum of value names |
//! | integer kinds / `float`, `double` / `bytes` | `Int` / `Float` / `Bytes` |
//!
//! Types are named by their full name without the package, nested names
//! joined by `_`. When that name is a prelude kind or already taken by a
//! type from another package, the full name is used instead (`b.Foo` becomes
//! `b_Foo`, `google.protobuf.Any` becomes `google_protobuf_Any`).

use std::collections::{HashMap, HashSet};

use nodebind_schema::{StructField, TypeDef, TypeExpr, TypeSystem, PRELUDE};
use prost_reflect::{Cardinality, EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor};
use tracing::debug;

use crate::error::ProtoResult;

/// Builds a type system describing `message` and every message and enum it
/// references. The root type is named by [`schema_type_name`].
pub fn schema_for_message(message: &MessageDescriptor) -> ProtoResult<TypeSystem> {
    let mut translator = Translator::new();
    translator.message(message)?;
    translator.system.validate()?;
    debug!(
        "Translated {} into {} schema types",
        message.full_name(),
        translator.names.len()
    );
    Ok(translator.system)
}

/// Schema name of the root type [`schema_for_message`] builds for `message`:
/// its full name without the package, with `_` joining nested names
/// (`pkg.Outer.Inner` becomes `Outer_Inner`), or the qualified name when
/// that would shadow a prelude kind.
pub fn schema_type_name(message: &MessageDescriptor) -> String {
    Translator::new()
        .claim(message.full_name(), message.package_name())
        .0
}

fn local_name(full_name: &str, package: &str) -> String {
    let local = if package.is_empty() {
        full_name
    } else {
        full_name
            .strip_prefix(package)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(full_name)
    };
    local.replace('.', "_")
}

struct Translator {
    system: TypeSystem,
    /// Proto full name to schema name.
    names: HashMap<String, String>,
    /// Schema names in use, prelude included.
    taken: HashSet<String>,
}

impl Translator {
    fn new() -> Self {
        Self {
            system: TypeSystem::new(),
            names: HashMap::new(),
            taken: PRELUDE.iter().map(|kind| kind.to_string()).collect(),
        }
    }

    /// Returns the schema name for a proto type and whether it was newly
    /// assigned.
    fn claim(&mut self, full_name: &str, package: &str) -> (String, bool) {
        if let Some(name) = self.names.get(full_name) {
            return (name.clone(), false);
        }

        let mut name = local_name(full_name, package);
        if self.taken.contains(&name) {
            name = full_name.replace('.', "_");
        }
        if self.taken.contains(&name) {
            let base = name;
            let mut n = 2;
            while self.taken.contains(&format!("{base}_{n}")) {
                n += 1;
            }
            name = format!("{base}_{n}");
        }

        self.taken.insert(name.clone());
        self.names.insert(full_name.to_string(), name.clone());
        (name, true)
    }

    fn message(&mut self, message: &MessageDescriptor) -> ProtoResult<TypeExpr> {
        let (name, new) = self.claim(message.full_name(), message.package_name());
        if !new {
            return Ok(TypeExpr::Named(name));
        }

        let mut fields = Vec::with_capacity(message.fields().len());
        for field in message.fields() {
            fields.push(self.field(&field)?);
        }
        self.system.insert(TypeDef::structure(&name, fields))?;
        Ok(TypeExpr::Named(name))
    }

    fn field(&mut self, field: &FieldDescriptor) -> ProtoResult<StructField> {
        if field.is_map() {
            if let Kind::Message(entry) = field.kind() {
                let value = self.kind(&entry.map_entry_value_field().kind())?;
                return Ok(StructField::required(field.name(), TypeExpr::map_of(value)));
            }
        }

        let ty = self.kind(&field.kind())?;
        if field.is_list() {
            return Ok(StructField::required(field.name(), TypeExpr::list_of(ty)));
        }

        if field.supports_presence() && field.cardinality() != Cardinality::Required {
            Ok(StructField::optional(field.name(), ty))
        } else {
            Ok(StructField::required(field.name(), ty))
        }
    }

    fn kind(&mut self, kind: &Kind) -> ProtoResult<TypeExpr> {
        let expr = match kind {
            Kind::Double | Kind::Float => TypeExpr::named("Float"),
            Kind::Int32
            | Kind::Int64
            | Kind::Uint32
            | Kind::Uint64
            | Kind::Sint32
            | Kind::Sint64
            | Kind::Fixed32
            | Kind::Fixed64
            | Kind::Sfixed32
            | Kind::Sfixed64 => TypeExpr::named("Int"),
            Kind::Bool => TypeExpr::named("Bool"),
            Kind::String => TypeExpr::named("String"),
            Kind::Bytes => TypeExpr::named("Bytes"),
            Kind::Message(message) => self.message(message)?,
            Kind::Enum(en) => self.enumeration(en)?,
        };
        Ok(expr)
    }

    fn enumeration(&mut self, en: &EnumDescriptor) -> ProtoResult<TypeExpr> {
        let (name, new) = self.claim(en.full_name(), en.package_name());
        if new {
            let members = en.values().map(|v| v.name().to_string()).collect();
            self.system.insert(TypeDef::enumeration(&name, members))?;
        }
        Ok(TypeExpr::Named(name))
    }
}
