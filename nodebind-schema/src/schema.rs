use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{SchemaError, SchemaResult};

/// Names of the kinds every type system starts with.
pub const PRELUDE: [&str; 6] = ["Bool", "String", "Bytes", "Int", "Float", "Any"];

/// A set of named type definitions.
///
/// Every system contains the prelude kinds (`Bool`, `String`, `Bytes`, `Int`,
/// `Float`, `Any`). Definitions are immutable once inserted; lookups by name
/// return a [`TypeRef`] that borrows the system.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSystem {
    types: BTreeMap<String, TypeDef>,
    /// User definitions in insertion order.
    order: Vec<String>,
}

/// A single named type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub body: TypeBody,
}

/// What a named type is.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Bool,
    String,
    Bytes,
    Int,
    Float,
    /// Any data-model value.
    Any,
    List(ListType),
    Map(MapType),
    Struct(StructType),
    Enum(EnumType),
}

/// A reference to a type from a field, list value or map value position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Named(String),
    /// Inline `[T]`.
    List {
        value: Box<TypeExpr>,
        nullable: bool,
    },
    /// Inline `{K:V}`.
    Map {
        key: String,
        value: Box<TypeExpr>,
        nullable: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListType {
    pub value: TypeExpr,
    pub value_nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapType {
    /// Name of the key type; always resolves to a string kind.
    pub key: String,
    pub value: TypeExpr,
    pub value_nullable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub fields: Vec<StructField>,
    pub representation: StructRepr,
}

/// A field of a struct type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    pub name: String,
    pub ty: TypeExpr,
    /// The field may be absent.
    pub optional: bool,
    /// The field may be present with a null value.
    pub nullable: bool,
}

/// How a struct is laid out on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StructRepr {
    /// A map keyed by field name (1:1 with the logical shape).
    #[default]
    Map,
    /// A list of field values in declaration order.
    Tuple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub members: Vec<String>,
}

impl TypeExpr {
    /// Shorthand for a reference to a named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Shorthand for an inline list of non-nullable values.
    pub fn list_of(value: TypeExpr) -> Self {
        Self::List {
            value: Box::new(value),
            nullable: false,
        }
    }

    /// Shorthand for an inline map from `String` keys.
    pub fn map_of(value: TypeExpr) -> Self {
        Self::Map {
            key: "String".to_string(),
            value: Box::new(value),
            nullable: false,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::List { value, nullable } => {
                f.write_str("[")?;
                if *nullable {
                    f.write_str("nullable ")?;
                }
                write!(f, "{value}]")
            }
            TypeExpr::Map {
                key,
                value,
                nullable,
            } => {
                write!(f, "{{{key}:")?;
                if *nullable {
                    f.write_str("nullable ")?;
                }
                write!(f, "{value}}}")
            }
        }
    }
}

impl StructField {
    /// Shorthand for a field that must always be present.
    pub fn required(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            nullable: false,
        }
    }

    /// Shorthand for a field that may be absent.
    pub fn optional(name: &str, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
            nullable: false,
        }
    }
}

impl TypeDef {
    /// Shorthand for a struct with the default map representation.
    pub fn structure(name: &str, fields: Vec<StructField>) -> Self {
        Self {
            name: name.into(),
            body: TypeBody::Struct(StructType {
                fields,
                representation: StructRepr::Map,
            }),
        }
    }

    /// Shorthand for an enum of string members.
    pub fn enumeration(name: &str, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            body: TypeBody::Enum(EnumType { members }),
        }
    }
}

impl TypeBody {
    /// Human-readable kind name, used in mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeBody::Bool => "bool",
            TypeBody::String => "string",
            TypeBody::Bytes => "bytes",
            TypeBody::Int => "int",
            TypeBody::Float => "float",
            TypeBody::Any => "any",
            TypeBody::List(_) => "list",
            TypeBody::Map(_) => "map",
            TypeBody::Struct(_) => "struct",
            TypeBody::Enum(_) => "enum",
        }
    }
}

impl Default for TypeSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeSystem {
    /// Creates a system holding only the prelude kinds.
    pub fn new() -> Self {
        let bodies = [
            TypeBody::Bool,
            TypeBody::String,
            TypeBody::Bytes,
            TypeBody::Int,
            TypeBody::Float,
            TypeBody::Any,
        ];
        let types = PRELUDE
            .iter()
            .zip(bodies)
            .map(|(name, body)| {
                (
                    name.to_string(),
                    TypeDef {
                        name: name.to_string(),
                        body,
                    },
                )
            })
            .collect();
        Self {
            types,
            order: Vec::new(),
        }
    }

    /// Adds a definition. Fails if the name is taken.
    ///
    /// References inside the definition are not resolved here; call
    /// [`TypeSystem::validate`] once all definitions are in.
    pub fn insert(&mut self, def: TypeDef) -> SchemaResult<()> {
        if self.types.contains_key(&def.name) {
            return Err(SchemaError::DuplicateType(def.name));
        }
        self.order.push(def.name.clone());
        self.types.insert(def.name.clone(), def);
        Ok(())
    }

    /// Overwrites an existing user definition in place.
    pub(crate) fn replace(&mut self, def: TypeDef) {
        if let Some(slot) = self.types.get_mut(&def.name) {
            *slot = def;
        }
    }

    /// Returns true if a type with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Looks up a type by name.
    pub fn type_by_name(&self, name: &str) -> Option<TypeRef<'_>> {
        self.types.get(name).map(|def| TypeRef {
            system: self,
            expr: TypeExpr::Named(def.name.clone()),
        })
    }

    /// Gets a definition by name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Resolves a type reference to the definition body it denotes.
    pub(crate) fn body_of<'a>(&'a self, name: &str) -> SchemaResult<&'a TypeBody> {
        self.types
            .get(name)
            .map(|def| &def.body)
            .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
    }

    /// User-defined types in the order they were declared.
    pub fn definitions(&self) -> impl Iterator<Item = &TypeDef> + '_ {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// Checks that every reference resolves and every definition is usable.
    pub fn validate(&self) -> SchemaResult<()> {
        for def in self.definitions() {
            match &def.body {
                TypeBody::List(list) => self.validate_expr(&list.value)?,
                TypeBody::Map(map) => {
                    self.validate_key(&def.name, &map.key)?;
                    self.validate_expr(&map.value)?;
                }
                TypeBody::Struct(st) => self.validate_struct(&def.name, st)?,
                TypeBody::Enum(en) => {
                    if en.members.is_empty() {
                        return Err(SchemaError::invalid(&def.name, "enum has no members"));
                    }
                    let mut seen = HashSet::new();
                    for member in &en.members {
                        if !seen.insert(member.as_str()) {
                            return Err(SchemaError::invalid(
                                &def.name,
                                format!("duplicate enum member `{member}`"),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_struct(&self, name: &str, st: &StructType) -> SchemaResult<()> {
        let mut seen = HashSet::new();
        for field in &st.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::invalid(
                    name,
                    format!("duplicate field `{}`", field.name),
                ));
            }
            if st.representation == StructRepr::Tuple && field.optional {
                return Err(SchemaError::invalid(
                    name,
                    format!(
                        "tuple representation cannot carry optional field `{}`",
                        field.name
                    ),
                ));
            }
            self.validate_expr(&field.ty)?;
        }
        Ok(())
    }

    fn validate_expr(&self, expr: &TypeExpr) -> SchemaResult<()> {
        match expr {
            TypeExpr::Named(name) => self.body_of(name).map(|_| ()),
            TypeExpr::List { value, .. } => self.validate_expr(value),
            TypeExpr::Map { key, value, .. } => {
                self.validate_key(&expr.to_string(), key)?;
                self.validate_expr(value)
            }
        }
    }

    fn validate_key(&self, owner: &str, key: &str) -> SchemaResult<()> {
        match self.body_of(key)? {
            TypeBody::String | TypeBody::Enum(_) => Ok(()),
            other => Err(SchemaError::invalid(
                owner,
                format!("map keys must be strings, not {}", other.kind_name()),
            )),
        }
    }
}

/// A handle to a type within a [`TypeSystem`].
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef<'a> {
    system: &'a TypeSystem,
    expr: TypeExpr,
}

impl<'a> TypeRef<'a> {
    /// Builds a handle from an arbitrary expression, checking it resolves.
    pub fn new(system: &'a TypeSystem, expr: TypeExpr) -> SchemaResult<Self> {
        system.validate_expr(&expr)?;
        Ok(Self { system, expr })
    }

    pub fn system(&self) -> &'a TypeSystem {
        self.system
    }

    pub fn expr(&self) -> &TypeExpr {
        &self.expr
    }

    /// The type's name, or its inline spelling for anonymous types.
    pub fn name(&self) -> String {
        self.expr.to_string()
    }
}
