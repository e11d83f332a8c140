//! Binding host values to schema types.

use std::borrow::Cow;

use serde::Serialize;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::infer::infer_schema;
use crate::node::Node;
use crate::schema::{StructRepr, StructType, TypeBody, TypeExpr, TypeRef, TypeSystem, PRELUDE};
use crate::trace::{trace, Traced};

/// A schema-typed view over a borrowed host value.
///
/// The view never copies the value; every projection re-walks it through its
/// `Serialize` impl. Construction checks the value against the type once, so
/// projections only fail if the value's `Serialize` impl is not deterministic.
#[derive(Debug)]
pub struct BoundNode<'a, T: ?Sized> {
    value: &'a T,
    system: Cow<'a, TypeSystem>,
    root: TypeExpr,
}

/// The wire-level projection of a [`BoundNode`].
#[derive(Debug)]
pub struct Representation<'n, 'a, T: ?Sized> {
    bound: &'n BoundNode<'a, T>,
}

/// Binds `value` to the type `ty`.
///
/// Required fields must be present and of the declared kind; optional fields
/// may be `None` or skipped; host fields the schema does not declare are a
/// mismatch.
pub fn bind<'a, T: Serialize + ?Sized>(
    value: &'a T,
    ty: TypeRef<'a>,
) -> SchemaResult<BoundNode<'a, T>> {
    let bound = BoundNode {
        value,
        system: Cow::Borrowed(ty.system()),
        root: ty.expr().clone(),
    };
    bound.node()?;
    debug!("Bound value to `{}`", bound.root);
    Ok(bound)
}

/// Binds `value` without a schema, deriving one from the value's shape.
///
/// Fails with [`SchemaError::Uninferable`] when the value's shape is only
/// known at runtime (see [`infer_schema`]).
pub fn bind_inferred<T: Serialize + ?Sized>(value: &T) -> SchemaResult<BoundNode<'_, T>> {
    let (system, root) = infer_schema(value)?;
    system.validate()?;
    let bound = BoundNode {
        value,
        system: Cow::Owned(system),
        root,
    };
    bound.node()?;
    debug!("Bound value to inferred type `{}`", bound.root);
    Ok(bound)
}

impl<'a, T: Serialize + ?Sized> BoundNode<'a, T> {
    /// The underlying host value.
    pub fn value(&self) -> &'a T {
        self.value
    }

    /// The type system the view is checked against.
    pub fn system(&self) -> &TypeSystem {
        &self.system
    }

    /// The name (or inline spelling) of the bound type.
    pub fn type_name(&self) -> String {
        self.root.to_string()
    }

    /// The logical data-model form: structs as maps in field order.
    pub fn node(&self) -> SchemaResult<Node> {
        self.project(false)
    }

    /// The representation view used by encoders.
    pub fn representation(&self) -> Representation<'_, 'a, T> {
        Representation { bound: self }
    }

    fn project(&self, repr: bool) -> SchemaResult<Node> {
        let checker = Checker {
            system: &self.system,
            repr,
        };
        checker.check_expr(&self.root, trace(self.value)?, "")
    }
}

impl<T: Serialize + ?Sized> Representation<'_, '_, T> {
    /// The data-model form after applying each struct's representation
    /// strategy.
    pub fn to_node(&self) -> SchemaResult<Node> {
        self.bound.project(true)
    }

    pub fn type_name(&self) -> String {
        self.bound.type_name()
    }
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}/{segment}")
    }
}

fn expectation(name: &str, body: &TypeBody) -> String {
    if PRELUDE.contains(&name) {
        body.kind_name().to_string()
    } else {
        format!("{} `{name}`", body.kind_name())
    }
}

struct Checker<'s> {
    system: &'s TypeSystem,
    repr: bool,
}

impl Checker<'_> {
    fn check_expr(&self, expr: &TypeExpr, value: Traced, path: &str) -> SchemaResult<Node> {
        match expr {
            TypeExpr::Named(name) => {
                let body = self.system.body_of(name)?;
                self.check_body(name, body, value, path)
            }
            TypeExpr::List { value: elem, nullable } => {
                self.check_list(elem, *nullable, value, path)
            }
            TypeExpr::Map {
                key,
                value: elem,
                nullable,
            } => self.check_map(key, elem, *nullable, value, path),
        }
    }

    /// Checks a list element or map value, which may be null when `nullable`.
    fn check_slot(
        &self,
        expr: &TypeExpr,
        nullable: bool,
        value: Traced,
        path: &str,
    ) -> SchemaResult<Node> {
        match value {
            Traced::Null | Traced::Absent if nullable => Ok(Node::Null),
            Traced::Null | Traced::Absent => Err(SchemaError::mismatch(
                path,
                format!("expected {expr}, found null in a non-nullable position"),
            )),
            value => self.check_expr(expr, value, path),
        }
    }

    fn check_body(
        &self,
        name: &str,
        body: &TypeBody,
        value: Traced,
        path: &str,
    ) -> SchemaResult<Node> {
        let mismatch = |value: &Traced| {
            SchemaError::mismatch(
                path,
                format!("expected {}, found {}", expectation(name, body), value.describe()),
            )
        };

        match (body, value) {
            (TypeBody::Bool, Traced::Bool(b)) => Ok(Node::Bool(b)),
            (TypeBody::String, Traced::Str(s)) => Ok(Node::String(s)),
            (TypeBody::Int, Traced::Int(i)) => Ok(Node::Int(i)),
            (TypeBody::Float, Traced::Float(f)) => Ok(Node::Float(f)),
            (TypeBody::Bytes, Traced::Bytes(b)) => Ok(Node::Bytes(b)),
            // Vec<u8> without serde_bytes arrives as a sequence of small ints.
            (TypeBody::Bytes, Traced::Seq(items)) => {
                let mut bytes = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item {
                        Traced::Int(b) if (0..=255).contains(&b) => bytes.push(b as u8),
                        other => {
                            return Err(SchemaError::mismatch(
                                &join(path, &i.to_string()),
                                format!("expected a byte, found {}", other.describe()),
                            ));
                        }
                    }
                }
                Ok(Node::Bytes(bytes))
            }
            (TypeBody::Any, value) => Ok(any_node(value)),
            (TypeBody::List(list), value) => {
                self.check_list(&list.value, list.value_nullable, value, path)
            }
            (TypeBody::Map(map), value) => {
                self.check_map(&map.key, &map.value, map.value_nullable, value, path)
            }
            (TypeBody::Struct(st), value) => self.check_struct(name, st, value, path),
            (TypeBody::Enum(en), Traced::Str(member)) => {
                self.check_member(name, &en.members, member, path)
            }
            (TypeBody::Enum(en), Traced::Variant { variant, .. }) => {
                self.check_member(name, &en.members, variant.to_string(), path)
            }
            (_, value) => Err(mismatch(&value)),
        }
    }

    fn check_member(
        &self,
        name: &str,
        members: &[String],
        member: String,
        path: &str,
    ) -> SchemaResult<Node> {
        if members.contains(&member) {
            Ok(Node::String(member))
        } else {
            Err(SchemaError::mismatch(
                path,
                format!("`{member}` is not a member of enum `{name}`"),
            ))
        }
    }

    fn check_list(
        &self,
        elem: &TypeExpr,
        nullable: bool,
        value: Traced,
        path: &str,
    ) -> SchemaResult<Node> {
        let items = match value {
            Traced::Seq(items) => items,
            other => {
                return Err(SchemaError::mismatch(
                    path,
                    format!("expected a list of {elem}, found {}", other.describe()),
                ));
            }
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| self.check_slot(elem, nullable, item, &join(path, &i.to_string())))
            .collect::<SchemaResult<Vec<_>>>()
            .map(Node::List)
    }

    fn check_map(
        &self,
        key: &str,
        elem: &TypeExpr,
        nullable: bool,
        value: Traced,
        path: &str,
    ) -> SchemaResult<Node> {
        let entries = match value {
            Traced::Map(entries) => entries,
            Traced::Struct { fields, .. } => fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            other => {
                return Err(SchemaError::mismatch(
                    path,
                    format!("expected a map of {elem}, found {}", other.describe()),
                ));
            }
        };

        let key_members = match self.system.body_of(key)? {
            TypeBody::Enum(en) => Some(&en.members),
            _ => None,
        };

        let mut out = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            let child = join(path, &k);
            if let Some(members) = key_members {
                if !members.contains(&k) {
                    return Err(SchemaError::mismatch(
                        &child,
                        format!("key `{k}` is not a member of enum `{key}`"),
                    ));
                }
            }
            let node = self.check_slot(elem, nullable, v, &child)?;
            out.push((k, node));
        }
        Ok(Node::Map(out))
    }

    fn check_struct(
        &self,
        name: &str,
        st: &StructType,
        value: Traced,
        path: &str,
    ) -> SchemaResult<Node> {
        let mut entries: Vec<(String, Traced)> = match value {
            Traced::Struct { fields, .. } => fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            Traced::Map(entries) => entries,
            other => {
                return Err(SchemaError::mismatch(
                    path,
                    format!("expected struct `{name}`, found {}", other.describe()),
                ));
            }
        };

        let mut fields = Vec::with_capacity(st.fields.len());
        for field in &st.fields {
            let child = join(path, &field.name);
            let value = entries
                .iter()
                .position(|(k, _)| *k == field.name)
                .map(|pos| entries.remove(pos).1);

            let node = match value {
                None | Some(Traced::Absent) => {
                    if field.optional {
                        continue;
                    }
                    if field.nullable {
                        Node::Null
                    } else {
                        return Err(SchemaError::mismatch(
                            &child,
                            format!("missing required field of struct `{name}`"),
                        ));
                    }
                }
                Some(Traced::Null) if field.nullable => Node::Null,
                Some(Traced::Null) => {
                    return Err(SchemaError::mismatch(
                        &child,
                        format!("field of struct `{name}` is not nullable"),
                    ));
                }
                Some(value) => self.check_expr(&field.ty, value, &child)?,
            };
            fields.push((field.name.clone(), node));
        }

        if let Some((extra, _)) = entries.first() {
            return Err(SchemaError::mismatch(
                &join(path, extra),
                format!("field is not declared by struct `{name}`"),
            ));
        }

        if self.repr && st.representation == StructRepr::Tuple {
            Ok(Node::List(fields.into_iter().map(|(_, v)| v).collect()))
        } else {
            Ok(Node::Map(fields))
        }
    }
}

/// Converts a traced value to a node with no schema guidance.
fn any_node(value: Traced) -> Node {
    match value {
        Traced::Absent | Traced::Null => Node::Null,
        Traced::Bool(b) => Node::Bool(b),
        Traced::Int(i) => Node::Int(i),
        Traced::Float(f) => Node::Float(f),
        Traced::Str(s) => Node::String(s),
        Traced::Bytes(b) => Node::Bytes(b),
        Traced::Seq(items) => Node::List(items.into_iter().map(any_node).collect()),
        Traced::Struct { fields, .. } => Node::Map(
            fields
                .into_iter()
                .filter(|(_, v)| *v != Traced::Absent)
                .map(|(k, v)| (k.to_string(), any_node(v)))
                .collect(),
        ),
        Traced::Map(entries) => Node::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, any_node(v)))
                .collect(),
        ),
        Traced::Variant { variant, .. } => Node::String(variant.to_string()),
    }
}
