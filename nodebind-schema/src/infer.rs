//! Deriving a schema from a host value when none is supplied.
//!
//! Only shape that is fixed by the value's Rust type is used: serde structs
//! carry a static name and static field names, sequences and scalars carry
//! their kind. Values that serialize as maps have keys that only exist at
//! runtime (a `HashMap`, or a dynamic protobuf message whose fields come from
//! a descriptor), so no structural type can be derived from them and
//! inference fails instead of guessing.

use serde::Serialize;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{StructField, TypeBody, TypeDef, TypeExpr, TypeSystem};
use crate::trace::{trace, Traced};

/// Infers a type system and root type from `value`.
pub fn infer_schema<T: Serialize + ?Sized>(value: &T) -> SchemaResult<(TypeSystem, TypeExpr)> {
    let traced = trace(value)?;
    let mut inferrer = Inferrer {
        system: TypeSystem::new(),
    };
    let root = match inferrer.slot(&traced, "")? {
        Slot::Typed(expr) => expr,
        Slot::Null => TypeExpr::named("Any"),
        Slot::Absent => {
            return Err(SchemaError::uninferable(
                "",
                "an absent value carries no type",
            ));
        }
    };
    Ok((inferrer.system, root))
}

enum Slot {
    Absent,
    Null,
    Typed(TypeExpr),
}

struct Inferrer {
    system: TypeSystem,
}

fn join(path: &str, segment: &str) -> String {
    if path.is_empty() {
        segment.to_string()
    } else {
        format!("{path}/{segment}")
    }
}

fn is_any(expr: &TypeExpr) -> bool {
    matches!(expr, TypeExpr::Named(name) if name == "Any")
}

/// Combines two observations of the same position. `Any` stands for "not
/// observed yet" and yields to the other side.
fn unify(a: &TypeExpr, b: &TypeExpr) -> Option<TypeExpr> {
    match (a, b) {
        _ if a == b => Some(a.clone()),
        _ if is_any(a) => Some(b.clone()),
        _ if is_any(b) => Some(a.clone()),
        (
            TypeExpr::List {
                value: va,
                nullable: na,
            },
            TypeExpr::List {
                value: vb,
                nullable: nb,
            },
        ) => Some(TypeExpr::List {
            value: Box::new(unify(va, vb)?),
            nullable: *na || *nb,
        }),
        _ => None,
    }
}

impl Inferrer {
    fn slot(&mut self, value: &Traced, path: &str) -> SchemaResult<Slot> {
        let expr = match value {
            Traced::Absent => return Ok(Slot::Absent),
            Traced::Null => return Ok(Slot::Null),
            Traced::Bool(_) => TypeExpr::named("Bool"),
            Traced::Int(_) => TypeExpr::named("Int"),
            Traced::Float(_) => TypeExpr::named("Float"),
            Traced::Str(_) | Traced::Variant { .. } => TypeExpr::named("String"),
            Traced::Bytes(_) => TypeExpr::named("Bytes"),
            Traced::Seq(items) => self.list(items, path)?,
            Traced::Struct { name, fields } => self.structure(name, fields, path)?,
            Traced::Map(_) => {
                return Err(SchemaError::uninferable(
                    path,
                    "map keys are only known at runtime, so the value has no static shape; \
                     bind it with an explicit schema",
                ));
            }
        };
        Ok(Slot::Typed(expr))
    }

    fn list(&mut self, items: &[Traced], path: &str) -> SchemaResult<TypeExpr> {
        let mut nullable = false;
        let mut elem: Option<TypeExpr> = None;
        for (i, item) in items.iter().enumerate() {
            let child = join(path, &i.to_string());
            match self.slot(item, &child)? {
                Slot::Absent | Slot::Null => nullable = true,
                Slot::Typed(expr) => {
                    elem = Some(match elem {
                        None => expr,
                        Some(prev) => unify(&prev, &expr).ok_or_else(|| {
                            SchemaError::uninferable(
                                &child,
                                format!("list elements have differing shapes: `{prev}` and `{expr}`"),
                            )
                        })?,
                    });
                }
            }
        }
        Ok(TypeExpr::List {
            value: Box::new(elem.unwrap_or_else(|| TypeExpr::named("Any"))),
            nullable,
        })
    }

    fn structure(
        &mut self,
        name: &str,
        values: &[(&'static str, Traced)],
        path: &str,
    ) -> SchemaResult<TypeExpr> {
        let mut fields = Vec::with_capacity(values.len());
        for (field, value) in values {
            let field = match self.slot(value, &join(path, field))? {
                Slot::Absent => StructField::optional(field, TypeExpr::named("Any")),
                Slot::Null => StructField {
                    nullable: true,
                    ..StructField::required(field, TypeExpr::named("Any"))
                },
                Slot::Typed(expr) => StructField::required(field, expr),
            };
            fields.push(field);
        }

        let merged = match self.system.get(name) {
            None => {
                self.system.insert(TypeDef::structure(name, fields))?;
                return Ok(TypeExpr::named(name));
            }
            Some(existing) => match &existing.body {
                TypeBody::Struct(st) => merge_fields(name, &st.fields, fields, path)?,
                _ => {
                    return Err(SchemaError::uninferable(
                        path,
                        format!("struct name `{name}` collides with a built-in kind"),
                    ));
                }
            },
        };
        self.system.replace(TypeDef::structure(name, merged));
        Ok(TypeExpr::named(name))
    }
}

/// Merges a second observation of struct `name` into the first. Fields seen
/// in only one observation become optional.
fn merge_fields(
    name: &str,
    existing: &[StructField],
    mut observed: Vec<StructField>,
    path: &str,
) -> SchemaResult<Vec<StructField>> {
    let mut merged = Vec::with_capacity(existing.len().max(observed.len()));
    for field in existing {
        match observed.iter().position(|f| f.name == field.name) {
            Some(pos) => {
                let other = observed.remove(pos);
                let ty = unify(&field.ty, &other.ty).ok_or_else(|| {
                    SchemaError::uninferable(
                        &join(path, &field.name),
                        format!(
                            "field of `{name}` is observed as both `{}` and `{}`",
                            field.ty, other.ty
                        ),
                    )
                })?;
                merged.push(StructField {
                    name: field.name.clone(),
                    ty,
                    optional: field.optional || other.optional,
                    nullable: field.nullable || other.nullable,
                });
            }
            None => merged.push(StructField {
                optional: true,
                ..field.clone()
            }),
        }
    }
    merged.extend(observed.into_iter().map(|f| StructField {
        optional: true,
        ..f
    }));
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeBody;

    #[test]
    fn unify_prefers_observed_over_any() {
        let any_list = TypeExpr::list_of(TypeExpr::named("Any"));
        let int_list = TypeExpr::list_of(TypeExpr::named("Int"));
        assert_eq!(unify(&any_list, &int_list), Some(int_list.clone()));
        assert_eq!(unify(&int_list, &TypeExpr::named("String")), None);
    }

    #[test]
    fn merging_makes_one_sided_fields_optional() {
        let first = vec![
            StructField::required("a", TypeExpr::named("Int")),
            StructField::optional("b", TypeExpr::named("Any")),
        ];
        let second = vec![
            StructField::required("b", TypeExpr::named("String")),
            StructField::required("c", TypeExpr::named("Bool")),
        ];
        let merged = merge_fields("T", &first, second, "").unwrap();
        assert_eq!(merged.len(), 3);
        assert!(merged[0].optional);
        assert_eq!(merged[1].ty, TypeExpr::named("String"));
        assert!(merged[1].optional);
        assert_eq!(merged[2].name, "c");
        assert!(merged[2].optional);
    }

    #[test]
    fn root_map_is_uninferable() {
        let mut map = std::collections::HashMap::new();
        map.insert("k", 1);
        let err = infer_schema(&map).unwrap_err();
        assert!(matches!(err, SchemaError::Uninferable { .. }));
    }

    #[test]
    fn scalar_root_infers_kind() {
        let (system, root) = infer_schema("hello").unwrap();
        assert_eq!(root, TypeExpr::named("String"));
        assert!(matches!(system.get("String").unwrap().body, TypeBody::String));
    }
}
