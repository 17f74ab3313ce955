//! The language-facing intermediate representation: one [`TypeDefinition`]
//! per generated type, dispatched by exhaustive matching on [`TypeKind`].

use indexmap::IndexMap;
use serde_json::Value;

use crate::spec::{Constraints, Ref, StatusSpec};

/// Reference to a type by name or builtin shape.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Unit,
    /// Untyped JSON payload.
    Value,
    Primitive(Primitive),
    /// A tracker-registered type, referenced by name. This indirection is
    /// what makes recursive types representable.
    Named(String),
    Optional(Box<TypeRef>),
    Vec(Box<TypeRef>),
    /// Map from string keys to the given value type.
    Map(Box<TypeRef>),
    /// Fully qualified external path, e.g. `chrono::DateTime<chrono::Utc>`.
    External(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    I32,
    I64,
    F32,
    F64,
    String,
}

impl Primitive {
    pub fn rust_name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::String => "String",
        }
    }
}

impl TypeRef {
    pub fn optional(self) -> TypeRef {
        match self {
            TypeRef::Optional(_) => self,
            other => TypeRef::Optional(Box::new(other)),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeRef::Optional(_))
    }

    /// The names of tracker-registered types this reference touches.
    pub fn named_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeRef::Named(name) => out.push(name),
            TypeRef::Optional(inner) | TypeRef::Vec(inner) | TypeRef::Map(inner) => {
                inner.named_refs(out);
            }
            TypeRef::Unit | TypeRef::Value | TypeRef::Primitive(_) | TypeRef::External(_) => (),
        }
    }
}

/// Where a type came from; diagnostics and role grouping both key off it.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeOrigin {
    Component(Ref),
    RequestBody {
        operation: String,
    },
    Response {
        operation: String,
        status: StatusSpec,
    },
    Parameter {
        operation: String,
        parameter: String,
    },
    Inline {
        parent: String,
        segment: String,
    },
}

/// One struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub rust_name: String,
    pub wire_name: String,
    pub type_ref: TypeRef,
    pub required: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub omit_empty: bool,
    pub json_ignore: bool,
    pub extra_tags: IndexMap<String, String>,
    /// Wire-invisible union injected by an `allOf` + union composition;
    /// custom marshalling merges it into the parent object.
    pub embedded_union: bool,
    /// Wire-invisible catch-all map for `additionalProperties`.
    pub additional_properties: bool,
    pub constraints: Constraints,
    /// Whether validation descends into the field's type.
    pub validate_nested: bool,
    pub doc: Option<String>,
}

impl FieldDef {
    pub fn new(rust_name: impl Into<String>, wire_name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            rust_name: rust_name.into(),
            wire_name: wire_name.into(),
            type_ref,
            required: false,
            read_only: false,
            write_only: false,
            omit_empty: false,
            json_ignore: false,
            extra_tags: IndexMap::new(),
            embedded_union: false,
            additional_properties: false,
            constraints: Constraints::default(),
            validate_nested: false,
            doc: None,
        }
    }

    /// Part of the default wire form (not injected, not ignored).
    pub fn on_wire(&self) -> bool {
        !self.embedded_union && !self.additional_properties && !self.json_ignore
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionVariant {
    /// Accessor label, e.g. `Email` in `as_email`.
    pub label: String,
    pub type_ref: TypeRef,
    pub discriminator_value: Option<String>,
}

/// Discriminator of a union type: property plus value-to-type-name mapping
/// in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorDef {
    pub property: String,
    pub mapping: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Struct {
        fields: Vec<FieldDef>,
    },
    Alias {
        target: TypeRef,
    },
    Map {
        value: TypeRef,
    },
    Array {
        element: TypeRef,
    },
    Enum {
        repr: TypeRef,
        constants: Vec<EnumConstant>,
    },
    UnionEither {
        a: UnionVariant,
        b: UnionVariant,
        discriminator: Option<DiscriminatorDef>,
    },
    UnionRaw {
        variants: Vec<UnionVariant>,
        discriminator: Option<DiscriminatorDef>,
    },
    PrimitiveWrapper {
        inner: TypeRef,
    },
    /// Replaced by an external type (`x-rust-type`).
    External {
        path: String,
        import: Option<String>,
    },
}

/// How validation code is planned for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationKind {
    #[default]
    None,
    PrimitiveConstraints,
    StructRecursive,
    UnionDispatch,
}

/// Whether default serde derives suffice or custom impls are required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonDirectives {
    pub custom_marshal: bool,
    pub custom_unmarshal: bool,
}

/// One generated type, fully resolved and named.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub origin: TypeOrigin,
    pub kind: TypeKind,
    pub constraints: Constraints,
    pub validation: ValidationKind,
    pub json: JsonDirectives,
    pub is_alias: bool,
    pub is_optional: bool,
    pub can_be_constant: bool,
    pub contains_unions: bool,
    pub doc: Option<String>,
    pub deprecated_reason: Option<String>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>, origin: TypeOrigin, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            origin,
            kind,
            constraints: Constraints::default(),
            validation: ValidationKind::default(),
            json: JsonDirectives::default(),
            is_alias: false,
            is_optional: false,
            can_be_constant: false,
            contains_unions: false,
            doc: None,
            deprecated_reason: None,
        }
    }

    /// Names of every tracker-registered type this definition references:
    /// struct fields, map/array elements, union variants, discriminator
    /// targets, alias targets.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match &self.kind {
            TypeKind::Struct { fields } => {
                for field in fields {
                    field.type_ref.named_refs(&mut out);
                }
            }
            TypeKind::Alias { target } => target.named_refs(&mut out),
            TypeKind::Map { value } => value.named_refs(&mut out),
            TypeKind::Array { element } => element.named_refs(&mut out),
            TypeKind::Enum { repr, .. } => repr.named_refs(&mut out),
            TypeKind::PrimitiveWrapper { inner } => inner.named_refs(&mut out),
            TypeKind::UnionEither { a, b, discriminator } => {
                a.type_ref.named_refs(&mut out);
                b.type_ref.named_refs(&mut out);
                if let Some(d) = discriminator {
                    out.extend(d.mapping.iter().map(|(_, name)| name.as_str()));
                }
            }
            TypeKind::UnionRaw {
                variants,
                discriminator,
            } => {
                for v in variants {
                    v.type_ref.named_refs(&mut out);
                }
                if let Some(d) = discriminator {
                    out.extend(d.mapping.iter().map(|(_, name)| name.as_str()));
                }
            }
            TypeKind::External { .. } => (),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_is_idempotent() {
        let t = TypeRef::Primitive(Primitive::String).optional().optional();
        assert_eq!(
            TypeRef::Optional(Box::new(TypeRef::Primitive(Primitive::String))),
            t
        );
    }

    #[test]
    fn referenced_names_cross_every_edge() {
        let def = TypeDefinition::new(
            "Holder",
            TypeOrigin::Component(Ref::component_schema("Holder")),
            TypeKind::Struct {
                fields: vec![
                    FieldDef::new("direct", "direct", TypeRef::Named("A".to_string())),
                    FieldDef::new(
                        "listed",
                        "listed",
                        TypeRef::Vec(Box::new(TypeRef::Named("B".to_string()))),
                    ),
                    FieldDef::new(
                        "mapped",
                        "mapped",
                        TypeRef::Optional(Box::new(TypeRef::Map(Box::new(TypeRef::Named(
                            "C".to_string(),
                        ))))),
                    ),
                ],
            },
        );
        assert_eq!(vec!["A", "B", "C"], def.referenced_names());
    }

    #[test]
    fn union_discriminator_targets_are_referenced() {
        let def = TypeDefinition::new(
            "Pet",
            TypeOrigin::Component(Ref::component_schema("Pet")),
            TypeKind::UnionRaw {
                variants: vec![UnionVariant {
                    label: "Cat".to_string(),
                    type_ref: TypeRef::Named("Cat".to_string()),
                    discriminator_value: Some("cat".to_string()),
                }],
                discriminator: Some(DiscriminatorDef {
                    property: "petType".to_string(),
                    mapping: vec![("cat".to_string(), "Cat".to_string())],
                }),
            },
        );
        assert_eq!(vec!["Cat", "Cat"], def.referenced_names());
    }
}
