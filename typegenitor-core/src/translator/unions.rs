//! Composition shaping: `allOf` merging and `anyOf`/`oneOf` unions.

use crate::error::Error;
use crate::spec::{AdditionalProperties, Schema, SchemaKind};
use crate::translate;
use crate::translator::{plan_struct_validation, Translator, UsageMode};
use crate::typedef::{
    DiscriminatorDef, FieldDef, JsonDirectives, TypeDefinition, TypeKind, TypeOrigin, TypeRef,
    UnionVariant, ValidationKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnionFlavor {
    AnyOf,
    OneOf,
}

impl UnionFlavor {
    fn suffix(self) -> &'static str {
        match self {
            UnionFlavor::AnyOf => "AnyOf",
            UnionFlavor::OneOf => "OneOf",
        }
    }
}

/// Rules 3 and 7: merge the declared properties of every branch into one
/// struct, branch order, last writer wins; a union branch becomes an
/// injected wire-invisible field handled by custom marshalling.
pub(crate) fn translate_all_of(
    t: &mut Translator<'_>,
    schema: &Schema,
    branches: &[Schema],
    name: &str,
    origin: TypeOrigin,
    mode: UsageMode,
) -> Result<TypeDefinition, Error> {
    let mut fields: Vec<FieldDef> = Vec::new();
    let mut additional = AdditionalProperties::Forbidden;
    let mut union_fields: Vec<FieldDef> = Vec::new();

    for (i, branch) in branches.iter().enumerate() {
        let resolved = t.resolve_branch(branch)?.clone();
        match &resolved.kind {
            SchemaKind::Object {
                properties,
                required,
                additional: branch_additional,
            } => {
                for (prop_name, prop_schema) in properties {
                    let Some(field) =
                        t.translate_field(name, prop_name, prop_schema, required, mode)?
                    else {
                        continue;
                    };
                    match fields
                        .iter_mut()
                        .find(|existing| existing.wire_name == field.wire_name)
                    {
                        Some(existing) => *existing = field,
                        None => fields.push(field),
                    }
                }
                if branch_additional.is_present() {
                    additional = branch_additional.clone();
                }
            }
            SchemaKind::AnyOf(inner) | SchemaKind::OneOf(inner) => {
                let flavor = match resolved.kind {
                    SchemaKind::AnyOf(_) => UnionFlavor::AnyOf,
                    _ => UnionFlavor::OneOf,
                };
                let segment = format!("AllOf{i}");
                let union_name = t.tracker.register_name(&format!("{name}{segment}"));
                let inner = inner.clone();
                let def = translate_union(
                    t,
                    &resolved,
                    &inner,
                    flavor,
                    &union_name,
                    TypeOrigin::Inline {
                        parent: name.to_string(),
                        segment,
                    },
                    mode,
                )?;
                t.tracker.attach(&union_name, def).map_err(Error::from)?;

                let mut field =
                    FieldDef::new("embedded", "", TypeRef::Named(union_name));
                field.embedded_union = true;
                field.validate_nested = true;
                union_fields.push(field);
            }
            other => {
                log::debug!("allOf branch without mergeable properties ({other:?}) ignored");
            }
        }
    }

    let mut def = TypeDefinition::new(name, origin, TypeKind::Struct { fields: Vec::new() });

    if additional.is_present() {
        let value = t.additional_value_type(&additional, name, mode)?;
        let mut field = FieldDef::new(
            "additional_properties",
            "",
            TypeRef::Map(Box::new(value.clone())),
        );
        field.additional_properties = true;
        field.validate_nested = matches!(value, TypeRef::Named(_));
        fields.push(field);
        def.json = JsonDirectives {
            custom_marshal: true,
            custom_unmarshal: true,
        };
    }

    if !union_fields.is_empty() {
        let used: Vec<String> = fields.iter().map(|f| f.rust_name.clone()).collect();
        for (i, mut field) in union_fields.into_iter().enumerate() {
            let base = if i == 0 {
                "embedded".to_string()
            } else {
                format!("embedded{i}")
            };
            field.rust_name = translate::uncollide(&used, base);
            fields.push(field);
        }
        def.json = JsonDirectives {
            custom_marshal: true,
            custom_unmarshal: true,
        };
        def.contains_unions = true;
    }

    def.validation = plan_struct_validation(&fields);
    def.kind = TypeKind::Struct { fields };
    Ok(def)
}

/// Rules 4, 5, and 6: bubble up single-variant unions, pair the
/// two-variant ones, keep three-plus raw.
pub(crate) fn translate_union(
    t: &mut Translator<'_>,
    schema: &Schema,
    branches: &[Schema],
    flavor: UnionFlavor,
    name: &str,
    origin: TypeOrigin,
    mode: UsageMode,
) -> Result<TypeDefinition, Error> {
    let non_null: Vec<&Schema> = branches.iter().filter(|b| !b.is_null_variant()).collect();
    let has_null = non_null.len() != branches.len() || schema.nullable;

    match non_null.len() {
        0 => {
            let mut def = TypeDefinition::new(
                name,
                origin,
                TypeKind::Alias {
                    target: TypeRef::Value,
                },
            );
            def.is_alias = true;
            def.is_optional = true;
            Ok(def)
        }
        // rule 4: the wrapper disappears, constraints and enum values of
        // the wrapper survive on the bubbled type
        1 => {
            let inner = non_null[0];
            if let SchemaKind::Reference(r) = &inner.kind {
                let target = t.named_ref(r)?;
                let mut def = TypeDefinition::new(
                    name,
                    origin,
                    TypeKind::Alias {
                        target: TypeRef::Named(target),
                    },
                );
                def.is_alias = true;
                def.is_optional = has_null;
                def.constraints = schema.constraints.clone();
                Ok(def)
            } else {
                let mut merged = inner.clone();
                merged.constraints = schema.constraints.merged_over(&inner.constraints);
                if merged.enum_values.is_empty() {
                    merged.enum_values = schema.enum_values.clone();
                }
                if schema.extensions != crate::extensions::Extensions::default() {
                    merged.extensions = schema.extensions.clone();
                }
                let mut def = t.translate_schema(&merged, name, origin, mode)?;
                def.is_optional |= has_null;
                Ok(def)
            }
        }
        // rule 5: either-of-two with direct JSON dispatch
        2 => {
            let a = union_variant(t, non_null[0], name, flavor, 0, mode)?;
            let b = union_variant(t, non_null[1], name, flavor, 1, mode)?;
            let discriminator = discriminator_def(t, schema)?;
            let a = with_discriminator_value(a, discriminator.as_ref());
            let b = with_discriminator_value(b, discriminator.as_ref());
            let mut def = TypeDefinition::new(
                name,
                origin,
                TypeKind::UnionEither {
                    a,
                    b,
                    discriminator: discriminator.clone(),
                },
            );
            def.contains_unions = true;
            def.is_optional = has_null;
            def.validation = ValidationKind::UnionDispatch;
            if discriminator.is_some() {
                def.json = JsonDirectives {
                    custom_marshal: true,
                    custom_unmarshal: true,
                };
            }
            Ok(def)
        }
        // rule 6: three or more variants stay raw, decoded on demand
        _ => {
            let mut variants = Vec::new();
            for (i, branch) in non_null.iter().enumerate() {
                variants.push(union_variant(t, branch, name, flavor, i, mode)?);
            }
            let discriminator = discriminator_def(t, schema)?;
            let variants = variants
                .into_iter()
                .map(|v| with_discriminator_value(v, discriminator.as_ref()))
                .collect();
            let mut def = TypeDefinition::new(
                name,
                origin,
                TypeKind::UnionRaw {
                    variants,
                    discriminator,
                },
            );
            def.contains_unions = true;
            def.is_optional = has_null;
            def.validation = ValidationKind::UnionDispatch;
            Ok(def)
        }
    }
}

fn union_variant(
    t: &mut Translator<'_>,
    branch: &Schema,
    parent: &str,
    flavor: UnionFlavor,
    index: usize,
    mode: UsageMode,
) -> Result<UnionVariant, Error> {
    let segment = format!("{}{index}", flavor.suffix());
    let candidate = format!("{parent}{segment}");
    let type_ref = t.type_ref_for(
        branch,
        &candidate,
        TypeOrigin::Inline {
            parent: parent.to_string(),
            segment,
        },
        mode,
    )?;
    Ok(UnionVariant {
        label: variant_label(&type_ref, index),
        type_ref,
        discriminator_value: None,
    })
}

/// Accessor label for a variant, e.g. `Email` in `as_email`.
fn variant_label(type_ref: &TypeRef, index: usize) -> String {
    match type_ref {
        TypeRef::Named(name) => name.clone(),
        TypeRef::Primitive(p) => translate::pascal_case(p.rust_name()),
        TypeRef::External(path) => {
            let last = path.rsplit("::").next().unwrap_or(path);
            translate::pascal_case(last)
        }
        TypeRef::Vec(_) => format!("List{index}"),
        TypeRef::Map(_) => format!("Map{index}"),
        TypeRef::Value => format!("Value{index}"),
        TypeRef::Unit => format!("Unit{index}"),
        TypeRef::Optional(inner) => variant_label(inner, index),
    }
}

fn discriminator_def(
    t: &Translator<'_>,
    schema: &Schema,
) -> Result<Option<DiscriminatorDef>, Error> {
    let Some(d) = &schema.discriminator else {
        return Ok(None);
    };
    let mut mapping = Vec::new();
    for (value, reference) in &d.mapping {
        mapping.push((value.clone(), t.named_ref(reference)?));
    }
    Ok(Some(DiscriminatorDef {
        property: d.property.clone(),
        mapping,
    }))
}

/// Attach the discriminator value whose mapping targets the variant's
/// named type.
fn with_discriminator_value(
    mut variant: UnionVariant,
    discriminator: Option<&DiscriminatorDef>,
) -> UnionVariant {
    if let (Some(d), TypeRef::Named(type_name)) = (discriminator, &variant.type_ref) {
        variant.discriminator_value = d
            .mapping
            .iter()
            .find(|(_, target)| target == type_name)
            .map(|(value, _)| value.clone());
    }
    variant
}
