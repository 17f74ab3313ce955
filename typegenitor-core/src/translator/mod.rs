//! The two-pass schema translator.
//!
//! Pass 1 reserves a unique name for every component schema so that
//! recursive bodies can refer to their own eventual name. Pass 2 fills the
//! bodies, extracting inline schemas reached through properties,
//! parameters, request bodies, and responses along the way. The shape
//! rules are applied first-match: pure additional-properties objects
//! become map aliases, primitive enums become constant-carrying wrappers,
//! compositions become merged structs or unions, and constrained
//! primitives become validating wrappers.

mod unions;

use std::collections::HashSet;

use crate::config::Config;
use crate::error::{Error, Errors, SpecError};
use crate::extensions::McpExtension;
use crate::spec::{
    AdditionalProperties, Format, Operation, ParameterLocation, PrimitiveType, Ref, Schema,
    SchemaKind, SpecModel, StatusSpec,
};
use crate::tracker::TypeTracker;
use crate::translate;
use crate::typedef::{
    EnumConstant, FieldDef, JsonDirectives, Primitive, TypeDefinition, TypeKind, TypeOrigin,
    TypeRef, ValidationKind,
};

/// Whether the schema is used from the request side, the response side,
/// or shared; decides how `readOnly`/`writeOnly` fields materialise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UsageMode {
    Shared,
    Request,
    Response,
}

/// One operation bound to its generated types.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationBinding {
    pub fn_name: String,
    pub type_prefix: String,
    pub method: http::Method,
    pub path: String,
    pub deprecated: bool,
    pub params: Vec<BoundParam>,
    pub body: Option<BoundBody>,
    pub responses: Vec<BoundResponse>,
    pub mcp: Option<McpExtension>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub spec_name: String,
    pub rust_name: String,
    pub location: ParameterLocation,
    pub type_ref: TypeRef,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundBody {
    pub type_ref: TypeRef,
    pub media_type: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundResponse {
    pub status: StatusSpec,
    pub type_ref: Option<TypeRef>,
    pub media_type: Option<String>,
}

/// The fully translated document: populated tracker plus the operation
/// bindings the planner groups into roles.
#[derive(Debug)]
pub struct Translation {
    pub tracker: TypeTracker,
    pub operations: Vec<OperationBinding>,
}

/// Translate every reachable schema of `model` into the tracker.
pub fn translate(model: &SpecModel, config: &Config) -> Result<Translation, Errors> {
    let mut translator = Translator {
        model,
        config,
        tracker: TypeTracker::new(),
        visited: HashSet::new(),
        errors: Errors::new(),
    };

    translator.pre_register_schema_names();
    translator.generate_schema_definitions();
    let operations = translator.bind_operations();

    let Translator {
        tracker, errors, ..
    } = translator;
    errors.into_result(Translation {
        tracker,
        operations,
    })
}

pub(crate) struct Translator<'a> {
    model: &'a SpecModel,
    config: &'a Config,
    pub(crate) tracker: TypeTracker,
    visited: HashSet<Ref>,
    errors: Errors,
}

impl<'a> Translator<'a> {
    /// Pass 1: reserve a name for every component schema, in document
    /// order, before any body exists.
    fn pre_register_schema_names(&mut self) {
        for (reference, schema) in self.model.schemas() {
            if schema.extensions.skip {
                log::debug!("skipping schema '{reference}' (generation disabled)");
                continue;
            }
            let desired = match &schema.extensions.rust_name {
                Some(renamed) => renamed.clone(),
                None => translate::schema_to_rust_typename(
                    reference.schema_name().unwrap_or_default(),
                ),
            };
            let assigned = self.tracker.register_name(&desired);
            log::trace!("reserved '{assigned}' for '{reference}'");
            if let Err(e) = self.tracker.register_ref(reference, &assigned) {
                self.errors.push(Error::from(e));
            }
        }
    }

    /// Pass 2: translate the body of every pre-registered schema.
    fn generate_schema_definitions(&mut self) {
        for (reference, schema) in self.model.schemas() {
            if schema.extensions.skip || self.visited.contains(&reference) {
                continue;
            }
            self.visited.insert(reference.clone());
            let Some(name) = self.tracker.lookup_by_ref(&reference).map(str::to_string) else {
                continue;
            };
            log::debug!("creating type for schema '{name}'");
            let origin = TypeOrigin::Component(reference.clone());
            match self.translate_schema(schema, &name, origin, UsageMode::Shared) {
                Ok(def) => {
                    if let Err(e) = self.tracker.attach(&name, def) {
                        self.errors.push(Error::from(e));
                    }
                }
                Err(e) => self.errors.push(e),
            }
        }
    }

    /// Translate one schema into a definition for the already-reserved
    /// `name`. First matching shape rule wins.
    pub(crate) fn translate_schema(
        &mut self,
        schema: &Schema,
        name: &str,
        origin: TypeOrigin,
        mode: UsageMode,
    ) -> Result<TypeDefinition, Error> {
        // an external type replacement overrides every shape rule
        if let Some(path) = &schema.extensions.rust_type {
            let mut def = TypeDefinition::new(
                name,
                origin,
                TypeKind::External {
                    path: path.clone(),
                    import: schema.extensions.rust_type_import.clone(),
                },
            );
            def.doc = schema.description.clone();
            return Ok(self.finish(def, schema));
        }

        let mut def = match &schema.kind {
            SchemaKind::Reference(r) => {
                let target = self.named_ref(r)?;
                let mut def = TypeDefinition::new(
                    name,
                    origin,
                    TypeKind::Alias {
                        target: TypeRef::Named(target),
                    },
                );
                def.is_alias = true;
                def
            }
            SchemaKind::AllOf(branches) => {
                self.translate_all_of(schema, branches, name, origin, mode)?
            }
            SchemaKind::AnyOf(branches) => {
                self.translate_union(schema, branches, unions::UnionFlavor::AnyOf, name, origin, mode)?
            }
            SchemaKind::OneOf(branches) => {
                self.translate_union(schema, branches, unions::UnionFlavor::OneOf, name, origin, mode)?
            }
            SchemaKind::Object {
                properties,
                required,
                additional,
            } => self.translate_object(schema, properties, required, additional, name, origin, mode)?,
            SchemaKind::Array { items } => {
                let element = match items {
                    Some(items) => self.type_ref_for(
                        items,
                        &translate::inline_type_name(name, "Item"),
                        TypeOrigin::Inline {
                            parent: name.to_string(),
                            segment: "Item".to_string(),
                        },
                        mode,
                    )?,
                    None => TypeRef::Value,
                };
                let mut def = TypeDefinition::new(name, origin, TypeKind::Array { element });
                def.is_alias = true;
                def
            }
            SchemaKind::Primitive(p) => self.translate_primitive(schema, *p, name, origin),
            SchemaKind::Any => {
                let mut def = TypeDefinition::new(
                    name,
                    origin,
                    TypeKind::Alias {
                        target: TypeRef::Value,
                    },
                );
                def.is_alias = true;
                def
            }
            SchemaKind::Null => {
                let mut def = TypeDefinition::new(
                    name,
                    origin,
                    TypeKind::Alias {
                        target: TypeRef::Unit,
                    },
                );
                def.is_alias = true;
                def.is_optional = true;
                def
            }
        };

        def.is_optional |= schema.nullable;
        Ok(self.finish(def, schema))
    }

    /// Common trailing work: constraints, docs, the `error_mapping`
    /// aliasability revocation.
    fn finish(&mut self, mut def: TypeDefinition, schema: &Schema) -> TypeDefinition {
        if def.constraints.is_empty() {
            def.constraints = schema.constraints.clone();
        }
        if def.doc.is_none() {
            def.doc = schema.description.clone();
        }
        if def.deprecated_reason.is_none() {
            def.deprecated_reason = schema.extensions.deprecated_reason.clone().or_else(|| {
                if schema.deprecated {
                    Some("deprecated".to_string())
                } else {
                    None
                }
            });
        }

        // an error-mapped type needs inherent methods, which an alias
        // cannot carry
        if self.config.error_mapping.contains_key(&def.name) && def.is_alias {
            def.is_alias = false;
            let placeholder = TypeKind::Alias {
                target: TypeRef::Unit,
            };
            let inner = match std::mem::replace(&mut def.kind, placeholder) {
                TypeKind::Alias { target } => target,
                TypeKind::Map { value } => TypeRef::Map(Box::new(value)),
                TypeKind::Array { element } => TypeRef::Vec(Box::new(element)),
                other => {
                    def.kind = other;
                    return def;
                }
            };
            def.kind = TypeKind::PrimitiveWrapper { inner };
        }
        def
    }

    fn translate_primitive(
        &mut self,
        schema: &Schema,
        primitive: PrimitiveType,
        name: &str,
        origin: TypeOrigin,
    ) -> TypeDefinition {
        let inner = self.primitive_type_ref(primitive, schema.format);

        if schema.has_enum() {
            let comparable = schema.format.is_none_or(Format::is_comparable);
            let constants = if comparable {
                self.enum_constants(schema, name)
            } else {
                Vec::new()
            };
            let mut def = TypeDefinition::new(
                name,
                origin,
                TypeKind::Enum {
                    repr: inner,
                    constants,
                },
            );
            def.can_be_constant = comparable;
            def.validation = ValidationKind::PrimitiveConstraints;
            return def;
        }

        if !schema.constraints.is_empty() {
            let mut def =
                TypeDefinition::new(name, origin, TypeKind::PrimitiveWrapper { inner });
            def.validation = ValidationKind::PrimitiveConstraints;
            return def;
        }

        let mut def = TypeDefinition::new(name, origin, TypeKind::Alias { target: inner });
        def.is_alias = true;
        def
    }

    fn enum_constants(&self, schema: &Schema, type_name: &str) -> Vec<EnumConstant> {
        let overrides = &schema.extensions.enum_names;
        let always_prefix = self.config.generate.always_prefix_enum_values;
        let mut used: Vec<String> = Vec::new();
        schema
            .enum_values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let slug = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let name = match overrides.get(i) {
                    Some(renamed) => renamed.clone(),
                    None => translate::enum_constant_name(type_name, &slug, always_prefix),
                };
                let name = translate::uncollide(&used, name);
                used.push(name.clone());
                EnumConstant {
                    name,
                    value: value.clone(),
                }
            })
            .collect()
    }

    fn primitive_type_ref(&self, primitive: PrimitiveType, format: Option<Format>) -> TypeRef {
        let p = match primitive {
            PrimitiveType::Boolean => Primitive::Bool,
            PrimitiveType::Integer => match format {
                Some(Format::Int32) => Primitive::I32,
                Some(Format::Int64) => Primitive::I64,
                _ => match self.config.generate.default_int_type.as_str() {
                    "i32" => Primitive::I32,
                    _ => Primitive::I64,
                },
            },
            PrimitiveType::Number => match format {
                Some(Format::Float) => Primitive::F32,
                _ => Primitive::F64,
            },
            PrimitiveType::String => Primitive::String,
        };
        TypeRef::Primitive(p)
    }

    #[allow(clippy::too_many_arguments)]
    fn translate_object(
        &mut self,
        schema: &Schema,
        properties: &indexmap::IndexMap<String, Schema>,
        required: &[String],
        additional: &AdditionalProperties,
        name: &str,
        origin: TypeOrigin,
        mode: UsageMode,
    ) -> Result<TypeDefinition, Error> {
        // rule 1: no declared properties plus an additional-properties
        // policy is a plain map, no wrapper struct
        if properties.is_empty() && additional.is_present() {
            let value = self.additional_value_type(additional, name, mode)?;
            let mut def = TypeDefinition::new(name, origin, TypeKind::Map { value });
            def.is_alias = true;
            return Ok(def);
        }

        let mut fields = Vec::new();
        for (prop_name, prop_schema) in properties {
            if let Some(field) =
                self.translate_field(name, prop_name, prop_schema, required, mode)?
            {
                fields.push(field);
            }
        }

        let mut def = TypeDefinition::new(name, origin, TypeKind::Struct { fields: Vec::new() });

        // rule 8: declared fields plus an invisible catch-all map
        if additional.is_present() {
            let value = self.additional_value_type(additional, name, mode)?;
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

        def.validation = plan_struct_validation(&fields);
        def.kind = TypeKind::Struct { fields };
        Ok(def)
    }

    pub(crate) fn additional_value_type(
        &mut self,
        additional: &AdditionalProperties,
        parent: &str,
        mode: UsageMode,
    ) -> Result<TypeRef, Error> {
        match additional {
            AdditionalProperties::Forbidden | AdditionalProperties::Untyped => Ok(TypeRef::Value),
            AdditionalProperties::Typed(value_schema) => self.type_ref_for(
                value_schema,
                &translate::inline_type_name(parent, "Value"),
                TypeOrigin::Inline {
                    parent: parent.to_string(),
                    segment: "Value".to_string(),
                },
                mode,
            ),
        }
    }

    pub(crate) fn translate_field(
        &mut self,
        parent: &str,
        prop_name: &str,
        prop_schema: &Schema,
        required: &[String],
        mode: UsageMode,
    ) -> Result<Option<FieldDef>, Error> {
        // inlined one-sided schemas drop the fields invisible on their side
        match mode {
            UsageMode::Request if prop_schema.read_only => return Ok(None),
            UsageMode::Response if prop_schema.write_only => return Ok(None),
            _ => (),
        }

        let ext = &prop_schema.extensions;
        let rust_name = match &ext.rust_name {
            Some(renamed) => renamed.clone(),
            None => translate::property_to_rust_fieldname(prop_name),
        };

        let candidate = translate::inline_type_name(parent, prop_name);
        let mut type_ref = self.type_ref_for(
            prop_schema,
            &candidate,
            TypeOrigin::Inline {
                parent: parent.to_string(),
                segment: prop_name.to_string(),
            },
            mode,
        )?;

        let required_flag = required.iter().any(|r| r == prop_name);
        // shared read-only/write-only fields degrade to optional
        let one_sided =
            mode == UsageMode::Shared && (prop_schema.read_only || prop_schema.write_only);
        let optional = !required_flag || one_sided || prop_schema.nullable;
        if optional && !ext.skip_optional {
            type_ref = type_ref.optional();
        }

        let validate_nested = references_named(&type_ref);
        let mut field = FieldDef::new(rust_name, prop_name, type_ref);
        field.required = required_flag;
        field.read_only = prop_schema.read_only;
        field.write_only = prop_schema.write_only;
        field.omit_empty = ext.omit_empty;
        field.json_ignore = ext.json_ignore;
        field.extra_tags = ext.extra_tags.clone();
        field.doc = prop_schema.description.clone();
        field.validate_nested = validate_nested;
        if !validate_nested {
            // constraints on an extracted type live on that type
            field.constraints = prop_schema.constraints.clone();
        }
        Ok(Some(field))
    }

    /// The type reference for a schema in some position, extracting a
    /// named inline type when the schema shapes one.
    pub(crate) fn type_ref_for(
        &mut self,
        schema: &Schema,
        candidate: &str,
        origin: TypeOrigin,
        mode: UsageMode,
    ) -> Result<TypeRef, Error> {
        if let Some(path) = &schema.extensions.rust_type {
            return Ok(TypeRef::External(path.clone()));
        }

        let type_ref = match &schema.kind {
            SchemaKind::Reference(r) => TypeRef::Named(self.named_ref(r)?),
            SchemaKind::Null => TypeRef::Unit,
            SchemaKind::Any if !schema.has_enum() => TypeRef::Value,
            SchemaKind::Primitive(p)
                if !schema.has_enum() && schema.constraints.is_empty() =>
            {
                self.primitive_type_ref(*p, schema.format)
            }
            SchemaKind::Array { items } if schema.constraints.is_empty() => {
                let element = match items {
                    Some(items) => self.type_ref_for(
                        items,
                        &translate::inline_type_name(candidate, "Item"),
                        TypeOrigin::Inline {
                            parent: candidate.to_string(),
                            segment: "Item".to_string(),
                        },
                        mode,
                    )?,
                    None => TypeRef::Value,
                };
                TypeRef::Vec(Box::new(element))
            }
            SchemaKind::Object {
                properties,
                additional,
                ..
            } if properties.is_empty()
                && additional.is_present()
                && schema.constraints.is_empty() =>
            {
                let value = self.additional_value_type(additional, candidate, mode)?;
                TypeRef::Map(Box::new(value))
            }
            _ => {
                // the schema shapes a type of its own; extract it under a
                // derived (or overridden) name
                let desired = match &schema.extensions.rust_name {
                    Some(renamed) => renamed.clone(),
                    None => candidate.to_string(),
                };
                let assigned = self.tracker.register_name(&desired);
                let def = self.translate_schema(schema, &assigned, origin, mode)?;
                self.tracker.attach(&assigned, def).map_err(Error::from)?;
                TypeRef::Named(assigned)
            }
        };

        if schema.nullable && !schema.extensions.skip_optional {
            Ok(type_ref.optional())
        } else {
            Ok(type_ref)
        }
    }

    pub(crate) fn named_ref(&self, reference: &Ref) -> Result<String, Error> {
        self.tracker
            .lookup_by_ref(reference)
            .map(str::to_string)
            .ok_or_else(|| Error::from(SpecError::unresolved(reference.as_str())))
    }

    pub(crate) fn resolve_branch<'s>(&self, branch: &'s Schema) -> Result<&'s Schema, Error>
    where
        'a: 's,
    {
        match &branch.kind {
            SchemaKind::Reference(r) => self
                .model
                .resolve(r)
                .ok_or_else(|| Error::from(SpecError::unresolved(r.as_str()))),
            _ => Ok(branch),
        }
    }

    /// Bind every operation of the (already filtered) document, creating
    /// the inline types its parameters, body, and responses shape.
    fn bind_operations(&mut self) -> Vec<OperationBinding> {
        let mut bindings = Vec::new();
        let mut fn_names: Vec<String> = Vec::new();
        for op in self.model.operations() {
            match self.bind_operation(op, &fn_names) {
                Ok(binding) => {
                    fn_names.push(binding.fn_name.clone());
                    bindings.push(binding);
                }
                Err(e) => self.errors.push(e),
            }
        }
        bindings
    }

    fn bind_operation(
        &mut self,
        op: &Operation,
        used_fn_names: &Vec<String>,
    ) -> Result<OperationBinding, Error> {
        let fn_name = translate::uncollide(
            used_fn_names,
            translate::operation_fn_name(op.operation_id.as_deref(), &op.method, &op.path),
        );
        let type_prefix =
            translate::operation_type_prefix(op.operation_id.as_deref(), &op.method, &op.path);
        log::debug!("binding operation {} {} as '{fn_name}'", op.method, op.path);

        let mut params = Vec::new();
        let mut param_names: Vec<String> = Vec::new();
        for param in &op.parameters {
            let rust_name = translate::uncollide(
                &param_names,
                translate::parameter_to_rust_fn_param(&param.name),
            );
            param_names.push(rust_name.clone());
            let mut type_ref = match &param.schema {
                Some(schema) => self.type_ref_for(
                    schema,
                    &translate::inline_type_name(&type_prefix, &param.name),
                    TypeOrigin::Parameter {
                        operation: fn_name.clone(),
                        parameter: param.name.clone(),
                    },
                    UsageMode::Request,
                )?,
                None => TypeRef::Primitive(Primitive::String),
            };
            if !param.required {
                type_ref = type_ref.optional();
            }
            params.push(BoundParam {
                spec_name: param.name.clone(),
                rust_name,
                location: param.location,
                type_ref,
                required: param.required,
            });
        }

        let body = match &op.request_body {
            Some(body_spec) => match &body_spec.schema {
                Some(schema) => {
                    let type_ref = self.type_ref_for(
                        schema,
                        &translate::inline_type_name(&type_prefix, "Body"),
                        TypeOrigin::RequestBody {
                            operation: fn_name.clone(),
                        },
                        UsageMode::Request,
                    )?;
                    Some(BoundBody {
                        type_ref,
                        media_type: body_spec.media_type.clone(),
                        required: body_spec.required,
                    })
                }
                None => None,
            },
            None => None,
        };

        let with_schema = op
            .responses
            .iter()
            .filter(|(_, r)| r.schema.is_some())
            .count();
        let mut responses = Vec::new();
        for (status, response) in &op.responses {
            let type_ref = match &response.schema {
                Some(schema) => {
                    let segment = if with_schema == 1 {
                        "Response".to_string()
                    } else {
                        format!("Response{}", translate::status_suffix(status))
                    };
                    Some(self.type_ref_for(
                        schema,
                        &translate::inline_type_name(&type_prefix, &segment),
                        TypeOrigin::Response {
                            operation: fn_name.clone(),
                            status: status.clone(),
                        },
                        UsageMode::Response,
                    )?)
                }
                None => None,
            };
            responses.push(BoundResponse {
                status: status.clone(),
                type_ref,
                media_type: response.media_type.clone(),
            });
        }

        Ok(OperationBinding {
            fn_name,
            type_prefix,
            method: op.method.clone(),
            path: op.path.clone(),
            deprecated: op.deprecated,
            params,
            body,
            responses,
            mcp: op.extensions.mcp.clone(),
        })
    }

    pub(crate) fn translate_all_of(
        &mut self,
        schema: &Schema,
        branches: &[Schema],
        name: &str,
        origin: TypeOrigin,
        mode: UsageMode,
    ) -> Result<TypeDefinition, Error> {
        unions::translate_all_of(self, schema, branches, name, origin, mode)
    }

    pub(crate) fn translate_union(
        &mut self,
        schema: &Schema,
        branches: &[Schema],
        flavor: unions::UnionFlavor,
        name: &str,
        origin: TypeOrigin,
        mode: UsageMode,
    ) -> Result<TypeDefinition, Error> {
        unions::translate_union(self, schema, branches, flavor, name, origin, mode)
    }
}

/// Whether a reference reaches a tracker-registered type somewhere inside.
fn references_named(type_ref: &TypeRef) -> bool {
    let mut names = Vec::new();
    type_ref.named_refs(&mut names);
    !names.is_empty()
}

/// A struct validates recursively when any field carries constraints or
/// descends into a validatable type.
pub(crate) fn plan_struct_validation(fields: &[FieldDef]) -> ValidationKind {
    let needs = fields
        .iter()
        .any(|f| !f.constraints.is_empty() || f.validate_nested);
    if needs {
        ValidationKind::StructRecursive
    } else {
        ValidationKind::None
    }
}

#[cfg(all(test, feature = "oas30"))]
mod test;
