//! OAS 3.1 adapter on the `oas3` crate.
//!
//! 3.1 drops `nullable` in favour of type arrays (`type: [string, "null"]`)
//! and adds `const`; both are folded into the common spec model here. The
//! parser keeps component maps in canonical (sorted) order, which is what
//! this adapter inherits for 3.1 documents.

use indexmap::IndexMap;
use oas3::spec::{ObjectOrReference, ObjectSchema, SchemaType, SchemaTypeSet};

use crate::error::SpecError;
use crate::extensions::Extensions;
use crate::spec::{
    AdditionalProperties, Discriminator, Format, Operation, ParameterLocation, ParameterSpec,
    PrimitiveType, Ref, RequestBodySpec, ResponseSpec, Schema, SchemaKind, SpecModel, StatusSpec,
    COMPONENT_SCHEMA_PREFIX,
};

/// Parse the raw bytes and convert into the spec model.
pub fn load(bytes: &[u8]) -> Result<SpecModel, SpecError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| SpecError::Parse(format!("input is not valid UTF-8: {e}")))?;
    let spec: oas3::Spec = serde_yaml::from_str(text).map_err(SpecError::parse)?;
    convert(&spec)
}

pub fn convert(spec: &oas3::Spec) -> Result<SpecModel, SpecError> {
    let converter = Converter { spec };
    converter.run()
}

struct Converter<'a> {
    spec: &'a oas3::Spec,
}

impl<'a> Converter<'a> {
    fn run(&self) -> Result<SpecModel, SpecError> {
        let mut schemas = IndexMap::new();
        if let Some(components) = &self.spec.components {
            for (name, oor) in &components.schemas {
                if name.starts_with("x-") {
                    return Err(SpecError::unsupported(
                        format!("{COMPONENT_SCHEMA_PREFIX}{name}"),
                        "extension-named schemas cannot be generated",
                    ));
                }
                let mut schema = self.convert_schema_oor(oor)?;
                schema.name = Some(name.clone());
                schemas.insert(name.clone(), schema);
            }
        }

        let mut operations = Vec::new();
        if let Some(paths) = &self.spec.paths {
            for (path, item) in paths {
                for (method, op) in path_item_operations(item) {
                    operations.push(self.convert_operation(path, item, method, op)?);
                }
            }
        }

        Ok(SpecModel::new(schemas, operations))
    }

    fn schema_reference(&self, ref_path: &str) -> Result<Schema, SpecError> {
        if ref_path.starts_with("#/paths/") {
            return Err(SpecError::unsupported(
                ref_path,
                "references into '#/paths/' cannot be materialised as schemas",
            ));
        }
        let name = ref_path
            .strip_prefix(COMPONENT_SCHEMA_PREFIX)
            .ok_or_else(|| SpecError::unresolved(ref_path))?;
        let exists = self
            .spec
            .components
            .as_ref()
            .is_some_and(|c| c.schemas.contains_key(name));
        if !exists {
            return Err(SpecError::unresolved(ref_path));
        }
        Ok(Schema::of_kind(SchemaKind::Reference(Ref::new(ref_path))))
    }

    fn convert_schema_oor(
        &self,
        oor: &ObjectOrReference<ObjectSchema>,
    ) -> Result<Schema, SpecError> {
        match oor {
            ObjectOrReference::Ref { ref_path, .. } => self.schema_reference(ref_path),
            ObjectOrReference::Object(schema) => self.convert_schema(schema),
        }
    }

    fn convert_schema(&self, schema: &ObjectSchema) -> Result<Schema, SpecError> {
        let mut out = Schema::default();
        out.title = schema.title.clone();
        out.description = schema.description.clone();
        out.read_only = schema.read_only.unwrap_or(false);
        out.write_only = schema.write_only.unwrap_or(false);
        out.deprecated = schema.deprecated.unwrap_or(false);
        out.format = schema.format.as_deref().and_then(convert_format);
        out.enum_values = schema.enum_values.clone();
        if out.enum_values.is_empty() {
            if let Some(constant) = &schema.const_value {
                out.enum_values = vec![constant.clone()];
            }
        }
        if let Some(d) = &schema.discriminator {
            out.discriminator = Some(self.convert_discriminator(d)?);
        }
        self.convert_constraints(schema, &mut out);

        if !schema.one_of.is_empty() {
            out.kind = SchemaKind::OneOf(self.convert_branches(&schema.one_of)?);
            return Ok(out);
        }
        if !schema.any_of.is_empty() {
            out.kind = SchemaKind::AnyOf(self.convert_branches(&schema.any_of)?);
            return Ok(out);
        }
        if !schema.all_of.is_empty() {
            out.kind = SchemaKind::AllOf(self.convert_branches(&schema.all_of)?);
            return Ok(out);
        }

        let (primary, nullable) = split_type_set(schema.schema_type.as_ref());
        out.nullable = nullable;
        match primary {
            Some(SchemaType::Object) => self.convert_object(schema, &mut out)?,
            Some(SchemaType::Array) => self.convert_array(schema, &mut out)?,
            Some(SchemaType::String) => {
                out.kind = SchemaKind::Primitive(PrimitiveType::String);
            }
            Some(SchemaType::Number) => {
                out.kind = SchemaKind::Primitive(PrimitiveType::Number);
            }
            Some(SchemaType::Integer) => {
                out.kind = SchemaKind::Primitive(PrimitiveType::Integer);
            }
            Some(SchemaType::Boolean) => {
                out.kind = SchemaKind::Primitive(PrimitiveType::Boolean);
            }
            Some(SchemaType::Null) => out.kind = SchemaKind::Null,
            None => {
                // no explicit type; object/array keywords still shape one
                if !schema.properties.is_empty() || schema.additional_properties.is_some() {
                    self.convert_object(schema, &mut out)?;
                } else if schema.items.is_some() {
                    self.convert_array(schema, &mut out)?;
                } else {
                    out.kind = SchemaKind::Any;
                }
            }
        }
        Ok(out)
    }

    fn convert_object(&self, schema: &ObjectSchema, out: &mut Schema) -> Result<(), SpecError> {
        let mut properties = IndexMap::new();
        for (name, oor) in &schema.properties {
            properties.insert(name.clone(), self.convert_schema_oor(oor)?);
        }
        let additional = match &schema.additional_properties {
            None => AdditionalProperties::Forbidden,
            Some(oas3::spec::Schema::Boolean(b)) => {
                // the boolean wrapper round-trips through its JSON form
                let allowed = serde_json::to_value(b)
                    .ok()
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                if allowed {
                    AdditionalProperties::Untyped
                } else {
                    AdditionalProperties::Forbidden
                }
            }
            Some(oas3::spec::Schema::Object(oor)) => {
                AdditionalProperties::Typed(Box::new(self.convert_schema_oor(oor)?))
            }
        };
        out.kind = SchemaKind::Object {
            properties,
            required: schema.required.clone(),
            additional,
        };
        Ok(())
    }

    fn convert_array(&self, schema: &ObjectSchema, out: &mut Schema) -> Result<(), SpecError> {
        let items = match &schema.items {
            Some(items) => match items.as_ref() {
                oas3::spec::Schema::Object(oor) => {
                    Some(Box::new(self.convert_schema_oor(oor)?))
                }
                oas3::spec::Schema::Boolean(_) => None,
            },
            None => None,
        };
        out.kind = SchemaKind::Array { items };
        Ok(())
    }

    fn convert_branches(
        &self,
        branches: &[ObjectOrReference<ObjectSchema>],
    ) -> Result<Vec<Schema>, SpecError> {
        branches
            .iter()
            .map(|oor| self.convert_schema_oor(oor))
            .collect()
    }

    fn convert_discriminator(
        &self,
        d: &oas3::spec::Discriminator,
    ) -> Result<Discriminator, SpecError> {
        let mut mapping = IndexMap::new();
        if let Some(source) = &d.mapping {
            for (value, target) in source {
                self.schema_reference(target)?;
                mapping.insert(value.clone(), Ref::new(target.clone()));
            }
        }
        Ok(Discriminator {
            property: d.property_name.clone(),
            mapping,
        })
    }

    fn convert_constraints(&self, schema: &ObjectSchema, out: &mut Schema) {
        let c = &mut out.constraints;
        c.minimum = schema.minimum.as_ref().and_then(|n| n.as_f64());
        c.maximum = schema.maximum.as_ref().and_then(|n| n.as_f64());
        // 3.1 exclusive bounds carry the bound value themselves
        if let Some(n) = schema.exclusive_minimum.as_ref().and_then(|n| n.as_f64()) {
            c.minimum = Some(n);
            c.exclusive_minimum = true;
        }
        if let Some(n) = schema.exclusive_maximum.as_ref().and_then(|n| n.as_f64()) {
            c.maximum = Some(n);
            c.exclusive_maximum = true;
        }
        c.min_length = schema.min_length;
        c.max_length = schema.max_length;
        c.pattern = schema.pattern.clone();
        c.min_items = schema.min_items;
        c.max_items = schema.max_items;
        c.min_properties = schema.min_properties;
        c.max_properties = schema.max_properties;
        c.multiple_of = schema.multiple_of.as_ref().and_then(|n| n.as_f64());
    }

    fn convert_operation(
        &self,
        path: &str,
        item: &oas3::spec::PathItem,
        method: http::Method,
        op: &oas3::spec::Operation,
    ) -> Result<Operation, SpecError> {
        let resolve_param =
            |oor: &ObjectOrReference<oas3::spec::Parameter>| -> Result<_, SpecError> {
                oor.resolve(self.spec)
                    .map_err(|e| SpecError::unresolved(e.to_string()))
            };

        let mut parameters = Vec::new();
        for oor in &item.parameters {
            let param = resolve_param(oor)?;
            let shadowed = op.parameters.iter().any(|op_oor| {
                resolve_param(op_oor)
                    .map(|p| p.name == param.name && p.location == param.location)
                    .unwrap_or(false)
            });
            if !shadowed {
                parameters.push(self.convert_parameter(&param)?);
            }
        }
        for oor in &op.parameters {
            parameters.push(self.convert_parameter(&resolve_param(oor)?)?);
        }

        let request_body = match &op.request_body {
            Some(oor) => {
                let body = oor
                    .resolve(self.spec)
                    .map_err(|e| SpecError::unresolved(e.to_string()))?;
                let (media_type, schema) = self.pick_content(&body.content)?;
                Some(RequestBodySpec {
                    required: body.required.unwrap_or(false),
                    media_type,
                    schema,
                })
            }
            None => None,
        };

        let mut responses = Vec::new();
        if let Some(source) = &op.responses {
            let mut default = None;
            for (status, oor) in source {
                let response = oor
                    .resolve(self.spec)
                    .map_err(|e| SpecError::unresolved(e.to_string()))?;
                let converted = self.convert_response(&response)?;
                let status: StatusSpec = status
                    .parse()
                    .map_err(|e: crate::spec::SpecStatusParseError| {
                        SpecError::Parse(e.to_string())
                    })?;
                if status == StatusSpec::Default {
                    default = Some((status, converted));
                } else {
                    responses.push((status, converted));
                }
            }
            responses.extend(default);
        }

        Ok(Operation {
            method,
            path: path.to_string(),
            operation_id: op.operation_id.clone(),
            tags: op.tags.clone(),
            deprecated: op.deprecated.unwrap_or(false),
            parameters,
            request_body,
            responses,
            extensions: Extensions::default(),
        })
    }

    fn convert_parameter(
        &self,
        param: &oas3::spec::Parameter,
    ) -> Result<ParameterSpec, SpecError> {
        let schema = match &param.schema {
            Some(oor) => Some(self.convert_schema_oor(oor)?),
            None => None,
        };
        Ok(ParameterSpec {
            name: param.name.clone(),
            location: convert_location(param.location),
            required: param.required.unwrap_or(false),
            schema,
            description: param.description.clone(),
            extensions: Extensions::default(),
        })
    }

    fn convert_response(
        &self,
        response: &oas3::spec::Response,
    ) -> Result<ResponseSpec, SpecError> {
        let (media_type, schema) = self.pick_content(&response.content)?;
        Ok(ResponseSpec {
            media_type,
            schema,
            description: response.description.clone(),
        })
    }

    fn pick_content(
        &self,
        content: &std::collections::BTreeMap<String, oas3::spec::MediaType>,
    ) -> Result<(Option<String>, Option<Schema>), SpecError> {
        let entry = content
            .iter()
            .find(|(key, _)| key.starts_with("application/json"))
            .or_else(|| content.iter().next());
        match entry {
            Some((key, media_type)) => {
                let schema = match &media_type.schema {
                    Some(oor) => Some(self.convert_schema_oor(oor)?),
                    None => None,
                };
                Ok((Some(key.clone()), schema))
            }
            None => Ok((None, None)),
        }
    }
}

/// Reduce a 3.1 type set to a primary type plus nullability.
fn split_type_set(set: Option<&SchemaTypeSet>) -> (Option<SchemaType>, bool) {
    match set {
        None => (None, false),
        Some(SchemaTypeSet::Single(t)) => (Some(*t), *t == SchemaType::Null),
        Some(SchemaTypeSet::Multiple(types)) => {
            let nullable = types.contains(&SchemaType::Null);
            let primary = types.iter().find(|t| **t != SchemaType::Null).copied();
            (primary, nullable)
        }
    }
}

fn convert_location(location: oas3::spec::ParameterIn) -> ParameterLocation {
    use oas3::spec::ParameterIn;
    match location {
        ParameterIn::Query => ParameterLocation::Query,
        ParameterIn::Header => ParameterLocation::Header,
        ParameterIn::Path => ParameterLocation::Path,
        ParameterIn::Cookie => ParameterLocation::Cookie,
    }
}

fn convert_format(format: &str) -> Option<Format> {
    match format {
        "int32" => Some(Format::Int32),
        "int64" => Some(Format::Int64),
        "float" => Some(Format::Float),
        "double" => Some(Format::Double),
        "byte" => Some(Format::Byte),
        "binary" => Some(Format::Binary),
        "date" => Some(Format::Date),
        "date-time" => Some(Format::DateTime),
        "uuid" => Some(Format::Uuid),
        "password" => Some(Format::Password),
        _ => None,
    }
}

fn path_item_operations(
    item: &oas3::spec::PathItem,
) -> impl Iterator<Item = (http::Method, &oas3::spec::Operation)> {
    [
        (http::Method::GET, item.get.as_ref()),
        (http::Method::PUT, item.put.as_ref()),
        (http::Method::POST, item.post.as_ref()),
        (http::Method::DELETE, item.delete.as_ref()),
        (http::Method::OPTIONS, item.options.as_ref()),
        (http::Method::HEAD, item.head.as_ref()),
        (http::Method::PATCH, item.patch.as_ref()),
        (http::Method::TRACE, item.trace.as_ref()),
    ]
    .into_iter()
    .filter_map(|(method, op)| op.map(|op| (method, op)))
}
