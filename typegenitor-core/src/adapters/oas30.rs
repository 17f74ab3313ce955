//! OAS 3.0 adapter on the `openapiv3` crate.
//!
//! Converts the parsed document eagerly into the owned [`SpecModel`].
//! Internal `$ref`s are checked here so that translation can rely on every
//! reference resolving; refs into `#/paths/...` and extension-named
//! schemas cannot be materialised and are rejected up front.

use indexmap::IndexMap;
use openapiv3::{OpenAPI, ReferenceOr};
use serde_json::Value;

use crate::error::SpecError;
use crate::extensions::Extensions;
use crate::spec::{
    AdditionalProperties, Discriminator, Format, Operation, ParameterLocation,
    ParameterSpec, PrimitiveType, Ref, RequestBodySpec, ResponseSpec, Schema, SchemaKind,
    SpecModel, StatusSpec, COMPONENT_SCHEMA_PREFIX,
};

/// Parse the raw bytes and convert into the spec model.
pub fn load(bytes: &[u8]) -> Result<SpecModel, SpecError> {
    // serde_yaml accepts JSON input as well, YAML being a superset
    let openapi: OpenAPI = serde_yaml::from_slice(bytes).map_err(SpecError::parse)?;
    convert(&openapi)
}

pub fn convert(openapi: &OpenAPI) -> Result<SpecModel, SpecError> {
    let converter = Converter { openapi };
    converter.run()
}

const MAX_REF_DEPTH: usize = 32;

/// Lookup of a component section by reference, following chained refs up
/// to a fixed depth.
trait ComponentResolver<T> {
    fn prefix(&self) -> &str;
    fn lookup(&self, name: &str) -> Option<&ReferenceOr<T>>;

    fn resolve<'a>(&'a self, ro: &'a ReferenceOr<T>) -> Result<&'a T, SpecError> {
        let mut current = ro;
        for _ in 0..MAX_REF_DEPTH {
            match current {
                ReferenceOr::Item(item) => return Ok(item),
                ReferenceOr::Reference { reference } => {
                    if reference.starts_with("#/paths/") {
                        return Err(SpecError::unsupported(
                            reference.clone(),
                            "references into '#/paths/' cannot be materialised as components",
                        ));
                    }
                    let name = reference
                        .strip_prefix(self.prefix())
                        .ok_or_else(|| SpecError::unresolved(reference.clone()))?;
                    current = self
                        .lookup(name)
                        .ok_or_else(|| SpecError::unresolved(reference.clone()))?;
                }
            }
        }
        Err(SpecError::unresolved("reference cycle in components"))
    }
}

impl ComponentResolver<openapiv3::Parameter> for OpenAPI {
    fn prefix(&self) -> &str {
        "#/components/parameters/"
    }
    fn lookup(&self, name: &str) -> Option<&ReferenceOr<openapiv3::Parameter>> {
        self.components.as_ref()?.parameters.get(name)
    }
}

impl ComponentResolver<openapiv3::RequestBody> for OpenAPI {
    fn prefix(&self) -> &str {
        "#/components/requestBodies/"
    }
    fn lookup(&self, name: &str) -> Option<&ReferenceOr<openapiv3::RequestBody>> {
        self.components.as_ref()?.request_bodies.get(name)
    }
}

impl ComponentResolver<openapiv3::Response> for OpenAPI {
    fn prefix(&self) -> &str {
        "#/components/responses/"
    }
    fn lookup(&self, name: &str) -> Option<&ReferenceOr<openapiv3::Response>> {
        self.components.as_ref()?.responses.get(name)
    }
}

struct Converter<'a> {
    openapi: &'a OpenAPI,
}

impl<'a> Converter<'a> {
    fn run(&self) -> Result<SpecModel, SpecError> {
        let mut schemas = IndexMap::new();
        if let Some(components) = &self.openapi.components {
            for (name, ro) in &components.schemas {
                if name.starts_with("x-") {
                    return Err(SpecError::unsupported(
                        format!("{COMPONENT_SCHEMA_PREFIX}{name}"),
                        "extension-named schemas cannot be generated",
                    ));
                }
                let mut schema = self.convert_schema_ref(ro)?;
                schema.name = Some(name.clone());
                schemas.insert(name.clone(), schema);
            }
        }

        let mut operations = Vec::new();
        for (path, item_ro) in self.openapi.paths.paths.iter() {
            let path_item = match item_ro {
                ReferenceOr::Item(item) => item,
                ReferenceOr::Reference { reference } => {
                    return Err(SpecError::unsupported(
                        reference.clone(),
                        "path items by reference are not supported",
                    ));
                }
            };
            for (method, op) in path_item_operations(path_item) {
                operations.push(self.convert_operation(path, path_item, method, op)?);
            }
        }

        Ok(SpecModel::new(schemas, operations))
    }

    /// Check that a `$ref` to a schema resolves and produce the reference
    /// node for it.
    fn schema_reference(&self, reference: &str) -> Result<Schema, SpecError> {
        if reference.starts_with("#/paths/") {
            return Err(SpecError::unsupported(
                reference,
                "references into '#/paths/' cannot be materialised as schemas",
            ));
        }
        let name = reference
            .strip_prefix(COMPONENT_SCHEMA_PREFIX)
            .ok_or_else(|| SpecError::unresolved(reference))?;
        let exists = self
            .openapi
            .components
            .as_ref()
            .is_some_and(|c| c.schemas.contains_key(name));
        if !exists {
            return Err(SpecError::unresolved(reference));
        }
        Ok(Schema::of_kind(SchemaKind::Reference(Ref::new(reference))))
    }

    fn convert_schema_ref(
        &self,
        ro: &ReferenceOr<openapiv3::Schema>,
    ) -> Result<Schema, SpecError> {
        match ro {
            ReferenceOr::Reference { reference } => self.schema_reference(reference),
            ReferenceOr::Item(schema) => self.convert_schema(schema),
        }
    }

    fn convert_boxed_schema_ref(
        &self,
        ro: &ReferenceOr<Box<openapiv3::Schema>>,
    ) -> Result<Schema, SpecError> {
        match ro {
            ReferenceOr::Reference { reference } => self.schema_reference(reference),
            ReferenceOr::Item(schema) => self.convert_schema(schema),
        }
    }

    fn convert_schema(&self, schema: &openapiv3::Schema) -> Result<Schema, SpecError> {
        use openapiv3::SchemaKind as OasKind;

        let data = &schema.schema_data;
        let mut out = Schema::default();
        out.nullable = data.nullable;
        out.read_only = data.read_only;
        out.write_only = data.write_only;
        out.deprecated = data.deprecated;
        out.title = data.title.clone();
        out.description = data.description.clone();
        out.extensions = Extensions::from_entries(data.extensions.iter());
        if let Some(d) = &data.discriminator {
            out.discriminator = Some(self.convert_discriminator(d)?);
        }

        match &schema.schema_kind {
            OasKind::Type(t) => self.convert_typed(t, &mut out)?,
            OasKind::OneOf { one_of } => {
                out.kind = SchemaKind::OneOf(self.convert_branches(one_of)?);
            }
            OasKind::AnyOf { any_of } => {
                out.kind = SchemaKind::AnyOf(self.convert_branches(any_of)?);
            }
            OasKind::AllOf { all_of } => {
                out.kind = SchemaKind::AllOf(self.convert_branches(all_of)?);
            }
            OasKind::Not { .. } => {
                // `not` does not shape a type; the payload stays untyped
                log::debug!("ignoring 'not' schema, treating as untyped");
                out.kind = SchemaKind::Any;
            }
            OasKind::Any(any) => self.convert_any(any, &mut out)?,
        }

        Ok(out)
    }

    fn convert_branches(
        &self,
        branches: &[ReferenceOr<openapiv3::Schema>],
    ) -> Result<Vec<Schema>, SpecError> {
        branches
            .iter()
            .map(|ro| self.convert_schema_ref(ro))
            .collect()
    }

    fn convert_discriminator(
        &self,
        d: &openapiv3::Discriminator,
    ) -> Result<Discriminator, SpecError> {
        let mut mapping = IndexMap::new();
        for (value, target) in &d.mapping {
            // mapping targets must themselves resolve
            self.schema_reference(target)?;
            mapping.insert(value.clone(), Ref::new(target.clone()));
        }
        Ok(Discriminator {
            property: d.property_name.clone(),
            mapping,
        })
    }

    fn convert_typed(&self, t: &openapiv3::Type, out: &mut Schema) -> Result<(), SpecError> {
        use openapiv3::Type;
        match t {
            Type::String(st) => {
                out.kind = SchemaKind::Primitive(PrimitiveType::String);
                out.format = convert_string_format(&st.format);
                out.constraints.min_length = st.min_length.map(|v| v as u64);
                out.constraints.max_length = st.max_length.map(|v| v as u64);
                out.constraints.pattern = st.pattern.clone();
                out.enum_values = st
                    .enumeration
                    .iter()
                    .flatten()
                    .map(|s| Value::String(s.clone()))
                    .collect();
            }
            Type::Number(nt) => {
                use openapiv3::NumberFormat;
                out.kind = SchemaKind::Primitive(PrimitiveType::Number);
                out.format = match &nt.format {
                    openapiv3::VariantOrUnknownOrEmpty::Item(NumberFormat::Float) => {
                        Some(Format::Float)
                    }
                    openapiv3::VariantOrUnknownOrEmpty::Item(NumberFormat::Double) => {
                        Some(Format::Double)
                    }
                    _ => None,
                };
                out.constraints.minimum = nt.minimum;
                out.constraints.maximum = nt.maximum;
                out.constraints.exclusive_minimum = nt.exclusive_minimum;
                out.constraints.exclusive_maximum = nt.exclusive_maximum;
                out.constraints.multiple_of = nt.multiple_of;
                out.enum_values = nt
                    .enumeration
                    .iter()
                    .flatten()
                    .filter_map(|v| serde_json::Number::from_f64(*v).map(Value::Number))
                    .collect();
            }
            Type::Integer(it) => {
                use openapiv3::IntegerFormat;
                out.kind = SchemaKind::Primitive(PrimitiveType::Integer);
                out.format = match &it.format {
                    openapiv3::VariantOrUnknownOrEmpty::Item(IntegerFormat::Int32) => {
                        Some(Format::Int32)
                    }
                    openapiv3::VariantOrUnknownOrEmpty::Item(IntegerFormat::Int64) => {
                        Some(Format::Int64)
                    }
                    _ => None,
                };
                out.constraints.minimum = it.minimum.map(|v| v as f64);
                out.constraints.maximum = it.maximum.map(|v| v as f64);
                out.constraints.exclusive_minimum = it.exclusive_minimum;
                out.constraints.exclusive_maximum = it.exclusive_maximum;
                out.constraints.multiple_of = it.multiple_of.map(|v| v as f64);
                out.enum_values = it
                    .enumeration
                    .iter()
                    .flatten()
                    .map(|v| Value::Number((*v).into()))
                    .collect();
            }
            Type::Boolean(_) => {
                out.kind = SchemaKind::Primitive(PrimitiveType::Boolean);
            }
            Type::Object(ot) => {
                let mut properties = IndexMap::new();
                for (name, ro) in &ot.properties {
                    properties.insert(name.clone(), self.convert_boxed_schema_ref(ro)?);
                }
                let additional = match &ot.additional_properties {
                    None | Some(openapiv3::AdditionalProperties::Any(false)) => {
                        AdditionalProperties::Forbidden
                    }
                    Some(openapiv3::AdditionalProperties::Any(true)) => {
                        AdditionalProperties::Untyped
                    }
                    Some(openapiv3::AdditionalProperties::Schema(ro)) => {
                        AdditionalProperties::Typed(Box::new(self.convert_schema_ref(ro)?))
                    }
                };
                out.kind = SchemaKind::Object {
                    properties,
                    required: ot.required.clone(),
                    additional,
                };
                out.constraints.min_properties = ot.min_properties.map(|v| v as u64);
                out.constraints.max_properties = ot.max_properties.map(|v| v as u64);
            }
            Type::Array(at) => {
                let items = match &at.items {
                    Some(ro) => Some(Box::new(self.convert_boxed_schema_ref(ro)?)),
                    None => None,
                };
                out.kind = SchemaKind::Array { items };
                out.constraints.min_items = at.min_items.map(|v| v as u64);
                out.constraints.max_items = at.max_items.map(|v| v as u64);
            }
        }
        Ok(())
    }

    /// Typeless schemas still shape a type when they carry composition or
    /// object/array keywords.
    fn convert_any(
        &self,
        any: &openapiv3::AnySchema,
        out: &mut Schema,
    ) -> Result<(), SpecError> {
        if !any.one_of.is_empty() {
            out.kind = SchemaKind::OneOf(self.convert_branches(&any.one_of)?);
            return Ok(());
        }
        if !any.any_of.is_empty() {
            out.kind = SchemaKind::AnyOf(self.convert_branches(&any.any_of)?);
            return Ok(());
        }
        if !any.all_of.is_empty() {
            out.kind = SchemaKind::AllOf(self.convert_branches(&any.all_of)?);
            return Ok(());
        }

        if !any.properties.is_empty()
            || any.additional_properties.is_some()
            || any.typ.as_deref() == Some("object")
        {
            let mut properties = IndexMap::new();
            for (name, ro) in &any.properties {
                properties.insert(name.clone(), self.convert_boxed_schema_ref(ro)?);
            }
            let additional = match &any.additional_properties {
                None | Some(openapiv3::AdditionalProperties::Any(false)) => {
                    AdditionalProperties::Forbidden
                }
                Some(openapiv3::AdditionalProperties::Any(true)) => AdditionalProperties::Untyped,
                Some(openapiv3::AdditionalProperties::Schema(ro)) => {
                    AdditionalProperties::Typed(Box::new(self.convert_schema_ref(ro)?))
                }
            };
            out.kind = SchemaKind::Object {
                properties,
                required: any.required.clone(),
                additional,
            };
            out.constraints.min_properties = any.min_properties.map(|v| v as u64);
            out.constraints.max_properties = any.max_properties.map(|v| v as u64);
            return Ok(());
        }

        if any.items.is_some() || any.typ.as_deref() == Some("array") {
            let items = match &any.items {
                Some(ro) => Some(Box::new(self.convert_boxed_schema_ref(ro)?)),
                None => None,
            };
            out.kind = SchemaKind::Array { items };
            out.constraints.min_items = any.min_items.map(|v| v as u64);
            out.constraints.max_items = any.max_items.map(|v| v as u64);
            return Ok(());
        }

        match any.typ.as_deref() {
            Some("string") => out.kind = SchemaKind::Primitive(PrimitiveType::String),
            Some("number") => out.kind = SchemaKind::Primitive(PrimitiveType::Number),
            Some("integer") => out.kind = SchemaKind::Primitive(PrimitiveType::Integer),
            Some("boolean") => out.kind = SchemaKind::Primitive(PrimitiveType::Boolean),
            _ => out.kind = SchemaKind::Any,
        }
        out.constraints.minimum = any.minimum;
        out.constraints.maximum = any.maximum;
        out.constraints.min_length = any.min_length.map(|v| v as u64);
        out.constraints.max_length = any.max_length.map(|v| v as u64);
        out.constraints.pattern = any.pattern.clone();
        out.constraints.multiple_of = any.multiple_of;
        out.enum_values = any.enumeration.clone();
        Ok(())
    }

    fn convert_operation(
        &self,
        path: &str,
        path_item: &openapiv3::PathItem,
        method: http::Method,
        op: &openapiv3::Operation,
    ) -> Result<Operation, SpecError> {
        // operation parameters shadow path-item parameters of the same
        // name and location
        let mut parameters = Vec::new();
        for ro in &path_item.parameters {
            let param = ComponentResolver::<openapiv3::Parameter>::resolve(self.openapi, ro)?;
            let shadowed = op.parameters.iter().any(|op_ro| {
                ComponentResolver::<openapiv3::Parameter>::resolve(self.openapi, op_ro)
                    .map(|p| {
                        p.parameter_data_ref().name == param.parameter_data_ref().name
                            && parameter_location(p) == parameter_location(param)
                    })
                    .unwrap_or(false)
            });
            if !shadowed {
                parameters.push(self.convert_parameter(param)?);
            }
        }
        for ro in &op.parameters {
            let param = ComponentResolver::<openapiv3::Parameter>::resolve(self.openapi, ro)?;
            parameters.push(self.convert_parameter(param)?);
        }

        let request_body = match &op.request_body {
            Some(ro) => {
                let body =
                    ComponentResolver::<openapiv3::RequestBody>::resolve(self.openapi, ro)?;
                let (media_type, schema) = self.pick_content(&body.content)?;
                Some(RequestBodySpec {
                    required: body.required,
                    media_type,
                    schema,
                })
            }
            None => None,
        };

        let mut responses = Vec::new();
        for (status, ro) in &op.responses.responses {
            let status = convert_status(status)?;
            let response =
                ComponentResolver::<openapiv3::Response>::resolve(self.openapi, ro)?;
            responses.push((status, self.convert_response(response)?));
        }
        if let Some(ro) = &op.responses.default {
            let response =
                ComponentResolver::<openapiv3::Response>::resolve(self.openapi, ro)?;
            responses.push((StatusSpec::Default, self.convert_response(response)?));
        }

        Ok(Operation {
            method,
            path: path.to_string(),
            operation_id: op.operation_id.clone(),
            tags: op.tags.clone(),
            deprecated: op.deprecated,
            parameters,
            request_body,
            responses,
            extensions: Extensions::from_entries(op.extensions.iter()),
        })
    }

    fn convert_response(
        &self,
        response: &openapiv3::Response,
    ) -> Result<ResponseSpec, SpecError> {
        let (media_type, schema) = self.pick_content(&response.content)?;
        Ok(ResponseSpec {
            media_type,
            schema,
            description: Some(response.description.clone()),
        })
    }

    /// The operation data model carries one body schema; prefer the JSON
    /// media type when several are declared.
    fn pick_content(
        &self,
        content: &IndexMap<String, openapiv3::MediaType>,
    ) -> Result<(Option<String>, Option<Schema>), SpecError> {
        let entry = content
            .iter()
            .find(|(key, _)| key.starts_with("application/json"))
            .or_else(|| content.iter().next());
        match entry {
            Some((key, media_type)) => {
                let schema = match &media_type.schema {
                    Some(ro) => Some(self.convert_schema_ref(ro)?),
                    None => None,
                };
                Ok((Some(key.clone()), schema))
            }
            None => Ok((None, None)),
        }
    }

    fn convert_parameter(
        &self,
        param: &openapiv3::Parameter,
    ) -> Result<ParameterSpec, SpecError> {
        let data = param.parameter_data_ref();
        let schema = match &data.format {
            openapiv3::ParameterSchemaOrContent::Schema(ro) => Some(self.convert_schema_ref(ro)?),
            openapiv3::ParameterSchemaOrContent::Content(content) => {
                self.pick_content(content)?.1
            }
        };
        Ok(ParameterSpec {
            name: data.name.clone(),
            location: parameter_location(param),
            required: data.required,
            schema,
            description: data.description.clone(),
            extensions: Extensions::default(),
        })
    }
}

fn parameter_location(param: &openapiv3::Parameter) -> ParameterLocation {
    match param {
        openapiv3::Parameter::Query { .. } => ParameterLocation::Query,
        openapiv3::Parameter::Header { .. } => ParameterLocation::Header,
        openapiv3::Parameter::Path { .. } => ParameterLocation::Path,
        openapiv3::Parameter::Cookie { .. } => ParameterLocation::Cookie,
    }
}

fn convert_status(status: &openapiv3::StatusCode) -> Result<StatusSpec, SpecError> {
    match status {
        openapiv3::StatusCode::Code(c) => Ok(StatusSpec::Code(*c)),
        openapiv3::StatusCode::Range(r) => Ok(StatusSpec::Range(*r)),
    }
}

fn convert_string_format(
    format: &openapiv3::VariantOrUnknownOrEmpty<openapiv3::StringFormat>,
) -> Option<Format> {
    use openapiv3::{StringFormat, VariantOrUnknownOrEmpty};
    match format {
        VariantOrUnknownOrEmpty::Item(f) => Some(match f {
            StringFormat::Date => Format::Date,
            StringFormat::DateTime => Format::DateTime,
            StringFormat::Password => Format::Password,
            StringFormat::Byte => Format::Byte,
            StringFormat::Binary => Format::Binary,
        }),
        VariantOrUnknownOrEmpty::Unknown(other) => match other.as_str() {
            "uuid" => Some(Format::Uuid),
            _ => None,
        },
        VariantOrUnknownOrEmpty::Empty => None,
    }
}

fn path_item_operations(
    item: &openapiv3::PathItem,
) -> impl Iterator<Item = (http::Method, &openapiv3::Operation)> {
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

#[cfg(test)]
mod test;
