//! Render planned IR into Rust source, one token stream per role.
//!
//! Generated code references everything by absolute path and leans on the
//! `typegenitor-model` runtime crate for the union and validation
//! contracts, so the output needs no `use` preamble.

// useful read on working with proc_macro2, quote and syn:
// https://petanode.com/posts/rust-proc-macro/

use anyhow::anyhow;
use indexmap::IndexMap;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use rust_format::Formatter;

use crate::config::Config;
use crate::plan::{Emission, IrEntry, IrPayload, Role};
use crate::spec::{Constraints, ParameterLocation, StatusSpec};
use crate::translate;
use crate::translator::OperationBinding;
use crate::typedef::{
    FieldDef, Primitive, TypeDefinition, TypeKind, TypeRef, UnionVariant, ValidationKind,
};

/// One rendered output file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    pub contents: String,
    pub scaffold: bool,
}

/// Render every role of the emission.
pub fn write(emission: &Emission, config: &Config) -> anyhow::Result<IndexMap<Role, RenderedFile>> {
    let mut files = IndexMap::new();
    for (role, entries) in emission.roles() {
        if entries.is_empty() {
            continue;
        }
        let tokens = match role {
            Role::Models | Role::Responses => type_bundle_tokens(entries)?,
            Role::Client => client_tokens(entries, config)?,
            Role::ServerRouter => server_router_tokens(entries)?,
            Role::ServerService => server_service_tokens(entries, config)?,
            Role::ServerAdapter => server_adapter_tokens(config),
            Role::ServerMain => server_main_tokens(config),
            Role::McpTools => mcp_tokens(entries),
        };
        let scaffold = entries.iter().all(|e| e.scaffold);
        files.insert(
            role,
            RenderedFile {
                contents: fmt_code(tokens),
                scaffold,
            },
        );
    }
    Ok(files)
}

/// Format a token stream, falling back to the raw token text when no
/// formatter is available on the host.
pub(crate) fn fmt_code(ts: TokenStream) -> String {
    match rust_format::RustFmt::default().format_tokens(ts.clone()) {
        Ok(formatted) => formatted,
        Err(e) => {
            log::debug!("formatting failed ({e}), emitting unformatted tokens");
            ts.to_string()
        }
    }
}

fn type_bundle_tokens(entries: &[IrEntry]) -> anyhow::Result<TokenStream> {
    let mut decls = Vec::new();
    for entry in entries {
        if let IrPayload::Type(def) = &entry.payload {
            decls.push(type_decl_tokens(def)?);
        }
    }
    Ok(quote!(#(#decls)*))
}

fn type_decl_tokens(def: &TypeDefinition) -> anyhow::Result<TokenStream> {
    let name = format_ident!("{}", def.name);
    let doc = doc_tokens(def.doc.as_deref(), def.deprecated_reason.as_deref());

    let decl = match &def.kind {
        TypeKind::Alias { target } => {
            let target = type_tokens(target)?;
            quote!(#doc pub type #name = #target;)
        }
        TypeKind::Map { value } => {
            let value = type_tokens(value)?;
            quote!(#doc pub type #name = ::std::collections::HashMap<::std::string::String, #value>;)
        }
        TypeKind::Array { element } => {
            let element = type_tokens(element)?;
            quote!(#doc pub type #name = ::std::vec::Vec<#element>;)
        }
        TypeKind::External { path, .. } => {
            let target: syn::Type = syn::parse_str(path)
                .map_err(|e| anyhow!("invalid external type path '{path}': {e}"))?;
            quote!(#doc pub type #name = #target;)
        }
        TypeKind::Struct { fields } => struct_tokens(def, fields)?,
        TypeKind::Enum { repr, constants } => enum_tokens(def, repr, constants)?,
        TypeKind::PrimitiveWrapper { inner } => {
            let inner_ts = type_tokens(inner)?;
            let validate = wrapper_validate_tokens(def, inner)?;
            quote!(
                #doc
                #[derive(
                    ::std::fmt::Debug,
                    ::std::clone::Clone,
                    ::std::default::Default,
                    ::core::cmp::PartialEq,
                    ::serde::Serialize,
                    ::serde::Deserialize
                )]
                #[serde(transparent)]
                pub struct #name(pub #inner_ts);
                #validate
            )
        }
        TypeKind::UnionEither { a, b, discriminator } => {
            union_either_tokens(def, a, b, discriminator.as_ref())?
        }
        TypeKind::UnionRaw {
            variants,
            discriminator,
        } => union_raw_tokens(def, variants, discriminator.as_ref())?,
    };
    Ok(decl)
}

fn doc_tokens(doc: Option<&str>, deprecated: Option<&str>) -> TokenStream {
    let doc = doc.map(|text| quote!(#[doc = #text]));
    let deprecated = deprecated.map(|note| quote!(#[deprecated(note = #note)]));
    quote!(#doc #deprecated)
}

fn type_tokens(type_ref: &TypeRef) -> anyhow::Result<TokenStream> {
    let ts = match type_ref {
        TypeRef::Unit => quote!(()),
        TypeRef::Value => quote!(::serde_json::Value),
        TypeRef::Primitive(p) => {
            let ident = format_ident!("{}", p.rust_name());
            quote!(#ident)
        }
        TypeRef::Named(name) => {
            let ident = format_ident!("{}", name);
            quote!(#ident)
        }
        TypeRef::Optional(inner) => {
            let inner = type_tokens(inner)?;
            quote!(::std::option::Option<#inner>)
        }
        TypeRef::Vec(inner) => {
            let inner = type_tokens(inner)?;
            quote!(::std::vec::Vec<#inner>)
        }
        TypeRef::Map(inner) => {
            let inner = type_tokens(inner)?;
            quote!(::std::collections::HashMap<::std::string::String, #inner>)
        }
        TypeRef::External(path) => {
            let ty: syn::Type = syn::parse_str(path)
                .map_err(|e| anyhow!("invalid external type path '{path}': {e}"))?;
            quote!(#ty)
        }
    };
    Ok(ts)
}

fn contains_external(type_ref: &TypeRef) -> bool {
    match type_ref {
        TypeRef::External(_) => true,
        TypeRef::Optional(inner) | TypeRef::Vec(inner) | TypeRef::Map(inner) => {
            contains_external(inner)
        }
        _ => false,
    }
}

fn struct_tokens(def: &TypeDefinition, fields: &[FieldDef]) -> anyhow::Result<TokenStream> {
    let name = format_ident!("{}", def.name);
    let doc = doc_tokens(def.doc.as_deref(), def.deprecated_reason.as_deref());
    let custom = def.json.custom_marshal || def.json.custom_unmarshal;

    let mut field_decls = Vec::new();
    for field in fields {
        let field_name = format_ident!("{}", field.rust_name);
        let field_type = type_tokens(&field.type_ref)?;
        let field_doc = doc_tokens(field.doc.as_deref(), None);
        let tag_docs: Vec<TokenStream> = field
            .extra_tags
            .iter()
            .map(|(tag, value)| {
                let text = format!("tag {tag}: {value}");
                quote!(#[doc = #text])
            })
            .collect();

        let serde_attrs = if custom {
            // custom impls read the wire form themselves
            quote!()
        } else if field.json_ignore {
            quote!(#[serde(skip)])
        } else {
            let wire = field.wire_name.as_str();
            // omit-empty only has an expressible form on optional fields
            let skip = if field.type_ref.is_optional() {
                quote!(, skip_serializing_if = "Option::is_none", default)
            } else {
                quote!()
            };
            quote!(#[serde(rename = #wire #skip)])
        };

        field_decls.push(quote!(
            #field_doc
            #(#tag_docs)*
            #serde_attrs
            pub #field_name: #field_type
        ));
    }

    let derives = if custom {
        quote!(#[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::default::Default,
            ::core::cmp::PartialEq
        )])
    } else if fields.iter().any(|f| contains_external(&f.type_ref)) {
        quote!(#[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::core::cmp::PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize
        )])
    } else {
        quote!(#[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::default::Default,
            ::core::cmp::PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize
        )])
    };

    let custom_impls = if custom {
        custom_json_tokens(def, fields)?
    } else {
        quote!()
    };

    let accessors = additional_accessor_tokens(def, fields)?;
    let validate = struct_validate_tokens(def, fields)?;

    Ok(quote!(
        #doc
        #derives
        pub struct #name {
            #(#field_decls),*
        }
        #custom_impls
        #accessors
        #validate
    ))
}

/// `get`/`set` over the invisible additional-properties map.
fn additional_accessor_tokens(
    def: &TypeDefinition,
    fields: &[FieldDef],
) -> anyhow::Result<TokenStream> {
    let Some(map_field) = fields.iter().find(|f| f.additional_properties) else {
        return Ok(quote!());
    };
    let name = format_ident!("{}", def.name);
    let field_name = format_ident!("{}", map_field.rust_name);
    let TypeRef::Map(value) = &map_field.type_ref else {
        return Err(anyhow!(
            "additional-properties field of '{}' is not a map",
            def.name
        ));
    };
    let value_ts = type_tokens(value)?;
    Ok(quote!(
        impl #name {
            pub fn get(&self, key: &str) -> ::std::option::Option<&#value_ts> {
                self.#field_name.get(key)
            }

            pub fn set(&mut self, key: impl ::std::convert::Into<::std::string::String>, value: #value_ts) {
                self.#field_name.insert(key.into(), value);
            }
        }
    ))
}

/// Custom serialize/deserialize for structs whose wire form merges
/// injected unions and additional properties into one flat object.
fn custom_json_tokens(def: &TypeDefinition, fields: &[FieldDef]) -> anyhow::Result<TokenStream> {
    let name = format_ident!("{}", def.name);

    let mut ser_steps = Vec::new();
    let mut de_steps = Vec::new();
    let mut ctor_fields = Vec::new();

    for field in fields {
        let field_name = format_ident!("{}", field.rust_name);
        if field.embedded_union {
            ser_steps.push(quote!(
                let embedded = ::serde_json::to_value(&self.#field_name)
                    .map_err(::serde::ser::Error::custom)?;
                if let ::serde_json::Value::Object(map) = embedded {
                    for (key, value) in map {
                        object.insert(key, value);
                    }
                }
            ));
            de_steps.push(quote!(
                let #field_name = ::serde_json::from_value(
                    ::serde_json::Value::Object(object.clone())
                )
                .map_err(::serde::de::Error::custom)?;
                // keys consumed by the union do not flow into the
                // additional-properties map
                let consumed = ::serde_json::to_value(&#field_name)
                    .map_err(::serde::de::Error::custom)?;
                if let ::serde_json::Value::Object(map) = consumed {
                    for key in map.keys() {
                        object.remove(key);
                    }
                }
            ));
        } else if field.additional_properties {
            ser_steps.push(quote!(
                for (key, value) in &self.#field_name {
                    object.insert(
                        key.clone(),
                        ::serde_json::to_value(value).map_err(::serde::ser::Error::custom)?,
                    );
                }
            ));
            // consumes whatever keys remain, so this runs last
        } else if field.json_ignore {
            de_steps.push(quote!(
                let #field_name = ::std::default::Default::default();
            ));
        } else {
            let wire = field.wire_name.as_str();
            if field.type_ref.is_optional() {
                ser_steps.push(quote!(
                    if let Some(value) = &self.#field_name {
                        object.insert(
                            #wire.to_string(),
                            ::serde_json::to_value(value).map_err(::serde::ser::Error::custom)?,
                        );
                    }
                ));
                de_steps.push(quote!(
                    let #field_name = match object.remove(#wire) {
                        Some(value) => ::serde_json::from_value(value)
                            .map_err(::serde::de::Error::custom)?,
                        None => None,
                    };
                ));
            } else {
                ser_steps.push(quote!(
                    object.insert(
                        #wire.to_string(),
                        ::serde_json::to_value(&self.#field_name)
                            .map_err(::serde::ser::Error::custom)?,
                    );
                ));
                de_steps.push(quote!(
                    let #field_name = match object.remove(#wire) {
                        Some(value) => ::serde_json::from_value(value)
                            .map_err(::serde::de::Error::custom)?,
                        None => return Err(::serde::de::Error::missing_field(#wire)),
                    };
                ));
            }
        }
        ctor_fields.push(quote!(#field_name));
    }

    // remaining keys flow into the catch-all map
    if let Some(map_field) = fields.iter().find(|f| f.additional_properties) {
        let field_name = format_ident!("{}", map_field.rust_name);
        de_steps.push(quote!(
            let mut #field_name = ::std::collections::HashMap::new();
            for (key, value) in object {
                #field_name.insert(
                    key,
                    ::serde_json::from_value(value).map_err(::serde::de::Error::custom)?,
                );
            }
        ));
    }

    Ok(quote!(
        impl ::serde::Serialize for #name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                let mut object = ::serde_json::Map::new();
                #(#ser_steps)*
                ::serde_json::Value::Object(object).serialize(serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for #name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                let mut object = match ::serde_json::Value::deserialize(deserializer)? {
                    ::serde_json::Value::Object(map) => map,
                    _ => return Err(::serde::de::Error::custom("expected a JSON object")),
                };
                #(#de_steps)*
                Ok(Self { #(#ctor_fields),* })
            }
        }
    ))
}

fn enum_tokens(
    def: &TypeDefinition,
    repr: &TypeRef,
    constants: &[crate::typedef::EnumConstant],
) -> anyhow::Result<TokenStream> {
    let name = format_ident!("{}", def.name);
    let doc = doc_tokens(def.doc.as_deref(), def.deprecated_reason.as_deref());

    // string enums become real Rust enums; everything else stays a
    // transparent wrapper, with associated constants when comparable
    let all_strings = !constants.is_empty()
        && constants
            .iter()
            .all(|c| matches!(c.value, serde_json::Value::String(_)));

    if all_strings {
        let variants: Vec<TokenStream> = constants
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let variant = format_ident!("{}", c.name);
                let wire = c.value.as_str().unwrap_or_default();
                let default_attr = if i == 0 { quote!(#[default]) } else { quote!() };
                quote!(
                    #default_attr
                    #[serde(rename = #wire)]
                    #variant
                )
            })
            .collect();
        return Ok(quote!(
            #doc
            #[derive(
                ::std::fmt::Debug,
                ::std::clone::Clone,
                ::std::marker::Copy,
                ::std::default::Default,
                ::core::cmp::PartialEq,
                ::core::cmp::Eq,
                ::serde::Serialize,
                ::serde::Deserialize
            )]
            pub enum #name {
                #(#variants),*
            }
        ));
    }

    let inner = type_tokens(repr)?;
    let consts: Vec<TokenStream> = if def.can_be_constant {
        constants
            .iter()
            // string values are not const-constructible in a newtype;
            // they only ever arrive here from mixed-type enums
            .filter(|c| matches!(c.value, serde_json::Value::Number(_) | serde_json::Value::Bool(_)))
            .map(|c| {
                let const_name =
                    format_ident!("{}", translate::snake_case(&c.name).to_ascii_uppercase());
                let value = constant_value_tokens(&c.value, repr);
                quote!(pub const #const_name: #name = #name(#value);)
            })
            .collect()
    } else {
        Vec::new()
    };
    let const_impl = if consts.is_empty() {
        quote!()
    } else {
        quote!(impl #name { #(#consts)* })
    };

    Ok(quote!(
        #doc
        #[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::default::Default,
            ::core::cmp::PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct #name(pub #inner);
        #const_impl
    ))
}

fn constant_value_tokens(value: &serde_json::Value, repr: &TypeRef) -> TokenStream {
    match (value, repr) {
        (serde_json::Value::Number(n), TypeRef::Primitive(Primitive::I32)) => {
            let v = n.as_i64().unwrap_or_default() as i32;
            quote!(#v)
        }
        (serde_json::Value::Number(n), TypeRef::Primitive(Primitive::F32)) => {
            let v = n.as_f64().unwrap_or_default() as f32;
            quote!(#v)
        }
        (serde_json::Value::Number(n), TypeRef::Primitive(Primitive::F64)) => {
            let v = n.as_f64().unwrap_or_default();
            quote!(#v)
        }
        (serde_json::Value::Number(n), _) => {
            let v = n.as_i64().unwrap_or_default();
            quote!(#v)
        }
        (serde_json::Value::Bool(b), _) => quote!(#b),
        (serde_json::Value::String(s), _) => quote!(#s.to_string()),
        (other, _) => {
            let text = other.to_string();
            quote!(#text.to_string())
        }
    }
}

fn union_either_tokens(
    def: &TypeDefinition,
    a: &UnionVariant,
    b: &UnionVariant,
    discriminator: Option<&crate::typedef::DiscriminatorDef>,
) -> anyhow::Result<TokenStream> {
    let name = format_ident!("{}", def.name);
    let doc = doc_tokens(def.doc.as_deref(), def.deprecated_reason.as_deref());
    let a_ty = type_tokens(&a.type_ref)?;
    let b_ty = type_tokens(&b.type_ref)?;

    let Some(d) = discriminator else {
        // no discriminator: the runtime pair with its heuristic decode is
        // the whole representation
        return Ok(quote!(
            #doc
            pub type #name = ::typegenitor_model::Either<#a_ty, #b_ty>;
        ));
    };

    let property = d.property.as_str();
    let a_value = a.discriminator_value.as_deref().unwrap_or_default();
    let b_value = b.discriminator_value.as_deref().unwrap_or_default();

    Ok(quote!(
        #doc
        #[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::default::Default,
            ::core::cmp::PartialEq
        )]
        pub struct #name(pub ::typegenitor_model::Either<#a_ty, #b_ty>);

        impl ::serde::Serialize for #name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                let mut value = ::serde_json::to_value(&self.0)
                    .map_err(::serde::ser::Error::custom)?;
                if let ::serde_json::Value::Object(map) = &mut value {
                    let tag = if self.0.is_a() { #a_value } else { #b_value };
                    map.insert(
                        #property.to_string(),
                        ::serde_json::Value::String(tag.to_string()),
                    );
                }
                value.serialize(serializer)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for #name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                let value = ::serde_json::Value::deserialize(deserializer)?;
                if value.is_null() {
                    return Ok(Self(::typegenitor_model::Either::empty()));
                }
                let tag = ::typegenitor_model::discriminator::discriminator_value(&value, #property)
                    .map_err(::serde::de::Error::custom)?;
                match tag {
                    #a_value => Ok(Self(::typegenitor_model::Either::from_a(
                        ::serde_json::from_value(value).map_err(::serde::de::Error::custom)?,
                    ))),
                    #b_value => Ok(Self(::typegenitor_model::Either::from_b(
                        ::serde_json::from_value(value).map_err(::serde::de::Error::custom)?,
                    ))),
                    other => Err(::serde::de::Error::custom(
                        ::typegenitor_model::discriminator::UnknownDiscriminatorError::unknown(
                            #property, other,
                        ),
                    )),
                }
            }
        }

        impl ::typegenitor_model::Validate for #name {
            fn validate_at(
                &self,
                path: &::typegenitor_model::FieldPath,
                errors: &mut ::typegenitor_model::ValidationErrors,
            ) {
                self.0.validate_at(path, errors);
            }
        }
    ))
}

fn union_raw_tokens(
    def: &TypeDefinition,
    variants: &[UnionVariant],
    discriminator: Option<&crate::typedef::DiscriminatorDef>,
) -> anyhow::Result<TokenStream> {
    let name = format_ident!("{}", def.name);
    let doc = doc_tokens(def.doc.as_deref(), def.deprecated_reason.as_deref());

    let mut accessors = Vec::new();
    for variant in variants {
        let label = translate::snake_case(&variant.label);
        let as_name = format_ident!("as_{}", label);
        let as_validated_name = format_ident!("as_validated_{}", label);
        let from_name = format_ident!("from_{}", label);
        let ty = type_tokens(&variant.type_ref)?;
        accessors.push(quote!(
            pub fn #as_name(&self) -> ::std::result::Result<#ty, ::typegenitor_model::WrongVariantError> {
                self.0.as_type()
            }

            pub fn #as_validated_name(&self) -> ::std::result::Result<#ty, ::typegenitor_model::RawUnionError> {
                self.0.as_validated()
            }

            pub fn #from_name(value: &#ty) -> ::std::result::Result<Self, ::serde_json::Error> {
                let mut union = ::typegenitor_model::RawUnion::default();
                union.replace_with(value)?;
                Ok(Self(union))
            }
        ));
    }

    let discriminator_accessor = match discriminator {
        Some(d) => {
            let property = d.property.as_str();
            quote!(
                pub fn discriminator(&self) -> ::std::result::Result<&str, ::typegenitor_model::discriminator::UnknownDiscriminatorError> {
                    ::typegenitor_model::discriminator::discriminator_value(self.0.payload(), #property)
                }
            )
        }
        None => quote!(),
    };

    let validate_body = match discriminator {
        Some(d) => {
            let property = d.property.as_str();
            let arms: Vec<TokenStream> = variants
                .iter()
                .filter_map(|v| {
                    let value = v.discriminator_value.as_deref()?;
                    let ty = type_tokens(&v.type_ref).ok()?;
                    Some(quote!(
                        Ok(#value) => {
                            if let Ok(decoded) = self.0.as_type::<#ty>() {
                                decoded.validate_at(path, errors);
                            }
                        }
                    ))
                })
                .collect();
            quote!(
                use ::typegenitor_model::Validate as _;
                match ::typegenitor_model::discriminator::discriminator_value(self.0.payload(), #property) {
                    #(#arms)*
                    _ => errors.push(::typegenitor_model::ValidationError::new(
                        path.as_str(),
                        "unknown discriminator value",
                    )),
                }
            )
        }
        // without a discriminator the active variant is unknowable here;
        // validation happens through the typed accessors
        None => quote!(let _ = (path, errors);),
    };

    Ok(quote!(
        #doc
        #[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::default::Default,
            ::core::cmp::PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct #name(pub ::typegenitor_model::RawUnion);

        impl #name {
            #(#accessors)*
            #discriminator_accessor
        }

        impl ::typegenitor_model::Validate for #name {
            fn validate_at(
                &self,
                path: &::typegenitor_model::FieldPath,
                errors: &mut ::typegenitor_model::ValidationErrors,
            ) {
                #validate_body
            }
        }
    ))
}

/// Constraint checks for one value expression, picked by the shape of its
/// type.
fn constraint_check_tokens(
    value: TokenStream,
    type_ref: &TypeRef,
    c: &Constraints,
    path: TokenStream,
) -> Vec<TokenStream> {
    let mut checks = Vec::new();
    let push = quote!(errors.push(e));

    match type_ref {
        TypeRef::Primitive(Primitive::String) => {
            if let Some(min) = c.min_length {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::min_length(#path, #value, #min) { #push; }
                ));
            }
            if let Some(max) = c.max_length {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::max_length(#path, #value, #max) { #push; }
                ));
            }
            if let Some(pattern) = &c.pattern {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::pattern(#path, #value, #pattern) { #push; }
                ));
            }
        }
        TypeRef::Primitive(Primitive::I32 | Primitive::I64) => {
            if let Some(min) = c.minimum {
                let min = min as i64;
                let exclusive = c.exclusive_minimum;
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::minimum(#path, i64::from(*#value), #min, #exclusive) { #push; }
                ));
            }
            if let Some(max) = c.maximum {
                let max = max as i64;
                let exclusive = c.exclusive_maximum;
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::maximum(#path, i64::from(*#value), #max, #exclusive) { #push; }
                ));
            }
            if let Some(multiple) = c.multiple_of {
                let multiple = multiple as i64;
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::multiple_of_int(#path, i64::from(*#value), #multiple) { #push; }
                ));
            }
        }
        TypeRef::Primitive(Primitive::F32 | Primitive::F64) => {
            if let Some(min) = c.minimum {
                let exclusive = c.exclusive_minimum;
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::minimum(#path, f64::from(*#value), #min, #exclusive) { #push; }
                ));
            }
            if let Some(max) = c.maximum {
                let exclusive = c.exclusive_maximum;
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::maximum(#path, f64::from(*#value), #max, #exclusive) { #push; }
                ));
            }
            if let Some(multiple) = c.multiple_of {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::multiple_of_float(#path, f64::from(*#value), #multiple) { #push; }
                ));
            }
        }
        TypeRef::Vec(_) => {
            if let Some(min) = c.min_items {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::min_items(#path, #value.len(), #min) { #push; }
                ));
            }
            if let Some(max) = c.max_items {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::max_items(#path, #value.len(), #max) { #push; }
                ));
            }
        }
        TypeRef::Map(_) => {
            if let Some(min) = c.min_properties {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::min_properties(#path, #value.len(), #min) { #push; }
                ));
            }
            if let Some(max) = c.max_properties {
                checks.push(quote!(
                    if let Some(e) = ::typegenitor_model::validation::constraint::max_properties(#path, #value.len(), #max) { #push; }
                ));
            }
        }
        _ => (),
    }
    checks
}

fn wrapper_validate_tokens(def: &TypeDefinition, inner: &TypeRef) -> anyhow::Result<TokenStream> {
    if def.validation == ValidationKind::None || def.constraints.is_empty() {
        return Ok(quote!());
    }
    let name = format_ident!("{}", def.name);
    let value = match inner {
        TypeRef::Primitive(Primitive::String) => quote!(self.0.as_str()),
        _ => quote!(&self.0),
    };
    let checks = constraint_check_tokens(value, inner, &def.constraints, quote!(path));
    Ok(quote!(
        impl ::typegenitor_model::Validate for #name {
            fn validate_at(
                &self,
                path: &::typegenitor_model::FieldPath,
                errors: &mut ::typegenitor_model::ValidationErrors,
            ) {
                #(#checks)*
            }
        }
    ))
}

fn struct_validate_tokens(def: &TypeDefinition, fields: &[FieldDef]) -> anyhow::Result<TokenStream> {
    if def.validation != ValidationKind::StructRecursive {
        return Ok(quote!());
    }
    let name = format_ident!("{}", def.name);

    let mut steps = Vec::new();
    for field in fields {
        let field_name = format_ident!("{}", field.rust_name);
        let segment = translate::pascal_case(&field.wire_name);

        // additional-property keys appear at the top level of the object
        let path_expr = if field.additional_properties || field.embedded_union {
            quote!(path.clone())
        } else {
            quote!(path.field(#segment))
        };

        let mut inner_steps = Vec::new();
        let (value_expr, inner_ref, optional) = match &field.type_ref {
            TypeRef::Optional(inner) => (quote!(value), inner.as_ref(), true),
            other => (quote!((&self.#field_name)), other, false),
        };

        let value_for_checks = match inner_ref {
            TypeRef::Primitive(Primitive::String) => {
                if optional {
                    quote!(value.as_str())
                } else {
                    quote!(self.#field_name.as_str())
                }
            }
            _ => value_expr.clone(),
        };
        inner_steps.extend(constraint_check_tokens(
            value_for_checks,
            inner_ref,
            &field.constraints,
            quote!(&field_path),
        ));
        if field.validate_nested {
            inner_steps.push(quote!(
                ::typegenitor_model::Validate::validate_at(#value_expr, &field_path, errors);
            ));
        }

        if inner_steps.is_empty() {
            continue;
        }

        if optional {
            steps.push(quote!(
                {
                    let field_path = #path_expr;
                    if let Some(value) = &self.#field_name {
                        #(#inner_steps)*
                    }
                }
            ));
        } else {
            steps.push(quote!(
                {
                    let field_path = #path_expr;
                    #(#inner_steps)*
                }
            ));
        }
    }

    if steps.is_empty() {
        return Ok(quote!());
    }

    Ok(quote!(
        impl ::typegenitor_model::Validate for #name {
            fn validate_at(
                &self,
                path: &::typegenitor_model::FieldPath,
                errors: &mut ::typegenitor_model::ValidationErrors,
            ) {
                #(#steps)*
            }
        }
    ))
}

/// Client role: a transport-generic client struct with one method per
/// operation.
fn client_tokens(entries: &[IrEntry], config: &Config) -> anyhow::Result<TokenStream> {
    let mut methods = Vec::new();
    for entry in entries {
        if let IrPayload::Operation(op) = &entry.payload {
            methods.push(client_method_tokens(op, config)?);
        }
    }

    Ok(quote!(
        #[derive(::std::fmt::Debug)]
        pub enum ClientError {
            Transport(::typegenitor_model::TransportError),
            Decode(::serde_json::Error),
            Validation(::typegenitor_model::ValidationErrors),
            UnknownResponse(::http::Response<::std::vec::Vec<u8>>),
        }

        impl ::std::fmt::Display for ClientError {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    ClientError::Transport(e) => write!(f, "transport failure: {e}"),
                    ClientError::Decode(e) => write!(f, "response decoding failed: {e}"),
                    ClientError::Validation(e) => write!(f, "response validation failed: {e}"),
                    ClientError::UnknownResponse(r) => {
                        write!(f, "response status {} not described by the API", r.status())
                    }
                }
            }
        }

        impl ::std::error::Error for ClientError {}

        #[derive(::std::fmt::Debug)]
        pub struct Client<T: ::typegenitor_model::Transport> {
            base_path: ::std::string::String,
            transport: T,
        }

        impl<T: ::typegenitor_model::Transport> Client<T> {
            pub fn new(base_path: impl ::std::convert::Into<::std::string::String>, transport: T) -> Self {
                Self { base_path: base_path.into(), transport }
            }

            #(#methods)*
        }
    ))
}

fn client_method_tokens(op: &OperationBinding, config: &Config) -> anyhow::Result<TokenStream> {
    let fn_name = format_ident!("{}", op.fn_name);
    let method_name = op.method.as_str();

    let mut params = Vec::new();
    for p in &op.params {
        let param_name = format_ident!("{}", p.rust_name);
        let ty = type_tokens(&p.type_ref)?;
        params.push(quote!(#param_name: #ty));
    }
    let body_param = match &op.body {
        Some(body) => {
            let ty = type_tokens(&body.type_ref)?;
            Some(quote!(body: &#ty))
        }
        None => None,
    };

    let path_expr = path_format_tokens(op);
    let query_steps: Vec<TokenStream> = op
        .params
        .iter()
        .filter(|p| p.location == ParameterLocation::Query)
        .map(|p| {
            let param_name = format_ident!("{}", p.rust_name);
            let wire = p.spec_name.as_str();
            if p.type_ref.is_optional() {
                quote!(
                    if let Some(value) = &#param_name {
                        query.push(format!("{}={}", #wire, value));
                    }
                )
            } else {
                quote!(query.push(format!("{}={}", #wire, #param_name));)
            }
        })
        .collect();

    let header_steps: Vec<TokenStream> = op
        .params
        .iter()
        .filter(|p| p.location == ParameterLocation::Header)
        .map(|p| {
            let param_name = format_ident!("{}", p.rust_name);
            let wire = p.spec_name.as_str();
            if p.type_ref.is_optional() {
                quote!(
                    if let Some(value) = &#param_name {
                        builder = builder.header(#wire, value.to_string());
                    }
                )
            } else {
                quote!(builder = builder.header(#wire, #param_name.to_string());)
            }
        })
        .collect();

    let body_bytes = match &op.body {
        Some(_) => quote!(
            ::serde_json::to_vec(body).map_err(ClientError::Decode)?
        ),
        None => quote!(::std::vec::Vec::new()),
    };
    let content_type = match &op.body {
        Some(_) => quote!(builder = builder.header("content-type", "application/json");),
        None => quote!(),
    };

    // the first declared success response is the method's Ok type
    let success = op
        .responses
        .iter()
        .find(|r| r.status.is_success() && r.type_ref.is_some());
    let (return_type, success_arm) = match success {
        Some(response) => {
            let ty = type_tokens(response.type_ref.as_ref().unwrap())?;
            let status_pattern = status_match_tokens(&response.status);
            let validate_step = if config.generate.validation.response {
                quote!(
                    ::typegenitor_model::Validate::validate(&decoded)
                        .map_err(ClientError::Validation)?;
                )
            } else {
                quote!()
            };
            (
                quote!(#ty),
                quote!(
                    #status_pattern => {
                        let decoded: #ty = ::serde_json::from_slice(response.body())
                            .map_err(ClientError::Decode)?;
                        #validate_step
                        Ok(decoded)
                    }
                ),
            )
        }
        None => {
            let no_body_success = op.responses.iter().find(|r| r.status.is_success());
            match no_body_success {
                Some(response) => {
                    let status_pattern = status_match_tokens(&response.status);
                    (quote!(()), quote!(#status_pattern => Ok(()),))
                }
                None => (quote!(()), quote!()),
            }
        }
    };

    Ok(quote!(
        pub fn #fn_name(
            &self,
            #(#params,)*
            #body_param
        ) -> ::std::result::Result<#return_type, ClientError> {
            let path = #path_expr;
            let mut query: ::std::vec::Vec<::std::string::String> = ::std::vec::Vec::new();
            #(#query_steps)*
            let mut uri = format!("{}{}", self.base_path, path);
            if !query.is_empty() {
                uri = format!("{}?{}", uri, query.join("&"));
            }
            let mut builder = ::http::Request::builder()
                .method(#method_name)
                .uri(uri);
            #content_type
            #(#header_steps)*
            let request = builder
                .body(#body_bytes)
                .map_err(|e| ClientError::Transport(e.into()))?;
            let response = self.transport.send(request).map_err(ClientError::Transport)?;
            match response.status().as_u16() {
                #success_arm
                _ => Err(ClientError::UnknownResponse(response)),
            }
        }
    ))
}

/// `/pets/{petId}` becomes `format!("/pets/{}", pet_id)`.
fn path_format_tokens(op: &OperationBinding) -> TokenStream {
    lazy_static::lazy_static! {
        static ref TEMPLATE: ::regex::Regex = ::regex::Regex::new(r"\{([^}]*)\}").unwrap();
    }
    let mut format_string = String::new();
    let mut literal_string = String::new();
    let mut args = Vec::new();
    let mut last_end = 0usize;
    for capture in TEMPLATE.captures_iter(&op.path) {
        let whole = capture.get(0).unwrap();
        let param = capture.get(1).map(|m| m.as_str()).unwrap_or_default();
        let prefix = &op.path[last_end..whole.start()];
        format_string.push_str(prefix);
        literal_string.push_str(prefix);
        last_end = whole.end();
        match op
            .params
            .iter()
            .find(|p| p.spec_name == param && p.location == ParameterLocation::Path)
        {
            Some(bound) => {
                format_string.push_str("{}");
                literal_string.push_str(whole.as_str());
                let ident = format_ident!("{}", bound.rust_name);
                args.push(quote!(#ident));
            }
            None => {
                // no matching parameter: the template stays literal, with
                // braces escaped for the format string
                format_string.push_str(&whole.as_str().replace('{', "{{").replace('}', "}}"));
                literal_string.push_str(whole.as_str());
            }
        }
    }
    format_string.push_str(&op.path[last_end..]);
    literal_string.push_str(&op.path[last_end..]);

    if args.is_empty() {
        quote!(#literal_string.to_string())
    } else {
        quote!(format!(#format_string, #(#args),*))
    }
}

fn status_match_tokens(status: &StatusSpec) -> TokenStream {
    match status {
        StatusSpec::Code(c) => quote!(#c),
        StatusSpec::Range(r) => {
            let low = r * 100;
            let high = r * 100 + 99;
            quote!(#low..=#high)
        }
        StatusSpec::Default => quote!(_),
    }
}

/// Server router role: the service interface every adapter dispatches to.
fn server_router_tokens(entries: &[IrEntry]) -> anyhow::Result<TokenStream> {
    let mut methods = Vec::new();
    for entry in entries {
        if let IrPayload::Operation(op) = &entry.payload {
            let fn_name = format_ident!("{}", op.fn_name);
            let mut params = Vec::new();
            for p in &op.params {
                let param_name = format_ident!("{}", p.rust_name);
                let ty = type_tokens(&p.type_ref)?;
                params.push(quote!(#param_name: #ty));
            }
            if let Some(body) = &op.body {
                let ty = type_tokens(&body.type_ref)?;
                params.push(quote!(body: #ty));
            }
            let return_type = match op
                .responses
                .iter()
                .find(|r| r.status.is_success() && r.type_ref.is_some())
            {
                Some(r) => type_tokens(r.type_ref.as_ref().unwrap())?,
                None => quote!(()),
            };
            let doc = format!("Handle `{} {}`.", op.method, op.path);
            methods.push(quote!(
                #[doc = #doc]
                fn #fn_name(&self, #(#params),*) -> ::std::result::Result<#return_type, Self::Error>;
            ));
        }
    }
    Ok(quote!(
        /// The service interface behind the generated routes; implement it
        /// on your service type and wire it into your framework adapter.
        pub trait Api {
            type Error;

            #(#methods)*
        }
    ))
}

/// Server service role: a one-time scaffold implementing the interface.
fn server_service_tokens(entries: &[IrEntry], config: &Config) -> anyhow::Result<TokenStream> {
    let mut methods = Vec::new();
    for entry in entries {
        if let IrPayload::Operation(op) = &entry.payload {
            let fn_name = format_ident!("{}", op.fn_name);
            let mut params = Vec::new();
            for p in &op.params {
                let param_name = format_ident!("_{}", p.rust_name);
                let ty = type_tokens(&p.type_ref)?;
                params.push(quote!(#param_name: #ty));
            }
            if let Some(body) = &op.body {
                let ty = type_tokens(&body.type_ref)?;
                params.push(quote!(_body: #ty));
            }
            let return_type = match op
                .responses
                .iter()
                .find(|r| r.status.is_success() && r.type_ref.is_some())
            {
                Some(r) => type_tokens(r.type_ref.as_ref().unwrap())?,
                None => quote!(()),
            };
            let todo_message = format!("implement {}", op.fn_name);
            methods.push(quote!(
                fn #fn_name(&self, #(#params),*) -> ::std::result::Result<#return_type, Self::Error> {
                    todo!(#todo_message)
                }
            ));
        }
    }
    let service_name = format_ident!("{}Service", translate::pascal_case(&config.package_name));
    Ok(quote!(
        pub struct #service_name;

        impl Api for #service_name {
            type Error = ::std::boxed::Box<dyn ::std::error::Error>;

            #(#methods)*
        }
    ))
}

fn server_adapter_tokens(config: &Config) -> TokenStream {
    let handler_validation = config
        .generate
        .handler
        .as_ref()
        .map(|h| h.validation.clone())
        .unwrap_or_default();

    let request_hook = if handler_validation.request {
        quote!(
            /// Validate a decoded request payload before it reaches the
            /// service method.
            pub fn validate_request<T: ::typegenitor_model::Validate>(
                payload: &T,
            ) -> ::std::result::Result<(), ::typegenitor_model::ValidationErrors> {
                payload.validate()
            }
        )
    } else {
        quote!()
    };

    let response_hook = if handler_validation.response {
        quote!(
            /// Validate a response payload before it is serialized.
            pub fn validate_response<T: ::typegenitor_model::Validate>(
                payload: &T,
            ) -> ::std::result::Result<(), ::typegenitor_model::ValidationErrors> {
                payload.validate()
            }
        )
    } else {
        quote!()
    };

    quote!(
        /// Request middleware hook; called before the service method.
        pub fn middleware(request: &::http::Request<::std::vec::Vec<u8>>) {
            let _ = request;
        }

        #request_hook
        #response_hook
    )
}

fn server_main_tokens(config: &Config) -> TokenStream {
    let service_name = format_ident!("{}Service", translate::pascal_case(&config.package_name));
    quote!(
        fn main() {
            let service = #service_name;
            let _ = service;
            todo!("wire the service into your HTTP framework of choice")
        }
    )
}

fn mcp_tokens(entries: &[IrEntry]) -> TokenStream {
    let mut tools = Vec::new();
    for entry in entries {
        if let IrPayload::McpTool(tool) = &entry.payload {
            let name = tool.name.as_str();
            let description = tool.description.as_deref().unwrap_or_default();
            let operation = tool.operation.as_str();
            tools.push(quote!(
                McpTool {
                    name: #name,
                    description: #description,
                    operation: #operation,
                }
            ));
        }
    }
    quote!(
        /// One exposed MCP tool, bound to a client operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct McpTool {
            pub name: &'static str,
            pub description: &'static str,
            pub operation: &'static str,
        }

        pub const MCP_TOOLS: &[McpTool] = &[#(#tools),*];
    )
}

#[cfg(test)]
mod test;
