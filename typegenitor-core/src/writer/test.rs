use assert_tokenstreams_eq::assert_tokenstreams_eq;
use quote::quote;

use crate::spec::{Ref, StatusSpec};
use crate::typedef::{
    EnumConstant, FieldDef, Primitive, TypeDefinition, TypeKind, TypeOrigin, TypeRef,
};

use super::*;

fn component(name: &str, kind: TypeKind) -> TypeDefinition {
    TypeDefinition::new(
        name,
        TypeOrigin::Component(Ref::component_schema(name)),
        kind,
    )
}

#[test]
fn write_plain_struct() -> anyhow::Result<()> {
    let mut name = FieldDef::new("name", "name", TypeRef::Primitive(Primitive::String));
    name.required = true;
    let age = FieldDef::new(
        "age",
        "age",
        TypeRef::Optional(Box::new(TypeRef::Primitive(Primitive::I64))),
    );
    let def = component(
        "Pet",
        TypeKind::Struct {
            fields: vec![name, age],
        },
    );

    let ts = type_decl_tokens(&def)?;
    let reference = quote!(
        #[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::default::Default,
            ::core::cmp::PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        pub struct Pet {
            #[serde(rename = "name")]
            pub name: String,
            #[serde(rename = "age", skip_serializing_if = "Option::is_none", default)]
            pub age: ::std::option::Option<i64>
        }
    );
    assert_tokenstreams_eq!(&ts, &reference);
    Ok(())
}

#[test]
fn write_map_alias() -> anyhow::Result<()> {
    let def = component(
        "Labels",
        TypeKind::Map {
            value: TypeRef::Primitive(Primitive::String),
        },
    );
    let ts = type_decl_tokens(&def)?;
    let reference = quote!(
        pub type Labels =
            ::std::collections::HashMap<::std::string::String, String>;
    );
    assert_tokenstreams_eq!(&ts, &reference);
    Ok(())
}

#[test]
fn write_string_enum() -> anyhow::Result<()> {
    let mut def = component(
        "PetStatus",
        TypeKind::Enum {
            repr: TypeRef::Primitive(Primitive::String),
            constants: vec![
                EnumConstant {
                    name: "Available".to_string(),
                    value: serde_json::json!("available"),
                },
                EnumConstant {
                    name: "Sold".to_string(),
                    value: serde_json::json!("sold"),
                },
            ],
        },
    );
    def.can_be_constant = true;

    let rendered = type_decl_tokens(&def)?.to_string();
    assert!(rendered.contains("pub enum PetStatus"));
    assert!(rendered.contains("Available"));
    assert!(rendered.contains(r#"rename = "available""#));
    assert!(rendered.contains("# [default]"));
    Ok(())
}

#[test]
fn write_integer_enum_constants() -> anyhow::Result<()> {
    let mut def = component(
        "Code",
        TypeKind::Enum {
            repr: TypeRef::Primitive(Primitive::I64),
            constants: vec![EnumConstant {
                name: "Code1".to_string(),
                value: serde_json::json!(1),
            }],
        },
    );
    def.can_be_constant = true;

    let rendered = type_decl_tokens(&def)?.to_string();
    assert!(rendered.contains("pub struct Code (pub i64)"));
    assert!(rendered.contains("pub const CODE1 : Code = Code (1i64)"));
    Ok(())
}

#[test]
fn write_either_alias_without_discriminator() -> anyhow::Result<()> {
    let def = component(
        "Target",
        TypeKind::UnionEither {
            a: UnionVariant {
                label: "Email".to_string(),
                type_ref: TypeRef::Named("Email".to_string()),
                discriminator_value: None,
            },
            b: UnionVariant {
                label: "Webhook".to_string(),
                type_ref: TypeRef::Named("Webhook".to_string()),
                discriminator_value: None,
            },
            discriminator: None,
        },
    );
    let ts = type_decl_tokens(&def)?;
    let reference = quote!(
        pub type Target = ::typegenitor_model::Either<Email, Webhook>;
    );
    assert_tokenstreams_eq!(&ts, &reference);
    Ok(())
}

#[test]
fn write_raw_union_accessors() -> anyhow::Result<()> {
    let def = component(
        "Any3",
        TypeKind::UnionRaw {
            variants: vec![
                UnionVariant {
                    label: "Alpha".to_string(),
                    type_ref: TypeRef::Named("Alpha".to_string()),
                    discriminator_value: None,
                },
                UnionVariant {
                    label: "I64".to_string(),
                    type_ref: TypeRef::Primitive(Primitive::I64),
                    discriminator_value: None,
                },
            ],
            discriminator: None,
        },
    );
    let rendered = type_decl_tokens(&def)?.to_string();
    assert!(rendered.contains("fn as_alpha"));
    assert!(rendered.contains("fn as_validated_alpha"));
    assert!(rendered.contains("fn from_alpha"));
    assert!(rendered.contains("fn as_i64"));
    Ok(())
}

#[test]
fn custom_json_struct_merges_embedded_union() -> anyhow::Result<()> {
    let mut base = FieldDef::new("name", "name", TypeRef::Primitive(Primitive::String));
    base.required = true;
    let mut embedded = FieldDef::new("embedded", "", TypeRef::Named("TargetAllOf1".to_string()));
    embedded.embedded_union = true;
    embedded.validate_nested = true;
    let mut extra = FieldDef::new(
        "additional_properties",
        "",
        TypeRef::Map(Box::new(TypeRef::Primitive(Primitive::String))),
    );
    extra.additional_properties = true;

    let mut def = component(
        "Target",
        TypeKind::Struct {
            fields: vec![base, embedded, extra],
        },
    );
    def.json.custom_marshal = true;
    def.json.custom_unmarshal = true;

    let rendered = type_decl_tokens(&def)?.to_string();
    assert!(rendered.contains("impl :: serde :: Serialize for Target"));
    assert!(rendered.contains("impl < 'de > :: serde :: Deserialize < 'de > for Target"));
    // additional-properties accessors ride along
    assert!(rendered.contains("pub fn get"));
    assert!(rendered.contains("pub fn set"));
    Ok(())
}

fn binding(path: &str, params: Vec<crate::translator::BoundParam>) -> OperationBinding {
    OperationBinding {
        fn_name: "op".to_string(),
        type_prefix: "Op".to_string(),
        method: http::Method::GET,
        path: path.to_string(),
        deprecated: false,
        params,
        body: None,
        responses: vec![],
        mcp: None,
    }
}

#[test]
fn path_without_parameters_stays_literal() {
    let ts = path_format_tokens(&binding("/foo/bar", vec![]));
    assert_eq!(
        quote!("/foo/bar".to_string()).to_string(),
        ts.to_string()
    );
}

#[test]
fn path_with_parameters_uses_format() {
    let params = vec![crate::translator::BoundParam {
        spec_name: "petId".to_string(),
        rust_name: "pet_id".to_string(),
        location: ParameterLocation::Path,
        type_ref: TypeRef::Primitive(Primitive::I64),
        required: true,
    }];
    let ts = path_format_tokens(&binding("/pets/{petId}/photo", params));
    assert_eq!(
        quote!(format!("/pets/{}/photo", pet_id)).to_string(),
        ts.to_string()
    );
}

#[test]
fn path_with_unbound_template_keeps_it_literal() {
    let ts = path_format_tokens(&binding("/foo/{bar}/{id}", vec![]));
    assert_eq!(
        quote!("/foo/{bar}/{id}".to_string()).to_string(),
        ts.to_string()
    );
}

#[test]
fn client_method_for_health_operation() -> anyhow::Result<()> {
    let op = OperationBinding {
        fn_name: "health_check".to_string(),
        type_prefix: "HealthCheck".to_string(),
        method: http::Method::GET,
        path: "/health".to_string(),
        deprecated: false,
        params: vec![],
        body: None,
        responses: vec![crate::translator::BoundResponse {
            status: StatusSpec::Code(200),
            type_ref: Some(TypeRef::Named("HealthCheckResponse".to_string())),
            media_type: Some("application/json".to_string()),
        }],
        mcp: None,
    };
    let rendered = client_method_tokens(&op, &Config::default())?.to_string();
    assert!(rendered.contains("pub fn health_check"));
    assert!(rendered.contains("Result < HealthCheckResponse , ClientError >"));
    assert!(rendered.contains("200u16 =>"));
    Ok(())
}
