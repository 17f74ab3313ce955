use crate::error::SpecError;
use crate::spec::{
    AdditionalProperties, ParameterLocation, PrimitiveType, SchemaKind, StatusSpec,
};
use test_log::test;

fn load(yaml: &str) -> crate::spec::SpecModel {
    super::load(yaml.as_bytes()).expect("document should load")
}

#[test]
fn components_keep_document_order() {
    let model = load(
        r"
openapi: 3.0.0
info:
    title: ordering
    version: v1
paths: {}
components:
    schemas:
        Zebra:
            type: object
            properties:
                stripes:
                    type: integer
        Aardvark:
            type: string
",
    );
    let names: Vec<&str> = model
        .schemas()
        .map(|(_, s)| s.name.as_deref().unwrap())
        .collect();
    assert_eq!(vec!["Zebra", "Aardvark"], names);
}

#[test]
fn object_properties_and_required() {
    let model = load(
        r"
openapi: 3.0.0
info:
    title: pet
    version: v1
paths: {}
components:
    schemas:
        Pet:
            type: object
            required: [name]
            properties:
                name:
                    type: string
                    minLength: 1
                age:
                    type: integer
                    format: int32
",
    );
    let (_, pet) = model.schemas().next().unwrap();
    let SchemaKind::Object {
        properties,
        required,
        additional,
    } = &pet.kind
    else {
        panic!("object expected, got {pet:?}");
    };
    assert_eq!(
        vec!["name", "age"],
        properties.keys().map(String::as_str).collect::<Vec<_>>()
    );
    assert_eq!(
        vec!["name"],
        required.iter().map(String::as_str).collect::<Vec<_>>()
    );
    assert!(!additional.is_present());
    assert_eq!(Some(1), properties["name"].constraints.min_length);
    assert_eq!(
        SchemaKind::Primitive(PrimitiveType::Integer),
        properties["age"].kind
    );
}

#[test]
fn additional_properties_policies() {
    let model = load(
        r"
openapi: 3.0.0
info:
    title: maps
    version: v1
paths: {}
components:
    schemas:
        Untyped:
            type: object
            additionalProperties: true
        Typed:
            type: object
            additionalProperties:
                type: string
",
    );
    let mut schemas = model.schemas();
    let (_, untyped) = schemas.next().unwrap();
    let (_, typed) = schemas.next().unwrap();
    let SchemaKind::Object { additional, .. } = &untyped.kind else {
        panic!();
    };
    assert_eq!(&AdditionalProperties::Untyped, additional);
    let SchemaKind::Object { additional, .. } = &typed.kind else {
        panic!();
    };
    assert!(matches!(additional, AdditionalProperties::Typed(_)));
}

#[test]
fn unresolved_ref_is_reported() {
    let result = super::load(
        r"
openapi: 3.0.0
info:
    title: broken
    version: v1
paths: {}
components:
    schemas:
        Holder:
            type: object
            properties:
                other:
                    $ref: '#/components/schemas/Missing'
"
        .as_bytes(),
    );
    match result {
        Err(SpecError::UnresolvedRef { reference }) => {
            assert_eq!("#/components/schemas/Missing", reference);
        }
        other => panic!("expected UnresolvedRef, got {other:?}"),
    }
}

#[test]
fn path_targeted_ref_is_unsupported() {
    let result = super::load(
        r"
openapi: 3.0.0
info:
    title: broken
    version: v1
paths: {}
components:
    schemas:
        Holder:
            type: object
            properties:
                other:
                    $ref: '#/paths/~1pets/get'
"
        .as_bytes(),
    );
    assert!(matches!(
        result,
        Err(SpecError::UnsupportedFeature { .. })
    ));
}

#[test]
fn extension_named_schema_is_unsupported() {
    let result = super::load(
        r"
openapi: 3.0.0
info:
    title: broken
    version: v1
paths: {}
components:
    schemas:
        x-internal:
            type: string
"
        .as_bytes(),
    );
    assert!(matches!(
        result,
        Err(SpecError::UnsupportedFeature { .. })
    ));
}

#[test]
fn operation_parameters_shadow_path_item_parameters() {
    let model = load(
        r"
openapi: 3.0.0
info:
    title: params
    version: v1
paths:
    /pets/{petId}:
        parameters:
            -   name: petId
                in: path
                required: true
                schema:
                    type: integer
            -   name: verbose
                in: query
                schema:
                    type: boolean
        get:
            operationId: getPet
            parameters:
                -   name: petId
                    in: path
                    required: true
                    schema:
                        type: string
            responses:
                '200':
                    description: ok
",
    );
    let op = &model.operations()[0];
    assert_eq!(Some("getPet"), op.operation_id.as_deref());
    // verbose survives, the path-item petId is shadowed by the operation's
    let locations: Vec<(&str, ParameterLocation)> = op
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    assert_eq!(
        vec![
            ("verbose", ParameterLocation::Query),
            ("petId", ParameterLocation::Path)
        ],
        locations
    );
    let pet_id = &op.parameters[1];
    assert_eq!(
        SchemaKind::Primitive(PrimitiveType::String),
        pet_id.schema.as_ref().unwrap().kind
    );
}

#[test]
fn responses_include_default_last() {
    let model = load(
        r"
openapi: 3.0.0
info:
    title: responses
    version: v1
paths:
    /pets:
        get:
            responses:
                '200':
                    description: ok
                    content:
                        application/json:
                            schema:
                                type: array
                                items:
                                    type: string
                '404':
                    description: missing
                default:
                    description: fallback
",
    );
    let op = &model.operations()[0];
    let statuses: Vec<&StatusSpec> = op.responses.iter().map(|(s, _)| s).collect();
    assert_eq!(
        vec![
            &StatusSpec::Code(200),
            &StatusSpec::Code(404),
            &StatusSpec::Default
        ],
        statuses
    );
    assert!(op.responses[0].1.schema.is_some());
    assert!(op.responses[1].1.schema.is_none());
}

#[test]
fn discriminator_mapping_targets_must_resolve() {
    let result = super::load(
        r"
openapi: 3.0.0
info:
    title: disc
    version: v1
paths: {}
components:
    schemas:
        Pet:
            oneOf:
                -   $ref: '#/components/schemas/Cat'
            discriminator:
                propertyName: petType
                mapping:
                    cat: '#/components/schemas/Dog'
        Cat:
            type: object
"
        .as_bytes(),
    );
    assert!(matches!(result, Err(SpecError::UnresolvedRef { .. })));
}

#[test]
fn json_input_parses_too() {
    let model = super::load(
        br#"{
            "openapi": "3.0.0",
            "info": {"title": "json", "version": "v1"},
            "paths": {},
            "components": {"schemas": {"Thing": {"type": "string"}}}
        }"#,
    )
    .unwrap();
    assert_eq!(1, model.schemas().count());
}
