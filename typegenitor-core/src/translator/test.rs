use pretty_assertions::assert_eq;
use test_log::test;

use crate::adapters::oas30;
use crate::config::Config;
use crate::spec::Ref;
use crate::typedef::{Primitive, TypeKind, TypeRef, ValidationKind};

use super::*;

fn run(yaml: &str) -> Translation {
    run_with(yaml, &Config::default())
}

fn run_with(yaml: &str, config: &Config) -> Translation {
    let model = oas30::load(yaml.as_bytes()).expect("document should load");
    translate(&model, config).expect("translation should succeed")
}

#[test]
fn health_response_type_is_extracted() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: health
    version: v1
paths:
    /health:
        get:
            operationId: healthCheck
            responses:
                '200':
                    description: ok
                    content:
                        application/json:
                            schema:
                                type: object
                                required: [status]
                                properties:
                                    status:
                                        type: string
",
    );
    assert_eq!(1, translation.operations.len());
    let op = &translation.operations[0];
    assert_eq!("health_check", op.fn_name);
    assert!(op.params.is_empty());
    assert!(op.body.is_none());
    assert_eq!(
        Some(&TypeRef::Named("HealthCheckResponse".to_string())),
        op.responses[0].type_ref.as_ref()
    );

    let def = translation
        .tracker
        .lookup_by_name("HealthCheckResponse")
        .expect("response type should be registered");
    let TypeKind::Struct { fields } = &def.kind else {
        panic!("struct expected, got {def:?}");
    };
    assert_eq!(1, fields.len());
    assert_eq!("status", fields[0].rust_name);
    assert_eq!("status", fields[0].wire_name);
    assert_eq!(TypeRef::Primitive(Primitive::String), fields[0].type_ref);
}

#[test]
fn recursive_schema_translates_by_name() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: tree
    version: v1
paths: {}
components:
    schemas:
        TreeNode:
            type: object
            required: [value, children]
            properties:
                value:
                    type: string
                    minLength: 1
                children:
                    type: array
                    items:
                        $ref: '#/components/schemas/TreeNode'
",
    );
    let def = translation.tracker.lookup_by_name("TreeNode").unwrap();
    let TypeKind::Struct { fields } = &def.kind else {
        panic!();
    };
    assert_eq!(Some(1), fields[0].constraints.min_length);
    assert_eq!(
        TypeRef::Vec(Box::new(TypeRef::Named("TreeNode".to_string()))),
        fields[1].type_ref
    );
    assert!(fields[1].validate_nested);
    assert_eq!(ValidationKind::StructRecursive, def.validation);
}

#[test]
fn rename_collision_appends_suffix_in_document_order() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: rename
    version: v1
paths: {}
components:
    schemas:
        First:
            x-rust-name: Foo
            type: object
            properties:
                a:
                    type: string
        Second:
            x-rust-name: Foo
            type: object
            properties:
                other:
                    $ref: '#/components/schemas/First'
                self:
                    $ref: '#/components/schemas/Second'
",
    );
    assert_eq!(
        Some("Foo"),
        translation
            .tracker
            .lookup_by_ref(&Ref::component_schema("First"))
    );
    assert_eq!(
        Some("Foo2"),
        translation
            .tracker
            .lookup_by_ref(&Ref::component_schema("Second"))
    );
    // downstream references to the second schema resolve to Foo2
    let def = translation.tracker.lookup_by_name("Foo2").unwrap();
    let TypeKind::Struct { fields } = &def.kind else {
        panic!();
    };
    assert_eq!(
        TypeRef::Optional(Box::new(TypeRef::Named("Foo".to_string()))),
        fields[0].type_ref
    );
    assert_eq!(
        TypeRef::Optional(Box::new(TypeRef::Named("Foo2".to_string()))),
        fields[1].type_ref
    );
}

#[test]
fn string_enum_gets_constants() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: enums
    version: v1
paths: {}
components:
    schemas:
        PetStatus:
            type: string
            enum: [available, pending, sold]
        Stamp:
            type: string
            format: date-time
            enum: ['2024-01-01T00:00:00Z']
",
    );
    let status = translation.tracker.lookup_by_name("PetStatus").unwrap();
    let TypeKind::Enum { repr, constants } = &status.kind else {
        panic!("enum expected, got {status:?}");
    };
    assert_eq!(&TypeRef::Primitive(Primitive::String), repr);
    let names: Vec<&str> = constants.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(vec!["Available", "Pending", "Sold"], names);
    assert!(status.can_be_constant);

    // date-time does not compare by value, so no constants materialise
    let stamp = translation.tracker.lookup_by_name("Stamp").unwrap();
    let TypeKind::Enum { constants, .. } = &stamp.kind else {
        panic!();
    };
    assert!(constants.is_empty());
    assert!(!stamp.can_be_constant);
}

#[test]
fn pure_additional_properties_is_a_map_alias() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: maps
    version: v1
paths: {}
components:
    schemas:
        Labels:
            type: object
            additionalProperties:
                type: string
        Anything:
            type: object
            additionalProperties: true
",
    );
    let labels = translation.tracker.lookup_by_name("Labels").unwrap();
    assert!(labels.is_alias);
    assert_eq!(
        TypeKind::Map {
            value: TypeRef::Primitive(Primitive::String)
        },
        labels.kind
    );
    let anything = translation.tracker.lookup_by_name("Anything").unwrap();
    assert_eq!(
        TypeKind::Map {
            value: TypeRef::Value
        },
        anything.kind
    );
}

#[test]
fn declared_fields_plus_additional_properties_need_custom_json() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: mixed
    version: v1
paths: {}
components:
    schemas:
        Tagged:
            type: object
            required: [id]
            properties:
                id:
                    type: string
            additionalProperties:
                type: string
",
    );
    let def = translation.tracker.lookup_by_name("Tagged").unwrap();
    let TypeKind::Struct { fields } = &def.kind else {
        panic!();
    };
    assert_eq!(2, fields.len());
    assert!(fields[1].additional_properties);
    assert!(!fields[1].on_wire());
    assert!(def.json.custom_marshal);
    assert!(def.json.custom_unmarshal);
}

#[test]
fn all_of_merges_last_writer_wins() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: merge
    version: v1
paths: {}
components:
    schemas:
        Base:
            type: object
            required: [id]
            properties:
                id:
                    type: string
                kind:
                    type: string
        Extended:
            allOf:
                -   $ref: '#/components/schemas/Base'
                -   type: object
                    properties:
                        kind:
                            type: integer
                        extra:
                            type: boolean
",
    );
    let def = translation.tracker.lookup_by_name("Extended").unwrap();
    let TypeKind::Struct { fields } = &def.kind else {
        panic!();
    };
    let names: Vec<&str> = fields.iter().map(|f| f.wire_name.as_str()).collect();
    assert_eq!(vec!["id", "kind", "extra"], names);
    // the second branch rewrote 'kind' to an integer
    assert_eq!(
        TypeRef::Optional(Box::new(TypeRef::Primitive(Primitive::I64))),
        fields[1].type_ref
    );
}

#[test]
fn all_of_with_union_branch_injects_invisible_field() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: mixed composition
    version: v1
paths: {}
components:
    schemas:
        Email:
            type: object
            properties:
                address:
                    type: string
        Webhook:
            type: object
            properties:
                url:
                    type: string
        Target:
            allOf:
                -   type: object
                    required: [name]
                    properties:
                        name:
                            type: string
                -   anyOf:
                        -   $ref: '#/components/schemas/Email'
                        -   $ref: '#/components/schemas/Webhook'
",
    );
    let def = translation.tracker.lookup_by_name("Target").unwrap();
    assert!(def.contains_unions);
    assert!(def.json.custom_marshal && def.json.custom_unmarshal);
    let TypeKind::Struct { fields } = &def.kind else {
        panic!();
    };
    let embedded = fields.iter().find(|f| f.embedded_union).unwrap();
    assert_eq!(
        TypeRef::Named("TargetAllOf1".to_string()),
        embedded.type_ref
    );
    assert!(!embedded.on_wire());

    let union = translation.tracker.lookup_by_name("TargetAllOf1").unwrap();
    let TypeKind::UnionEither { a, b, .. } = &union.kind else {
        panic!("either expected, got {union:?}");
    };
    assert_eq!(TypeRef::Named("Email".to_string()), a.type_ref);
    assert_eq!(TypeRef::Named("Webhook".to_string()), b.type_ref);
}

#[test]
fn nullable_single_variant_union_bubbles_up() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: bubble
    version: v1
paths: {}
components:
    schemas:
        MaybeName:
            anyOf:
                -   type: string
                    minLength: 1
                -   nullable: true
",
    );
    let def = translation.tracker.lookup_by_name("MaybeName").unwrap();
    // the wrapper disappears; the single variant keeps its constraints
    assert!(def.is_optional);
    assert_eq!(
        TypeKind::PrimitiveWrapper {
            inner: TypeRef::Primitive(Primitive::String)
        },
        def.kind
    );
    assert_eq!(Some(1), def.constraints.min_length);
}

#[test]
fn three_variant_union_stays_raw() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: raw
    version: v1
paths: {}
components:
    schemas:
        A:
            type: object
            properties:
                a: {type: string}
        B:
            type: object
            properties:
                b: {type: string}
        C:
            type: object
            properties:
                c: {type: string}
        Any3:
            oneOf:
                -   $ref: '#/components/schemas/A'
                -   $ref: '#/components/schemas/B'
                -   $ref: '#/components/schemas/C'
",
    );
    let def = translation.tracker.lookup_by_name("Any3").unwrap();
    let TypeKind::UnionRaw {
        variants,
        discriminator,
    } = &def.kind
    else {
        panic!("raw union expected, got {def:?}");
    };
    assert_eq!(3, variants.len());
    assert!(discriminator.is_none());
    assert_eq!(ValidationKind::UnionDispatch, def.validation);
}

#[test]
fn discriminator_values_attach_to_variants() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: disc
    version: v1
paths: {}
components:
    schemas:
        Cat:
            type: object
            properties:
                meow: {type: boolean}
        Dog:
            type: object
            properties:
                bark: {type: boolean}
        Pet:
            oneOf:
                -   $ref: '#/components/schemas/Cat'
                -   $ref: '#/components/schemas/Dog'
            discriminator:
                propertyName: petType
                mapping:
                    cat: '#/components/schemas/Cat'
                    dog: '#/components/schemas/Dog'
",
    );
    let def = translation.tracker.lookup_by_name("Pet").unwrap();
    let TypeKind::UnionEither { a, b, discriminator } = &def.kind else {
        panic!();
    };
    let d = discriminator.as_ref().unwrap();
    assert_eq!("petType", d.property);
    assert_eq!(Some("cat"), a.discriminator_value.as_deref());
    assert_eq!(Some("dog"), b.discriminator_value.as_deref());
    // a declared discriminator switches to custom dispatch
    assert!(def.json.custom_unmarshal);
}

#[test]
fn inline_property_objects_get_parent_prefixed_names() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: inline
    version: v1
paths: {}
components:
    schemas:
        Order:
            type: object
            properties:
                shipping:
                    type: object
                    properties:
                        street: {type: string}
",
    );
    assert!(translation.tracker.lookup_by_name("OrderShipping").is_some());
    let order = translation.tracker.lookup_by_name("Order").unwrap();
    let TypeKind::Struct { fields } = &order.kind else {
        panic!();
    };
    assert_eq!(
        TypeRef::Optional(Box::new(TypeRef::Named("OrderShipping".to_string()))),
        fields[0].type_ref
    );
}

#[test]
fn skipped_component_is_not_generated() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: skip
    version: v1
paths: {}
components:
    schemas:
        Hidden:
            x-skip: true
            type: object
        Visible:
            type: string
",
    );
    assert!(translation.tracker.lookup_by_name("Hidden").is_none());
    assert!(translation.tracker.lookup_by_name("Visible").is_some());
}

#[test]
fn read_only_fields_become_optional_on_shared_schemas() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: ro
    version: v1
paths: {}
components:
    schemas:
        User:
            type: object
            required: [id, name]
            properties:
                id:
                    type: string
                    readOnly: true
                name:
                    type: string
",
    );
    let def = translation.tracker.lookup_by_name("User").unwrap();
    let TypeKind::Struct { fields } = &def.kind else {
        panic!();
    };
    assert!(fields[0].type_ref.is_optional());
    assert!(!fields[1].type_ref.is_optional());
}

#[test]
fn translation_is_deterministic() {
    let yaml = r"
openapi: 3.0.0
info:
    title: det
    version: v1
paths: {}
components:
    schemas:
        B:
            type: object
            properties:
                a: {type: string}
                nested:
                    type: object
                    properties:
                        x: {type: integer}
        A:
            type: string
            enum: [x, y]
";
    let first: Vec<String> = run(yaml).tracker.iter().map(|d| d.name.clone()).collect();
    let second: Vec<String> = run(yaml).tracker.iter().map(|d| d.name.clone()).collect();
    assert_eq!(first, second);
    assert_eq!(vec!["B", "A", "BNested"], first);
}

#[test]
fn external_type_extension_replaces_generation() {
    let translation = run(
        r"
openapi: 3.0.0
info:
    title: external
    version: v1
paths: {}
components:
    schemas:
        Stamp:
            type: string
            x-rust-type: 'chrono::DateTime<chrono::Utc>'
            x-rust-type-import: chrono
",
    );
    let def = translation.tracker.lookup_by_name("Stamp").unwrap();
    assert_eq!(
        TypeKind::External {
            path: "chrono::DateTime<chrono::Utc>".to_string(),
            import: Some("chrono".to_string()),
        },
        def.kind
    );
}

#[test]
fn error_mapped_alias_is_revoked() {
    let mut config = Config::default();
    config
        .error_mapping
        .insert("Error".to_string(), "$.message".to_string());
    let translation = run_with(
        r"
openapi: 3.0.0
info:
    title: errmap
    version: v1
paths: {}
components:
    schemas:
        Error:
            type: string
",
        &config,
    );
    let def = translation.tracker.lookup_by_name("Error").unwrap();
    assert!(!def.is_alias);
    assert_eq!(
        TypeKind::PrimitiveWrapper {
            inner: TypeRef::Primitive(Primitive::String)
        },
        def.kind
    );
}
