use std::io::Cursor;

use test_log::test;

use super::*;

static PETSTORE_YAML: &str = r"
openapi: 3.0.0
info:
    title: Petstore
    version: v1
paths:
    /pets:
        get:
            operationId: listPets
            parameters:
                -   name: limit
                    in: query
                    schema:
                        type: integer
                        format: int32
            responses:
                '200':
                    description: pets
                    content:
                        application/json:
                            schema:
                                type: array
                                items:
                                    $ref: '#/components/schemas/Pet'
        post:
            operationId: createPet
            requestBody:
                required: true
                content:
                    application/json:
                        schema:
                            $ref: '#/components/schemas/Pet'
            responses:
                '201':
                    description: created
                    content:
                        application/json:
                            schema:
                                $ref: '#/components/schemas/Pet'
    /pets/{petId}:
        get:
            operationId: getPet
            parameters:
                -   name: petId
                    in: path
                    required: true
                    schema:
                        type: integer
                        format: int64
            responses:
                '200':
                    description: one pet
                    content:
                        application/json:
                            schema:
                                $ref: '#/components/schemas/Pet'
components:
    schemas:
        Pet:
            type: object
            required: [id, name]
            properties:
                id:
                    type: integer
                    format: int64
                name:
                    type: string
                    minLength: 1
                status:
                    $ref: '#/components/schemas/PetStatus'
        PetStatus:
            type: string
            enum: [available, pending, sold]
";

/// Code containment check that is indifferent to formatting.
fn contains_code(haystack: &str, needle: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    strip(haystack).contains(&strip(needle))
}

#[test]
fn generate_petstore() {
    let output = generate(PETSTORE_YAML.as_bytes(), &Config::default()).unwrap();
    let models = &output.file(Role::Models).unwrap().contents;
    assert!(contains_code(models, "pub struct Pet"), "models:\n{models}");
    assert!(contains_code(models, "pub enum PetStatus"));
    assert!(contains_code(models, "Available"));

    let client = &output.file(Role::Client).unwrap().contents;
    assert!(contains_code(client, "pub fn list_pets"));
    assert!(contains_code(client, "pub fn create_pet"));
    assert!(contains_code(client, "pub fn get_pet"));
    assert!(contains_code(client, "pet_id: i64"));
}

#[test]
fn generation_is_deterministic() {
    let config = Config::default();
    let first = generate(PETSTORE_YAML.as_bytes(), &config).unwrap();
    let second = generate(PETSTORE_YAML.as_bytes(), &config).unwrap();
    assert_eq!(first.concatenated(), second.concatenated());
}

#[test]
fn generate_from_reader_reads_fully() {
    let reader = Cursor::new(PETSTORE_YAML.as_bytes());
    let output = generate_from_reader(reader, &Config::default()).unwrap();
    assert!(!output.is_empty());
}

#[test]
fn empty_document_generates_nothing() {
    let output = generate(
        br"
openapi: 3.0.0
info:
    title: Empty API
    version: v1
paths: {}
",
        &Config::default(),
    )
    .unwrap();
    assert!(output.is_empty());
}

#[test]
fn broken_ref_fails_without_output() {
    let result = generate(
        br"
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
                broken:
                    $ref: '#/components/schemas/Missing'
",
        &Config::default(),
    );
    let errors = result.err().expect("generation must fail");
    assert!(errors.to_string().contains("Missing"));
}

#[test]
fn models_only_configuration_skips_the_client() {
    let mut config = Config::default();
    config.generate.client = false;
    let output = generate(PETSTORE_YAML.as_bytes(), &config).unwrap();
    assert!(output.file(Role::Client).is_none());
    assert!(output.file(Role::Models).is_some());
}
