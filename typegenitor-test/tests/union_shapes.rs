//! Runtime contracts of the shapes the generator emits, exercised on
//! hand-expanded counterparts of generated code.

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use typegenitor_model::discriminator::{UnknownDiscriminatorError, discriminator_value};
use typegenitor_model::validation::constraint;
use typegenitor_model::{Either, FieldPath, RawUnion, Validate, ValidationErrors};

// --- recursive validation -------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct TreeNode {
    value: String,
    children: Vec<TreeNode>,
}

impl Validate for TreeNode {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        {
            let field_path = path.field("Value");
            if let Some(e) = constraint::min_length(&field_path, self.value.as_str(), 1) {
                errors.push(e);
            }
        }
        {
            let field_path = path.field("Children");
            self.children.validate_at(&field_path, errors);
        }
    }
}

#[test]
fn recursive_validation_builds_indexed_paths() {
    let tree: TreeNode = serde_json::from_value(serde_json::json!({
        "value": "root",
        "children": [{"value": "", "children": []}]
    }))
    .unwrap();
    let errors = tree.validate().unwrap_err();
    assert_eq!(1, errors.len());
    let error = errors.iter().next().unwrap();
    assert_eq!("Children[0].Value", error.field());
    assert_eq!("length must be greater than or equal to 1", error.message());
}

#[test]
fn recursive_validation_terminates_on_deep_instances() {
    let mut node = TreeNode {
        value: "leaf".to_string(),
        children: Vec::new(),
    };
    for _ in 0..512 {
        node = TreeNode {
            value: "inner".to_string(),
            children: vec![node],
        };
    }
    assert!(node.validate().is_ok());
}

// --- discriminated three-way union ----------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct VariantA {
    #[serde(default)]
    alpha: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct VariantB {
    #[serde(default)]
    beta: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct VariantC {
    #[serde(default)]
    gamma: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
struct Shape(RawUnion);

#[derive(Debug, PartialEq)]
enum DecodedShape {
    A(VariantA),
    B(VariantB),
    C(VariantC),
}

impl Shape {
    fn decode(&self) -> Result<DecodedShape, UnknownDiscriminatorError> {
        let tag = discriminator_value(self.0.payload(), "type")?;
        match tag {
            "a" => Ok(DecodedShape::A(self.0.as_type().map_err(|_| {
                UnknownDiscriminatorError::unknown("type", tag)
            })?)),
            "b" => Ok(DecodedShape::B(self.0.as_type().map_err(|_| {
                UnknownDiscriminatorError::unknown("type", tag)
            })?)),
            "c" => Ok(DecodedShape::C(self.0.as_type().map_err(|_| {
                UnknownDiscriminatorError::unknown("type", tag)
            })?)),
            other => Err(UnknownDiscriminatorError::unknown("type", other)),
        }
    }
}

#[test]
fn discriminator_picks_the_declared_variant() {
    let shape: Shape =
        serde_json::from_value(serde_json::json!({"type": "b", "beta": 7})).unwrap();
    assert_eq!(
        DecodedShape::B(VariantB { beta: 7 }),
        shape.decode().unwrap()
    );
}

#[test]
fn unknown_discriminator_value_fails() {
    let shape: Shape = serde_json::from_value(serde_json::json!({"type": "z"})).unwrap();
    let err = shape.decode().unwrap_err();
    assert_eq!(
        "unknown discriminator value 'z' for property 'type'",
        err.to_string()
    );
}

// --- constrained additional-properties map --------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
struct NonEmptyString(String);

impl Validate for NonEmptyString {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        if let Some(e) = constraint::min_length(path, self.0.as_str(), 1) {
            errors.push(e);
        }
    }
}

fn validate_label_map(map: &HashMap<String, NonEmptyString>) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let path = FieldPath::root();
    if let Some(e) = constraint::min_properties(&path, map.len(), 2) {
        errors.push(e);
    }
    if let Some(e) = constraint::max_properties(&path, map.len(), 5) {
        errors.push(e);
    }
    map.validate_at(&path, &mut errors);
    errors.into_result()
}

#[test]
fn empty_map_misses_the_property_minimum() {
    let errors = validate_label_map(&HashMap::new()).unwrap_err();
    assert_eq!(
        "must have at least 2 properties",
        errors.iter().next().unwrap().message()
    );
}

#[test]
fn map_entry_violations_carry_the_key_as_field() {
    let mut map = HashMap::new();
    map.insert("first".to_string(), NonEmptyString("a".to_string()));
    map.insert("second".to_string(), NonEmptyString(String::new()));
    map.insert("third".to_string(), NonEmptyString("c".to_string()));
    let errors = validate_label_map(&map).unwrap_err();
    assert_eq!(1, errors.len());
    let error = errors.iter().next().unwrap();
    assert_eq!("second", error.field());
    assert_eq!("length must be greater than or equal to 1", error.message());
}

// --- allOf + union + additional properties --------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Email {
    #[serde(default)]
    address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Webhook {
    #[serde(default)]
    url: String,
}

/// Hand-expanded counterpart of a generated `allOf + anyOf +
/// additionalProperties` struct with its custom wire form.
#[derive(Debug, Clone, Default, PartialEq)]
struct Notification {
    name: String,
    embedded: Either<Email, Webhook>,
    additional_properties: HashMap<String, String>,
}

impl Serialize for Notification {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut object = serde_json::Map::new();
        object.insert(
            "name".to_string(),
            serde_json::to_value(&self.name).map_err(serde::ser::Error::custom)?,
        );
        let embedded =
            serde_json::to_value(&self.embedded).map_err(serde::ser::Error::custom)?;
        if let serde_json::Value::Object(map) = embedded {
            for (key, value) in map {
                object.insert(key, value);
            }
        }
        for (key, value) in &self.additional_properties {
            object.insert(
                key.clone(),
                serde_json::to_value(value).map_err(serde::ser::Error::custom)?,
            );
        }
        serde_json::Value::Object(object).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Notification {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut object = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(serde::de::Error::custom("expected a JSON object")),
        };
        let name = match object.remove("name") {
            Some(value) => serde_json::from_value(value).map_err(serde::de::Error::custom)?,
            None => return Err(serde::de::Error::missing_field("name")),
        };
        let embedded: Either<Email, Webhook> =
            serde_json::from_value(serde_json::Value::Object(object.clone()))
                .map_err(serde::de::Error::custom)?;
        let consumed =
            serde_json::to_value(&embedded).map_err(serde::de::Error::custom)?;
        if let serde_json::Value::Object(map) = consumed {
            for key in map.keys() {
                object.remove(key);
            }
        }
        let mut additional_properties = HashMap::new();
        for (key, value) in object {
            additional_properties.insert(
                key,
                serde_json::from_value(value).map_err(serde::de::Error::custom)?,
            );
        }
        Ok(Self {
            name,
            embedded,
            additional_properties,
        })
    }
}

#[test]
fn mixed_composition_marshals_flat() {
    let mut value = Notification::default();
    value.name = "welcome".to_string();
    value.embedded = Either::from_a(Email {
        address: "a@example.com".to_string(),
    });
    value
        .additional_properties
        .insert("custom".to_string(), "v".to_string());

    let json = serde_json::to_value(&value).unwrap();
    assert_eq!(
        serde_json::json!({
            "name": "welcome",
            "address": "a@example.com",
            "custom": "v"
        }),
        json
    );
}

#[test]
fn mixed_composition_round_trips() {
    let json = serde_json::json!({
        "name": "welcome",
        "url": "https://example.com/hook",
        "custom": "v"
    });
    let value: Notification = serde_json::from_value(json.clone()).unwrap();
    assert!(value.embedded.is_b());
    assert_eq!(Some(&"v".to_string()), value.additional_properties.get("custom"));
    assert_eq!(json, serde_json::to_value(&value).unwrap());
}
