//! Discriminator dispatch for generated union deserializers.
//!
//! Generated code reads the discriminator property first and unmarshals
//! into the matching variant; the heuristic decode order never applies when
//! a discriminator is declared.

use serde_json::Value;

/// The discriminator property is missing or its value is not in the mapping.
#[derive(Debug)]
pub struct UnknownDiscriminatorError {
    property: String,
    value: Option<String>,
}

impl UnknownDiscriminatorError {
    pub fn missing(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: None,
        }
    }

    pub fn unknown(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: Some(value.into()),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl std::fmt::Display for UnknownDiscriminatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(
                f,
                "unknown discriminator value '{value}' for property '{}'",
                self.property
            ),
            None => write!(f, "missing discriminator property '{}'", self.property),
        }
    }
}

impl std::error::Error for UnknownDiscriminatorError {}

/// Read the discriminator property from a decoded payload.
pub fn discriminator_value<'a>(
    payload: &'a Value,
    property: &str,
) -> Result<&'a str, UnknownDiscriminatorError> {
    match payload.get(property) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(UnknownDiscriminatorError::missing(property)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_the_tag() {
        let payload = serde_json::json!({"type": "b", "weight": 3});
        assert_eq!("b", discriminator_value(&payload, "type").unwrap());
    }

    #[test]
    fn missing_tag_is_an_error() {
        let payload = serde_json::json!({"weight": 3});
        let err = discriminator_value(&payload, "type").unwrap_err();
        assert_eq!("missing discriminator property 'type'", err.to_string());
    }

    #[test]
    fn unknown_tag_reports_the_value() {
        let err = UnknownDiscriminatorError::unknown("type", "z");
        assert_eq!(
            "unknown discriminator value 'z' for property 'type'",
            err.to_string()
        );
    }
}
