//! Raw-payload union for three-or-more variant compositions.
//!
//! The payload is kept undecoded; typed accessors decode on demand, so a
//! union with many variants never pays for the variants nobody asks for.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::validation::{Validate, ValidationErrors};

/// `as_type::<T>()` was invoked for a variant the payload does not match.
#[derive(Debug, thiserror::Error)]
#[error("payload does not parse as {requested}")]
pub struct WrongVariantError {
    requested: &'static str,
    #[source]
    source: serde_json::Error,
}

impl WrongVariantError {
    pub fn requested(&self) -> &'static str {
        self.requested
    }
}

/// Error from [`RawUnion::as_validated`]: either the payload is the wrong
/// variant, or it decoded but failed its constraints.
#[derive(Debug, thiserror::Error)]
pub enum RawUnionError {
    #[error(transparent)]
    WrongVariant(#[from] WrongVariantError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// A union of three or more variants, stored as the unparsed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUnion {
    payload: Value,
}

impl Default for RawUnion {
    fn default() -> Self {
        Self {
            payload: Value::Null,
        }
    }
}

impl RawUnion {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    pub fn is_null(&self) -> bool {
        self.payload.is_null()
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Decode the payload as `T`.
    pub fn as_type<T: DeserializeOwned>(&self) -> Result<T, WrongVariantError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| WrongVariantError {
            requested: std::any::type_name::<T>(),
            source,
        })
    }

    /// Decode the payload as `T` and run its constraint checks.
    pub fn as_validated<T: DeserializeOwned + Validate>(&self) -> Result<T, RawUnionError> {
        let decoded = self.as_type::<T>()?;
        decoded.validate()?;
        Ok(decoded)
    }

    /// Replace the payload with the serialized form of `value`.
    pub fn replace_with<T: Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.payload = serde_json::to_value(value)?;
        Ok(())
    }
}

impl Serialize for RawUnion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawUnion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            payload: Value::deserialize(deserializer)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldPath, constraint};
    use pretty_assertions::assert_eq;

    /// Prototype of a generated primitive wrapper carrying `minimum: 1`.
    #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
    #[serde(transparent)]
    struct PositiveInt(i64);

    impl Validate for PositiveInt {
        fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
            if let Some(e) = constraint::minimum(path, self.0, 1, false) {
                errors.push(e);
            }
        }
    }

    #[test]
    fn raw_unmarshal_accepts_any_variant() {
        let union: RawUnion = serde_json::from_str("0").unwrap();
        // raw decode succeeds even though validation would not
        assert_eq!(0, union.as_type::<PositiveInt>().unwrap().0);
    }

    #[test]
    fn as_validated_reports_minimum_violation() {
        let union: RawUnion = serde_json::from_str("0").unwrap();
        match union.as_validated::<PositiveInt>() {
            Err(RawUnionError::Validation(errors)) => {
                assert_eq!(
                    "must be greater than or equal to 1",
                    errors.iter().next().unwrap().message()
                );
            }
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[test]
    fn wrong_variant_fails_with_typed_error() {
        let union: RawUnion = serde_json::from_str(r#""some text""#).unwrap();
        let err = union.as_type::<PositiveInt>().unwrap_err();
        assert!(err.requested().contains("PositiveInt"));
        // the serde driver error stays reachable
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn replace_with_swaps_the_payload() {
        let mut union = RawUnion::default();
        assert!(union.is_null());
        union.replace_with(&PositiveInt(7)).unwrap();
        assert_eq!(7, union.as_type::<PositiveInt>().unwrap().0);
        let json = serde_json::to_string(&union).unwrap();
        assert_eq!("7", json);
    }
}
