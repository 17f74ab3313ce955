//! Validation error types and constraint checks used by generated code.
//!
//! A single offending field produces a [`ValidationError`]; a validation
//! run accumulates them into [`ValidationErrors`]. Field paths are built
//! segment by segment while descending (`Parent.Child[index].Leaf`).

use std::collections::HashMap;
use std::fmt;

/// Path to the field a validation error refers to.
///
/// Segments are joined with `.`, array positions with `[index]`, e.g.
/// `Children[0].Value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn field(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{name}", self.0))
        }
    }

    pub fn index(&self, index: usize) -> Self {
        Self(format!("{}[{index}]", self.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single field/message pair produced by a failed constraint check.
///
/// The underlying driver error, if any, is preserved and reachable through
/// [`std::error::Error::source`].
#[derive(Debug)]
pub struct ValidationError {
    field: String,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Multiple [`ValidationError`]s reported together.
#[derive(Debug, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Recursive validation entry point implemented by generated types.
///
/// Implementations must only validate the active variant of a union and
/// must terminate for every finite instance.
pub trait Validate {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors);

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.validate_at(&FieldPath::root(), &mut errors);
        errors.into_result()
    }
}

// Bare primitives carry no constraints of their own; constrained
// primitives arrive wrapped in a generated newtype that overrides this.
macro_rules! unconstrained {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Validate for $ty {
                fn validate_at(&self, _path: &FieldPath, _errors: &mut ValidationErrors) {}
            }
        )+
    };
}

unconstrained!(bool, i32, i64, u32, u64, f32, f64, String, serde_json::Value, ());

impl<T: Validate> Validate for Option<T> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        if let Some(inner) = self {
            inner.validate_at(path, errors);
        }
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        for (i, item) in self.iter().enumerate() {
            item.validate_at(&path.index(i), errors);
        }
    }
}

impl<T: Validate> Validate for Box<T> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        self.as_ref().validate_at(path, errors);
    }
}

// Map entries validate under the entry's key. Keys are sorted so that the
// reported error order does not depend on hash order.
impl<T: Validate> Validate for HashMap<String, T> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        let mut keys: Vec<&String> = self.keys().collect();
        keys.sort();
        for key in keys {
            if let Some(value) = self.get(key) {
                value.validate_at(&path.field(key), errors);
            }
        }
    }
}

/// Constraint checks with the canonical message texts.
///
/// Each check returns `Some(ValidationError)` on violation so generated
/// `Validate` impls can chain them into the accumulator.
pub mod constraint {
    use super::{FieldPath, ValidationError};

    pub fn min_length(path: &FieldPath, value: &str, min: u64) -> Option<ValidationError> {
        if (value.chars().count() as u64) < min {
            Some(ValidationError::new(
                path.as_str(),
                format!("length must be greater than or equal to {min}"),
            ))
        } else {
            None
        }
    }

    pub fn max_length(path: &FieldPath, value: &str, max: u64) -> Option<ValidationError> {
        if (value.chars().count() as u64) > max {
            Some(ValidationError::new(
                path.as_str(),
                format!("length must be less than or equal to {max}"),
            ))
        } else {
            None
        }
    }

    pub fn pattern(path: &FieldPath, value: &str, pattern: &str) -> Option<ValidationError> {
        match regex::Regex::new(pattern) {
            Ok(re) if re.is_match(value) => None,
            Ok(_) => Some(ValidationError::new(
                path.as_str(),
                format!("must match the pattern '{pattern}'"),
            )),
            Err(e) => Some(
                ValidationError::new(path.as_str(), format!("invalid pattern '{pattern}'"))
                    .with_source(e),
            ),
        }
    }

    pub fn minimum<T>(path: &FieldPath, value: T, min: T, exclusive: bool) -> Option<ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        let violated = if exclusive { value <= min } else { value < min };
        if violated {
            let relation = if exclusive {
                "must be greater than"
            } else {
                "must be greater than or equal to"
            };
            Some(ValidationError::new(
                path.as_str(),
                format!("{relation} {min}"),
            ))
        } else {
            None
        }
    }

    pub fn maximum<T>(path: &FieldPath, value: T, max: T, exclusive: bool) -> Option<ValidationError>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        let violated = if exclusive { value >= max } else { value > max };
        if violated {
            let relation = if exclusive {
                "must be less than"
            } else {
                "must be less than or equal to"
            };
            Some(ValidationError::new(
                path.as_str(),
                format!("{relation} {max}"),
            ))
        } else {
            None
        }
    }

    pub fn multiple_of_int(path: &FieldPath, value: i64, multiple: i64) -> Option<ValidationError> {
        if multiple != 0 && value % multiple != 0 {
            Some(ValidationError::new(
                path.as_str(),
                format!("must be a multiple of {multiple}"),
            ))
        } else {
            None
        }
    }

    pub fn multiple_of_float(path: &FieldPath, value: f64, multiple: f64) -> Option<ValidationError> {
        let quotient = value / multiple;
        if multiple != 0.0 && (quotient - quotient.round()).abs() > f64::EPSILON {
            Some(ValidationError::new(
                path.as_str(),
                format!("must be a multiple of {multiple}"),
            ))
        } else {
            None
        }
    }

    pub fn min_items(path: &FieldPath, len: usize, min: u64) -> Option<ValidationError> {
        if (len as u64) < min {
            Some(ValidationError::new(
                path.as_str(),
                format!("must have at least {min} items"),
            ))
        } else {
            None
        }
    }

    pub fn max_items(path: &FieldPath, len: usize, max: u64) -> Option<ValidationError> {
        if (len as u64) > max {
            Some(ValidationError::new(
                path.as_str(),
                format!("must have no more than {max} items"),
            ))
        } else {
            None
        }
    }

    pub fn min_properties(path: &FieldPath, len: usize, min: u64) -> Option<ValidationError> {
        if (len as u64) < min {
            Some(ValidationError::new(
                path.as_str(),
                format!("must have at least {min} properties"),
            ))
        } else {
            None
        }
    }

    pub fn max_properties(path: &FieldPath, len: usize, max: u64) -> Option<ValidationError> {
        if (len as u64) > max {
            Some(ValidationError::new(
                path.as_str(),
                format!("must have no more than {max} properties"),
            ))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_path_construction() {
        let path = FieldPath::root().field("Children").index(0).field("Value");
        assert_eq!("Children[0].Value", path.as_str());
    }

    #[test]
    fn min_length_message() {
        let path = FieldPath::root().field("Name");
        let err = constraint::min_length(&path, "", 1).unwrap();
        assert_eq!("Name", err.field());
        assert_eq!("length must be greater than or equal to 1", err.message());
        assert!(constraint::min_length(&path, "x", 1).is_none());
    }

    #[test]
    fn min_properties_message() {
        let err = constraint::min_properties(&FieldPath::root(), 0, 2).unwrap();
        assert_eq!("must have at least 2 properties", err.message());
    }

    #[test]
    fn minimum_exclusive_and_inclusive() {
        let path = FieldPath::root().field("Count");
        assert!(constraint::minimum(&path, 1i64, 1i64, false).is_none());
        let err = constraint::minimum(&path, 1i64, 1i64, true).unwrap();
        assert_eq!("must be greater than 1", err.message());
        let err = constraint::minimum(&path, 0i64, 1i64, false).unwrap();
        assert_eq!("must be greater than or equal to 1", err.message());
    }

    #[test]
    fn errors_accumulate_and_display() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::new("A", "first"));
        errors.push(ValidationError::new("B", "second"));
        assert_eq!(2, errors.len());
        assert_eq!("A: first; B: second", errors.to_string());
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn source_chain_is_preserved() {
        let driver = std::io::Error::new(std::io::ErrorKind::InvalidData, "driver failure");
        let err = ValidationError::new("X", "invalid").with_source(driver);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!("driver failure", source.to_string());
    }

    #[test]
    fn map_validation_is_deterministic() {
        struct Leaf(&'static str);
        impl Validate for Leaf {
            fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
                if let Some(e) = constraint::min_length(path, self.0, 1) {
                    errors.push(e);
                }
            }
        }

        let mut map = HashMap::new();
        map.insert("zeta".to_string(), Leaf(""));
        map.insert("alpha".to_string(), Leaf(""));
        let mut errors = ValidationErrors::new();
        map.validate_at(&FieldPath::root(), &mut errors);
        let fields: Vec<&str> = errors.iter().map(|e| e.field()).collect();
        assert_eq!(vec!["alpha", "zeta"], fields);
    }
}
