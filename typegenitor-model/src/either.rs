//! Two-variant union with direct JSON dispatch.
//!
//! Storage is a tagged pair, never a memory union: the tag selects which of
//! the two slots is live. A `null` payload clears both slots (empty state).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::validation::{FieldPath, Validate, ValidationError, ValidationErrors};

/// Which slot of an [`Either`] is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EitherTag {
    #[default]
    None,
    A,
    B,
}

/// A two-variant sum type with direct JSON dispatch.
///
/// Serialization emits the live value without a wrapper object.
/// Deserialization attempts variant A first and adopts it unless the decoded
/// A is zero-valued (equal to `A::default()`) while B decodes non-zero; ties
/// resolve to A. When a discriminator governs the union, generated code
/// bypasses this heuristic and constructs via [`Either::from_a`] /
/// [`Either::from_b`] directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Either<A, B> {
    tag: EitherTag,
    a: Option<A>,
    b: Option<B>,
}

impl<A, B> Default for Either<A, B> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<A, B> Either<A, B> {
    /// The empty state: no variant is active.
    pub fn empty() -> Self {
        Self {
            tag: EitherTag::None,
            a: None,
            b: None,
        }
    }

    pub fn from_a(a: A) -> Self {
        Self {
            tag: EitherTag::A,
            a: Some(a),
            b: None,
        }
    }

    pub fn from_b(b: B) -> Self {
        Self {
            tag: EitherTag::B,
            a: None,
            b: Some(b),
        }
    }

    pub fn tag(&self) -> EitherTag {
        self.tag
    }

    pub fn is_a(&self) -> bool {
        self.tag == EitherTag::A
    }

    pub fn is_b(&self) -> bool {
        self.tag == EitherTag::B
    }

    pub fn is_empty(&self) -> bool {
        self.tag == EitherTag::None
    }

    pub fn as_a(&self) -> Option<&A> {
        match self.tag {
            EitherTag::A => self.a.as_ref(),
            _ => None,
        }
    }

    pub fn as_b(&self) -> Option<&B> {
        match self.tag {
            EitherTag::B => self.b.as_ref(),
            _ => None,
        }
    }

    pub fn into_a(self) -> Option<A> {
        match self.tag {
            EitherTag::A => self.a,
            _ => None,
        }
    }

    pub fn into_b(self) -> Option<B> {
        match self.tag {
            EitherTag::B => self.b,
            _ => None,
        }
    }

    pub fn set_a(&mut self, a: A) {
        self.tag = EitherTag::A;
        self.a = Some(a);
        self.b = None;
    }

    pub fn set_b(&mut self, b: B) {
        self.tag = EitherTag::B;
        self.a = None;
        self.b = Some(b);
    }

    pub fn clear(&mut self) {
        self.tag = EitherTag::None;
        self.a = None;
        self.b = None;
    }
}

impl<A: Serialize, B: Serialize> Serialize for Either<A, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.tag {
            EitherTag::A => match &self.a {
                Some(a) => a.serialize(serializer),
                None => serializer.serialize_none(),
            },
            EitherTag::B => match &self.b {
                Some(b) => b.serialize(serializer),
                None => serializer.serialize_none(),
            },
            EitherTag::None => serializer.serialize_none(),
        }
    }
}

impl<'de, A, B> Deserialize<'de> for Either<A, B>
where
    A: DeserializeOwned + Default + PartialEq,
    B: DeserializeOwned + Default + PartialEq,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Self::empty());
        }

        let decoded_a = serde_json::from_value::<A>(value.clone());
        let decoded_b = serde_json::from_value::<B>(value);

        match (decoded_a, decoded_b) {
            (Ok(a), Ok(b)) => {
                // both parse: prefer A except when A carries no information
                // and B does
                if a == A::default() && b != B::default() {
                    Ok(Self::from_b(b))
                } else {
                    Ok(Self::from_a(a))
                }
            }
            (Ok(a), Err(_)) => Ok(Self::from_a(a)),
            (Err(_), Ok(b)) => Ok(Self::from_b(b)),
            (Err(ea), Err(_)) => Err(serde::de::Error::custom(format!(
                "payload matches neither variant: {ea}"
            ))),
        }
    }
}

impl<A: Validate, B: Validate> Validate for Either<A, B> {
    fn validate_at(&self, path: &FieldPath, errors: &mut ValidationErrors) {
        match self.tag {
            EitherTag::A => {
                if let Some(a) = &self.a {
                    a.validate_at(path, errors);
                }
            }
            EitherTag::B => {
                if let Some(b) = &self.b {
                    b.validate_at(path, errors);
                }
            }
            EitherTag::None => {
                errors.push(ValidationError::new(path.as_str(), "no variant is active"));
            }
        }
    }
}
