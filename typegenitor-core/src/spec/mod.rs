//! The in-memory, ref-resolved view of an OpenAPI document.
//!
//! Adapters (see [`crate::adapters`]) convert a parsed 3.0 or 3.1 document
//! into this model exactly once; everything downstream reads it immutably.
//! `Schema` is a sum type dispatched by exhaustive matching, so unhandled
//! variants surface as compile-time gaps rather than runtime surprises.

use std::str::FromStr;

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::FilterConfig;
use crate::extensions::Extensions;

/// An absolute JSON-pointer string identifying a schema location,
/// e.g. `#/components/schemas/Pet`. Unique within a spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ref(String);

pub const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

impl Ref {
    pub fn new(pointer: impl Into<String>) -> Self {
        Self(pointer.into())
    }

    pub fn component_schema(name: &str) -> Self {
        Self(format!("{COMPONENT_SCHEMA_PREFIX}{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The component name if this points into `#/components/schemas/`.
    pub fn schema_name(&self) -> Option<&str> {
        self.0.strip_prefix(COMPONENT_SCHEMA_PREFIX)
    }

    pub fn is_path_pointer(&self) -> bool {
        self.0.starts_with("#/paths/")
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// JSON primitive types, as per the `type` keyword.
/// `number` and `integer` stay distinct so the integer default width
/// from the configuration can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Boolean,
    Integer,
    Number,
    String,
}

/// Formats, as per
/// https://spec.openapis.org/oas/v3.0.4.html#data-type-format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Int32,
    Int64,
    Float,
    Double,
    Byte,
    Binary,
    Date,
    DateTime,
    Uuid,
    Password,
}

impl Format {
    /// Whether values of this format compare by `==` in generated code;
    /// non-comparable formats never become enum constants.
    pub fn is_comparable(self) -> bool {
        !matches!(
            self,
            Format::Date | Format::DateTime | Format::Binary | Format::Byte | Format::Uuid
        )
    }
}

/// The `additionalProperties` policy of an object schema.
///
/// `Forbidden` covers both an explicit `false` and an absent keyword; the
/// shape rules only fire on an explicitly present policy.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    #[default]
    Forbidden,
    Untyped,
    Typed(Box<Schema>),
}

impl AdditionalProperties {
    pub fn is_present(&self) -> bool {
        !matches!(self, AdditionalProperties::Forbidden)
    }
}

/// The constraint bundle attached to a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub min_properties: Option<u64>,
    pub max_properties: Option<u64>,
    pub multiple_of: Option<f64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        *self == Constraints::default()
    }

    /// Outer constraints win over inner ones on merge (bubble-up keeps the
    /// wrapper's refinements).
    pub fn merged_over(&self, inner: &Constraints) -> Constraints {
        Constraints {
            minimum: self.minimum.or(inner.minimum),
            maximum: self.maximum.or(inner.maximum),
            exclusive_minimum: self.exclusive_minimum || inner.exclusive_minimum,
            exclusive_maximum: self.exclusive_maximum || inner.exclusive_maximum,
            min_length: self.min_length.or(inner.min_length),
            max_length: self.max_length.or(inner.max_length),
            pattern: self.pattern.clone().or_else(|| inner.pattern.clone()),
            min_items: self.min_items.or(inner.min_items),
            max_items: self.max_items.or(inner.max_items),
            min_properties: self.min_properties.or(inner.min_properties),
            max_properties: self.max_properties.or(inner.max_properties),
            multiple_of: self.multiple_of.or(inner.multiple_of),
        }
    }
}

/// Discriminator of a `oneOf`/`anyOf` composition: property name plus the
/// value-to-ref mapping in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discriminator {
    pub property: String,
    pub mapping: IndexMap<String, Ref>,
}

/// What a schema node fundamentally is.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaKind {
    /// No `type` keyword; any JSON value.
    #[default]
    Any,
    /// `type: "null"` (OAS 3.1).
    Null,
    Primitive(PrimitiveType),
    Object {
        /// Insertion-ordered property mapping; document order is emission
        /// order.
        properties: IndexMap<String, Schema>,
        required: Vec<String>,
        additional: AdditionalProperties,
    },
    Array {
        items: Option<Box<Schema>>,
    },
    AllOf(Vec<Schema>),
    AnyOf(Vec<Schema>),
    OneOf(Vec<Schema>),
    /// An unresolved-by-value `$ref`; resolution goes through the tracker
    /// by name, which is what makes recursive schemas representable.
    Reference(Ref),
}

/// One schema node of the input document.
///
/// See https://spec.openapis.org/oas/v3.0.4.html#schema-object
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    /// Component name, when defined under `#/components/schemas/`.
    pub name: Option<String>,
    pub kind: SchemaKind,
    pub format: Option<Format>,
    pub nullable: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub deprecated: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    /// `enum` values in document order.
    pub enum_values: Vec<Value>,
    pub discriminator: Option<Discriminator>,
    pub constraints: Constraints,
    pub extensions: Extensions,
}

impl Schema {
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, SchemaKind::Reference(_))
    }

    pub fn has_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }

    /// A null-ish variant inside a union: `type: "null"` or an otherwise
    /// empty nullable schema.
    pub fn is_null_variant(&self) -> bool {
        match &self.kind {
            SchemaKind::Null => true,
            SchemaKind::Any => self.nullable,
            _ => false,
        }
    }
}

/// https://spec.openapis.org/oas/v3.0.4.html#x4-7-12-1-parameter-locations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

/// A status-code pattern of a responses map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusSpec {
    Code(u16),
    Range(u16),
    Default,
}

impl StatusSpec {
    pub fn is_success(&self) -> bool {
        match self {
            StatusSpec::Code(c) => (100..400).contains(c),
            StatusSpec::Range(r) => (1..4).contains(r),
            StatusSpec::Default => false,
        }
    }
}

impl FromStr for StatusSpec {
    type Err = SpecStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("default") {
            return Ok(StatusSpec::Default);
        }
        if let Some(prefix) = s.strip_suffix("XX").or_else(|| s.strip_suffix("xx")) {
            let range: u16 = prefix
                .parse()
                .map_err(|_| SpecStatusParseError(s.to_string()))?;
            if (1..=5).contains(&range) {
                return Ok(StatusSpec::Range(range));
            }
            return Err(SpecStatusParseError(s.to_string()));
        }
        let code: u16 = s.parse().map_err(|_| SpecStatusParseError(s.to_string()))?;
        if (100..600).contains(&code) {
            Ok(StatusSpec::Code(code))
        } else {
            Err(SpecStatusParseError(s.to_string()))
        }
    }
}

impl std::fmt::Display for StatusSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusSpec::Code(c) => write!(f, "{c}"),
            StatusSpec::Range(r) => write!(f, "{r}XX"),
            StatusSpec::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a valid response status pattern")]
pub struct SpecStatusParseError(String);

/// One operation parameter with its resolved schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Option<Schema>,
    pub description: Option<String>,
    pub extensions: Extensions,
}

/// The request body of an operation, reduced to its JSON-capable content.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub required: bool,
    pub media_type: Option<String>,
    pub schema: Option<Schema>,
}

/// One response of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub media_type: Option<String>,
    pub schema: Option<Schema>,
    pub description: Option<String>,
}

/// One operation of the document, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub method: http::Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub responses: Vec<(StatusSpec, ResponseSpec)>,
    pub extensions: Extensions,
}

/// The resolved, order-preserving document view one generation run works
/// from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecModel {
    schemas: IndexMap<String, Schema>,
    operations: Vec<Operation>,
}

impl SpecModel {
    pub fn new(schemas: IndexMap<String, Schema>, operations: Vec<Operation>) -> Self {
        Self {
            schemas,
            operations,
        }
    }

    /// Ordered `(Ref, Schema)` over `#/components/schemas/*`.
    pub fn schemas(&self) -> impl Iterator<Item = (Ref, &Schema)> {
        self.schemas
            .iter()
            .map(|(name, schema)| (Ref::component_schema(name), schema))
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Resolve a component-schema ref.
    pub fn resolve(&self, reference: &Ref) -> Option<&Schema> {
        self.schemas.get(reference.schema_name()?)
    }

    /// Derived view restricted by the include/exclude predicates. Schemas
    /// are kept; unreferenced ones fall to the pruning pass.
    pub fn filter(&self, filter: &FilterConfig) -> SpecModel {
        let operations = self
            .operations
            .iter()
            .filter(|op| filter.retains(op))
            .cloned()
            .collect();
        SpecModel {
            schemas: self.schemas.clone(),
            operations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_schema_name() {
        let r = Ref::component_schema("Pet");
        assert_eq!("#/components/schemas/Pet", r.as_str());
        assert_eq!(Some("Pet"), r.schema_name());
        assert!(!r.is_path_pointer());
        assert!(Ref::new("#/paths/~1pets/get").is_path_pointer());
    }

    #[test]
    fn status_spec_parsing() {
        assert_eq!(StatusSpec::Code(200), "200".parse().unwrap());
        assert_eq!(StatusSpec::Range(2), "2XX".parse().unwrap());
        assert_eq!(StatusSpec::Default, "default".parse().unwrap());
        assert!("9XX".parse::<StatusSpec>().is_err());
        assert!("42".parse::<StatusSpec>().is_err());
        assert!(StatusSpec::Code(204).is_success());
        assert!(!StatusSpec::Code(404).is_success());
    }

    #[test]
    fn constraints_merge_prefers_outer() {
        let outer = Constraints {
            minimum: Some(1.0),
            ..Constraints::default()
        };
        let inner = Constraints {
            minimum: Some(0.0),
            max_length: Some(10),
            ..Constraints::default()
        };
        let merged = outer.merged_over(&inner);
        assert_eq!(Some(1.0), merged.minimum);
        assert_eq!(Some(10), merged.max_length);
    }
}
