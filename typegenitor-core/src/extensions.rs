//! Recognized `x-*` extensions.
//!
//! The set is closed: keys listed here steer generation, all other `x-*`
//! keys are kept raw for filter predicates but otherwise ignored.

use indexmap::IndexMap;
use serde_json::Value;

pub const X_RUST_NAME: &str = "x-rust-name";
pub const X_RUST_TYPE: &str = "x-rust-type";
pub const X_RUST_TYPE_IMPORT: &str = "x-rust-type-import";
pub const X_RUST_SKIP_OPTIONAL: &str = "x-rust-skip-optional";
pub const X_JSON_IGNORE: &str = "x-json-ignore";
pub const X_OMITEMPTY: &str = "x-omitempty";
pub const X_EXTRA_TAGS: &str = "x-extra-tags";
pub const X_ENUM_NAMES: &str = "x-enum-names";
pub const X_DEPRECATED_REASON: &str = "x-deprecated-reason";
pub const X_ONLY_HONOUR_RUST_NAME: &str = "x-only-honour-rust-name";
pub const X_SKIP: &str = "x-skip";
pub const X_MCP: &str = "x-mcp";

/// MCP tool steering for one operation (`x-mcp`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McpExtension {
    pub skip: bool,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// The recognized extensions of one schema, field, or operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    /// Rename of the generated type or field; uniqueness is still enforced
    /// by the tracker, so a suffix may be appended downstream.
    pub rust_name: Option<String>,
    /// Replace the generated type with an external one.
    pub rust_type: Option<String>,
    /// Crate import the external type comes from.
    pub rust_type_import: Option<String>,
    /// Emit the type directly even when the schema is optional.
    pub skip_optional: bool,
    /// Omit the field from the wire form.
    pub json_ignore: bool,
    /// Skip serializing the field when it holds its empty value.
    pub omit_empty: bool,
    /// Additional serialisation/validation attributes, tag name to value.
    pub extra_tags: IndexMap<String, String>,
    /// Overrides for generated enum constant names, aligned with the
    /// `enum` value list.
    pub enum_names: Vec<String>,
    pub deprecated_reason: Option<String>,
    /// The renamed name wins even across extracted inline types.
    pub only_honour_rust_name: bool,
    /// Disable generation for this component schema.
    pub skip: bool,
    pub mcp: Option<McpExtension>,
    /// Every `x-*` key as found in the document; used by filter predicates.
    pub raw: IndexMap<String, Value>,
}

impl Extensions {
    pub fn from_entries<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>) -> Self {
        let mut ext = Extensions::default();
        for (key, value) in entries {
            if !key.starts_with("x-") {
                continue;
            }
            match key.as_str() {
                X_RUST_NAME => ext.rust_name = value.as_str().map(str::to_string),
                X_RUST_TYPE => ext.rust_type = value.as_str().map(str::to_string),
                X_RUST_TYPE_IMPORT => {
                    ext.rust_type_import = value.as_str().map(str::to_string);
                }
                X_RUST_SKIP_OPTIONAL => ext.skip_optional = value.as_bool().unwrap_or(false),
                X_JSON_IGNORE => ext.json_ignore = value.as_bool().unwrap_or(false),
                X_OMITEMPTY => ext.omit_empty = value.as_bool().unwrap_or(false),
                X_EXTRA_TAGS => {
                    if let Value::Object(map) = value {
                        for (tag, tag_value) in map {
                            let rendered = match tag_value {
                                Value::String(s) => s.clone(),
                                other => other.to_string(),
                            };
                            ext.extra_tags.insert(tag.clone(), rendered);
                        }
                    }
                }
                X_ENUM_NAMES => {
                    if let Value::Array(items) = value {
                        ext.enum_names = items
                            .iter()
                            .filter_map(|v| v.as_str().map(str::to_string))
                            .collect();
                    }
                }
                X_DEPRECATED_REASON => {
                    ext.deprecated_reason = value.as_str().map(str::to_string);
                }
                X_ONLY_HONOUR_RUST_NAME => {
                    ext.only_honour_rust_name = value.as_bool().unwrap_or(false);
                }
                X_SKIP => ext.skip = value.as_bool().unwrap_or(false),
                X_MCP => ext.mcp = Some(parse_mcp(value)),
                _ => (), // unknown x-* keys are ignored
            }
            ext.raw.insert(key.clone(), value.clone());
        }
        ext
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.raw.contains_key(key)
    }
}

fn parse_mcp(value: &Value) -> McpExtension {
    let mut mcp = McpExtension::default();
    if let Value::Object(map) = value {
        mcp.skip = map.get("skip").and_then(Value::as_bool).unwrap_or(false);
        mcp.name = map.get("name").and_then(Value::as_str).map(str::to_string);
        mcp.description = map
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    mcp
}
