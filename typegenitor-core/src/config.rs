//! Generation configuration, deserialized from YAML by the driver.
//!
//! Field names follow the configuration file's camelCase keys.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::spec::Operation;

fn default_true() -> bool {
    true
}

fn default_int_type() -> String {
    "i64".to_string()
}

/// The full option set of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Logical package/namespace for emitted types.
    pub package_name: String,
    pub output: OutputConfig,
    pub generate: GenerateConfig,
    /// Disable dead-type pruning.
    pub skip_prune: bool,
    /// Response types implementing the error-reporting contract, mapped to
    /// the JSON path of their message field. Forbids aliasing of the type.
    pub error_mapping: IndexMap<String, String>,
    pub filter: FilterConfig,
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputConfig {
    /// Combine all roles into one output instead of per-role files.
    pub use_single_file: bool,
    /// Destination root; in multi-file mode the package name is appended.
    pub directory: Option<String>,
    /// Output name, used only in single-file mode.
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateConfig {
    #[serde(default = "default_true")]
    pub client: bool,
    #[serde(default = "default_true")]
    pub models: bool,
    pub mcp_server: Option<McpServerConfig>,
    pub handler: Option<HandlerConfig>,
    pub validation: ValidationConfig,
    /// Prefix every enum constant with the type name, also when the value
    /// alone would be a valid identifier.
    pub always_prefix_enum_values: bool,
    /// Rust type for unconstrained integers.
    #[serde(default = "default_int_type")]
    pub default_int_type: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            client: true,
            models: true,
            mcp_server: None,
            handler: None,
            validation: ValidationConfig::default(),
            always_prefix_enum_values: false,
            default_int_type: default_int_type(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationConfig {
    /// Generate no validation code at all.
    pub skip: bool,
    /// Also validate decoded response payloads in the client.
    pub response: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct McpServerConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandlerConfig {
    pub validation: HandlerValidationConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandlerValidationConfig {
    pub request: bool,
    pub response: bool,
}

/// Predicates over paths, tags, operation-ids, and extensions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterRules {
    pub paths: Vec<String>,
    pub tags: Vec<String>,
    pub operation_ids: Vec<String>,
    /// Extension keys whose presence selects the operation.
    pub extensions: Vec<String>,
}

impl FilterRules {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
            && self.tags.is_empty()
            && self.operation_ids.is_empty()
            && self.extensions.is_empty()
    }

    fn matches(&self, op: &Operation) -> bool {
        self.paths.iter().any(|p| p == &op.path)
            || self.tags.iter().any(|t| op.tags.contains(t))
            || self
                .operation_ids
                .iter()
                .any(|id| Some(id.as_str()) == op.operation_id.as_deref())
            || self.extensions.iter().any(|key| op.extensions.has_key(key))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    pub include: FilterRules,
    pub exclude: FilterRules,
}

impl FilterConfig {
    /// Whether the filtered view keeps this operation. An empty include set
    /// includes everything; exclusion wins over inclusion.
    pub fn retains(&self, op: &Operation) -> bool {
        let included = self.include.is_empty() || self.include.matches(op);
        included && !(!self.exclude.is_empty() && self.exclude.matches(op))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::Extensions;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.generate.client);
        assert!(config.generate.models);
        assert_eq!("i64", config.generate.default_int_type);
        assert!(!config.skip_prune);
    }

    #[test]
    fn from_yaml() {
        let yaml = r"
packageName: petshop
output:
    useSingleFile: true
    filename: petshop.rs
generate:
    client: false
    alwaysPrefixEnumValues: true
    defaultIntType: i32
skipPrune: true
errorMapping:
    Error: '$.message'
filter:
    include:
        tags: [pets]
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!("petshop", config.package_name);
        assert!(config.output.use_single_file);
        assert!(!config.generate.client);
        assert!(config.generate.models);
        assert!(config.generate.always_prefix_enum_values);
        assert_eq!("i32", config.generate.default_int_type);
        assert!(config.skip_prune);
        assert_eq!("$.message", config.error_mapping["Error"]);
        assert_eq!(vec!["pets"], config.filter.include.tags);
    }

    fn op(path: &str, tags: &[&str], id: Option<&str>) -> Operation {
        Operation {
            method: http::Method::GET,
            path: path.to_string(),
            operation_id: id.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            deprecated: false,
            parameters: Vec::new(),
            request_body: None,
            responses: Vec::new(),
            extensions: Extensions::default(),
        }
    }

    #[test]
    fn filter_include_exclude() {
        let mut filter = FilterConfig::default();
        assert!(filter.retains(&op("/pets", &["pets"], None)));

        filter.include.tags = vec!["pets".to_string()];
        assert!(filter.retains(&op("/pets", &["pets"], None)));
        assert!(!filter.retains(&op("/users", &["users"], None)));

        filter.exclude.operation_ids = vec!["deletePet".to_string()];
        assert!(!filter.retains(&op("/pets", &["pets"], Some("deletePet"))));
    }
}
