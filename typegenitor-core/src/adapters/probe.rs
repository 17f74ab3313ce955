use std::io::{BufRead, BufReader};

use lazy_static::lazy_static;
use regex::Regex;

use crate::adapters::OasMajorVersion;
use crate::error::SpecError;

// YAML form `openapi: 3.0.3` and JSON form `"openapi": "3.0.3"`
const OAS_VERSION_YAML_STR: &str = r"\s*openapi:\s*((\d+\.\d+)\.\d+)";
const OAS_VERSION_JSON_STR: &str = r#""openapi"\s*:\s*"((\d+\.\d+)\.\d+)""#;

lazy_static! {
    static ref YAML_VERSION: Regex = Regex::new(OAS_VERSION_YAML_STR).unwrap();
    static ref JSON_VERSION: Regex = Regex::new(OAS_VERSION_JSON_STR).unwrap();
}

/// Probe the declared OAS version from the first lines of the input
/// without parsing the whole document.
pub(super) fn probe_oas_version(bytes: &[u8]) -> Result<OasMajorVersion, SpecError> {
    const MAX_PROBE_LINES: usize = 16;
    let mut line_count = 0;
    let input = BufReader::new(bytes);

    for line_result in input.lines() {
        let line = line_result?;
        if line_count >= MAX_PROBE_LINES {
            break;
        }
        let captures = JSON_VERSION
            .captures(&line)
            .or_else(|| YAML_VERSION.captures(&line));
        if let Some(captures) = captures {
            let major_minor_version = captures.get(2).unwrap().as_str();
            let full_version = captures.get(1).unwrap().as_str();
            let v = match major_minor_version {
                #[cfg(feature = "oas30")]
                "3.0" => OasMajorVersion::Oas30,
                #[cfg(feature = "oas31")]
                "3.1" => OasMajorVersion::Oas31,
                _ => {
                    return Err(SpecError::UnsupportedVersion(full_version.to_string()));
                }
            };

            return Ok(v);
        } else {
            line_count += 1;
        }
    }

    Err(SpecError::NoVersionFound)
}
