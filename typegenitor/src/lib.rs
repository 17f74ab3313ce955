//! Facade for the typegenitor code generator: configuration loading,
//! file output with the scaffold policy, and the compile-time
//! [`generate_api!`] macro.
//!
//! The heavy lifting lives in `typegenitor-core`; this crate is the thin
//! driver layer around it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};

pub use typegenitor_core::{Config, GeneratedOutput, RenderedFile, Role, generate_module};
pub use typegenitor_macro::generate_api;

/// Driver-level settings for one generation run.
#[derive(Default, Debug, PartialEq)]
pub struct ApiConfig {
    /// Path to the input OpenAPI spec from which we want to generate code
    pub path: Option<String>,
    /// Path to the YAML configuration file
    pub config_path: Option<String>,
    /// Overwrite scaffold files that already exist at the destination
    pub overwrite_scaffold: bool,
}

impl ApiConfig {
    pub fn new_from_path(path: String) -> Self {
        Self {
            path: Some(path),
            ..Self::default()
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config_path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("cannot read configuration '{path}'"))?;
                Config::from_yaml(&text)
                    .with_context(|| format!("cannot parse configuration '{path}'"))
            }
            None => Ok(Config::default()),
        }
    }
}

/// Generate from the configured spec path and write the output files.
/// Nothing is written when generation fails.
pub fn generate_files(api: &ApiConfig) -> anyhow::Result<Vec<PathBuf>> {
    let path = api
        .path
        .as_ref()
        .ok_or_else(|| anyhow!("no path to OpenAPI file specified"))?;
    let bytes =
        fs::read(path).with_context(|| format!("cannot read specification '{path}'"))?;
    let config = api.load_config()?;
    let output = typegenitor_core::generate(&bytes, &config)
        .map_err(|e| anyhow!("generation failed for '{path}': {e}"))?;
    write_output(&output, &config, api.overwrite_scaffold)
}

/// Write the rendered roles according to the output configuration.
///
/// Single-file mode concatenates every role; multi-file mode writes one
/// file per role under `<directory>/<package_name>/`. Scaffold files that
/// already exist are preserved unless overwriting is requested.
pub fn write_output(
    output: &GeneratedOutput,
    config: &Config,
    overwrite_scaffold: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    let directory = PathBuf::from(config.output.directory.as_deref().unwrap_or("."));
    let mut written = Vec::new();

    if config.output.use_single_file {
        let filename = config
            .output
            .filename
            .clone()
            .unwrap_or_else(|| default_filename(config));
        let target = directory.join(filename);
        write_file(&target, &output.concatenated())?;
        written.push(target);
        return Ok(written);
    }

    let package_dir = if config.package_name.is_empty() {
        directory
    } else {
        directory.join(&config.package_name)
    };
    for (role, file) in output.roles() {
        let target = package_dir.join(format!("{}.rs", role.as_str()));
        if file.scaffold && target.exists() && !overwrite_scaffold {
            log::debug!("preserving existing scaffold '{}'", target.display());
            continue;
        }
        write_file(&target, &file.contents)?;
        written.push(target);
    }
    Ok(written)
}

fn default_filename(config: &Config) -> String {
    if config.package_name.is_empty() {
        "generated.rs".to_string()
    } else {
        format!("{}.rs", config.package_name)
    }
}

fn write_file(target: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create '{}'", parent.display()))?;
    }
    fs::write(target, contents).with_context(|| format!("cannot write '{}'", target.display()))
}
