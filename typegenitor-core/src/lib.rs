//! Core of the typegenitor OpenAPI 3.x code generator.
//!
//! One generation run is a straight pipeline over freshly constructed
//! state, single-threaded and free of global caches:
//!
//! ```text
//! bytes -> SpecModel -> pre-register names -> translate bodies
//!       -> plan roles (+ pruning) -> rendered role files
//! ```
//!
//! The [`generate`] entry point runs the whole pipeline; the stages are
//! public for drivers that need to observe intermediate state.

use std::io::Read;

use indexmap::IndexMap;

pub mod adapters;
pub mod config;
pub mod error;
pub mod extensions;
pub mod plan;
pub mod spec;
pub mod tracker;
pub(crate) mod translate;
pub mod translator;
pub mod typedef;
pub mod writer;

#[cfg(all(test, feature = "oas30"))]
mod test;

pub use config::Config;
pub use error::{Error, Errors, PlanError, SpecError, TrackerError};
pub use plan::Role;
pub use writer::RenderedFile;

/// The rendered output of one generation run, one file per role.
#[derive(Debug, Default)]
pub struct GeneratedOutput {
    files: IndexMap<Role, RenderedFile>,
}

impl GeneratedOutput {
    pub fn file(&self, role: Role) -> Option<&RenderedFile> {
        self.files.get(&role)
    }

    pub fn roles(&self) -> impl Iterator<Item = (Role, &RenderedFile)> {
        self.files.iter().map(|(role, file)| (*role, file))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All roles concatenated in emission order, for single-file output.
    pub fn concatenated(&self) -> String {
        let mut out = String::new();
        for (role, file) in &self.files {
            out.push_str(&format!("// --- {} ---\n", role.as_str()));
            out.push_str(&file.contents);
            if !file.contents.ends_with('\n') {
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

/// Run the full pipeline over raw spec bytes.
///
/// Nothing is written anywhere: the caller owns the output map, and a
/// failed run yields no partial files by construction.
pub fn generate(bytes: &[u8], config: &Config) -> Result<GeneratedOutput, Errors> {
    let model = adapters::load_document(bytes).map_err(Errors::from)?;
    let model = model.filter(&config.filter);
    let translation = translator::translate(&model, config)?;
    let emission = plan::plan(&translation, config)?;
    let files = writer::write(&emission, config)
        .map_err(|e| Errors::from(Error::from(PlanError::Emission(e.to_string()))))?;
    Ok(GeneratedOutput { files })
}

/// Read the input fully, then generate; no reader state survives into
/// translation.
pub fn generate_from_reader(
    mut input: impl Read,
    config: &Config,
) -> Result<GeneratedOutput, Errors> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| Errors::from(SpecError::from(e)))?;
    generate(&bytes, config)
}

/// Generate and wrap the type-bearing roles in a named module, for
/// compile-time expansion by the proc-macro.
pub fn generate_module(
    bytes: &[u8],
    config: &Config,
    module_name: &str,
) -> anyhow::Result<proc_macro2::TokenStream> {
    use anyhow::anyhow;
    use quote::{format_ident, quote};

    let output = generate(bytes, config).map_err(|e| anyhow!("generation failed: {e}"))?;

    let mut items = proc_macro2::TokenStream::new();
    for role in [Role::Models, Role::Responses, Role::Client] {
        if let Some(file) = output.file(role) {
            let parsed: proc_macro2::TokenStream = file
                .contents
                .parse()
                .map_err(|e| anyhow!("generated {} code does not tokenize: {e}", role.as_str()))?;
            items.extend(parsed);
        }
    }

    let module_ident = format_ident!("{}", module_name);
    Ok(quote! {
        pub mod #module_ident {
            #![allow(unused_imports)]
            #![allow(dead_code)]
            #![allow(unused_variables)]
            #![allow(unused_mut)]

            #items
        }
    })
}
