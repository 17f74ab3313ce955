//! Parser adapters turning an OpenAPI document into the [`SpecModel`].
//!
//! One adapter per supported major version, each on its own parsing crate,
//! selected by probing the version declaration from the raw input.

mod probe;

#[cfg(feature = "oas30")]
pub mod oas30;
#[cfg(feature = "oas31")]
pub mod oas31;

use crate::error::SpecError;
use crate::spec::SpecModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OasMajorVersion {
    #[cfg(feature = "oas30")]
    Oas30,
    #[cfg(feature = "oas31")]
    Oas31,
}

/// Parse and resolve a document, dispatching on the declared version.
///
/// The input is consumed fully before translation begins; no reader state
/// survives this call.
pub fn load_document(bytes: &[u8]) -> Result<SpecModel, SpecError> {
    let version = probe::probe_oas_version(bytes)?;
    match version {
        #[cfg(feature = "oas30")]
        OasMajorVersion::Oas30 => oas30::load(bytes),
        #[cfg(feature = "oas31")]
        OasMajorVersion::Oas31 => oas31::load(bytes),
    }
}
