extern crate proc_macro;

use proc_macro::TokenStream;

mod procmacro;

/// Generate API types (and optionally a client) from an OpenAPI document
/// at compile time, expanding to a module in place.
///
/// ```ignore
/// typegenitor::generate_api!("specs/petstore.yaml");
/// typegenitor::generate_api!(path = "specs/petstore.yaml", client = true);
/// ```
#[proc_macro]
pub fn generate_api(input: TokenStream) -> TokenStream {
    let config = match procmacro::parse_config(proc_macro2::TokenStream::from(input)) {
        Ok(config) => config,
        Err(e) => return e.to_compile_error().into(),
    };
    procmacro::generate_code(config).into()
}
