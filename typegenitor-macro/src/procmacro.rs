use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::ToTokens;
use syn::{
    Expr, ExprLit, LitStr, MetaNameValue, Token,
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    token::Comma,
};

// Structure to hold key-value pair arguments
#[derive(Default)]
pub(super) struct MacroConfig {
    path: Option<String>,
    package_name: Option<String>,
    module_name: Option<String>,
    client: bool,
    models: bool,
}

trait ExprInto<T> {
    fn expr_into(&self) -> Option<T>;
}

impl ExprInto<String> for Expr {
    fn expr_into(&self) -> Option<String> {
        if let Expr::Lit(ExprLit {
            attrs: _,
            lit: syn::Lit::Str(lit_str),
        }) = self
        {
            Some(lit_str.value())
        } else {
            None
        }
    }
}

impl ExprInto<bool> for Expr {
    fn expr_into(&self) -> Option<bool> {
        if let Expr::Lit(ExprLit {
            attrs: _,
            lit: syn::Lit::Bool(lit_bool),
        }) = self
        {
            Some(lit_bool.value())
        } else {
            None
        }
    }
}

impl Parse for MacroConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = Self {
            models: true,
            ..Self::default()
        };

        // shorthand form: a single string literal is the spec path
        if input.peek(LitStr) {
            let lit: LitStr = input.parse()?;
            config.path = Some(lit.value());
            if input.peek(Token![,]) {
                let _: Token![,] = input.parse()?;
            }
            if input.is_empty() {
                return Ok(config);
            }
        }

        // Parse key-value pairs
        let kv_pairs = Punctuated::<MetaNameValue, Comma>::parse_terminated(input)?;

        for name_value in kv_pairs {
            let name = name_value.path.to_token_stream().to_string();

            match name.as_str() {
                "path" => {
                    config.path = Some(name_value.value.expr_into().ok_or(syn::Error::new(
                        name_value.span(),
                        "'path' expects a string literal as argument",
                    ))?);
                }
                "package_name" => {
                    config.package_name =
                        Some(name_value.value.expr_into().ok_or(syn::Error::new(
                            name_value.span(),
                            "'package_name' expects a string literal as argument",
                        ))?);
                }
                "module_name" => {
                    config.module_name =
                        Some(name_value.value.expr_into().ok_or(syn::Error::new(
                            name_value.span(),
                            "'module_name' expects a string literal as argument",
                        ))?);
                }
                "client" => {
                    config.client = name_value.value.expr_into().ok_or(syn::Error::new(
                        name_value.span(),
                        "'client' expects a bool as argument",
                    ))?;
                }
                "models" => {
                    config.models = name_value.value.expr_into().ok_or(syn::Error::new(
                        name_value.span(),
                        "'models' expects a bool as argument",
                    ))?;
                }
                _ => {
                    return Err(syn::Error::new(
                        name_value.span(),
                        format!("unknown parameter: {}", name),
                    ));
                }
            }
        }

        Ok(config)
    }
}

pub(super) fn parse_config(input: TokenStream2) -> syn::Result<MacroConfig> {
    syn::parse2(input)
}

// Main macro implementation
pub(super) fn generate_code(config: MacroConfig) -> TokenStream2 {
    match try_generate(config) {
        Ok(ts) => ts,
        Err(e) => syn::Error::new(Span::call_site(), e.to_string()).to_compile_error(),
    }
}

fn try_generate(config: MacroConfig) -> anyhow::Result<TokenStream2> {
    let path = config
        .path
        .ok_or_else(|| anyhow::anyhow!("no path to OpenAPI file specified"))?;

    // spec paths are relative to the invoking crate
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map_err(|_| anyhow::anyhow!("CARGO_MANIFEST_DIR is not set"))?;
    let full_path = std::path::Path::new(&manifest_dir).join(&path);
    let bytes = std::fs::read(&full_path)
        .map_err(|e| anyhow::anyhow!("cannot read '{}': {e}", full_path.display()))?;

    let mut core_config = typegenitor_core::Config::default();
    core_config.package_name = config.package_name.unwrap_or_default();
    core_config.generate.client = config.client;
    core_config.generate.models = config.models;

    let module_name = config.module_name.unwrap_or_else(|| "generated_api".to_string());
    // validate the module name early for a clearer error location
    let _ = Ident::new(&module_name, Span::call_site());

    typegenitor_core::generate_module(&bytes, &core_config, &module_name)
}
