//! Auto-detection of the `weave_core` path for generated code.
//!
//! Checked in order:
//! 1. The consuming crate is `weave_core` itself.
//! 2. The consuming crate depends on `weave_core`, possibly renamed.
//! 3. The consuming crate depends on the `weave` umbrella, which re-exports
//!    it as `weave::weave_core`.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Returns the token path for `weave_core` in the consuming crate.
pub(crate) fn weave_core_path() -> TokenStream {
    match crate_name("weave_core") {
        Ok(FoundCrate::Itself) => quote!(weave_core),
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote!(#ident)
        }
        Err(_) => match crate_name("weave") {
            // Tests and examples of the umbrella package itself.
            Ok(FoundCrate::Itself) => quote!(weave::weave_core),
            Ok(FoundCrate::Name(name)) => {
                let ident = format_ident!("{}", name);
                quote!(#ident::weave_core)
            }
            _ => quote!(weave_core),
        },
    }
}
