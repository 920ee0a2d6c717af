//! Procedural macros for the `weave_core` crate.
//!
//! This crate provides `#[derive(Inject)]`, which makes a struct resolvable
//! by field injection.

mod crate_path;

use darling::ast::Data;
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

/// Parsed struct for `#[derive(Inject)]`.
#[derive(FromDeriveInput)]
#[darling(attributes(inject), supports(struct_named))]
struct InjectArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<(), InjectField>,
}

/// Parsed field.
#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<syn::Ident>,
    ty: syn::Type,

    /// Tags the provider of this field must carry.
    #[darling(multiple)]
    tag: Vec<String>,
}

/// Derive macro for the `Inject` trait.
///
/// Every field type must implement `weave_core::param::Param`, e.g.
/// `Arc<T>`, `Vec<Arc<T>>`, `Injected<S>` or `Tagged<P, G>`. The struct must
/// also implement `Clone`.
///
/// # Attributes
///
/// - `#[inject(tag = "...")]` on a field (repeatable): the field's provider
///   must carry this tag.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Inject)]
/// struct Handlers {
///     db: Arc<Database>,
///     #[inject(tag = "hot")]
///     cache: Arc<Cache>,
///     plugins: Vec<Arc<dyn Plugin>>,
/// }
/// ```
///
/// Generates:
///
/// ```ignore
/// impl Inject for Handlers {
///     fn dependencies() -> Vec<Dependency> {
///         vec![
///             <Arc<Database> as Param>::dependency(),
///             <Arc<Cache> as Param>::dependency().tagged("hot"),
///             <Vec<Arc<dyn Plugin>> as Param>::dependency(),
///         ]
///     }
///
///     fn inject(fields: &mut Fields<'_>) -> Result<Self, Error> {
///         Ok(Self {
///             db: fields.next::<Arc<Database>>()?,
///             cache: fields.next::<Arc<Cache>>()?,
///             plugins: fields.next::<Vec<Arc<dyn Plugin>>>()?,
///         })
///     }
/// }
/// ```
#[proc_macro_derive(Inject, attributes(inject))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match InjectArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(err) => return err.write_errors().into(),
    };

    let name = &args.ident;
    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();
    let krate = crate_path::weave_core_path();

    let fields = args
        .data
        .take_struct()
        .map(|fields| fields.fields)
        .unwrap_or_default();

    let dependencies = fields.iter().map(|field| {
        let ty = &field.ty;
        let tags = &field.tag;
        quote! {
            <#ty as #krate::param::Param>::dependency() #(.tagged(#tags))*
        }
    });

    // Unit-like structs never read their fields.
    let ignore_fields = fields.is_empty().then(|| quote!(let _ = fields;));

    let inits = fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        quote! {
            #ident: fields.next::<#ty>()?
        }
    });

    let expanded = quote! {
        impl #impl_generics #krate::inject::Inject for #name #ty_generics #where_clause {
            fn dependencies() -> ::std::vec::Vec<#krate::key::Dependency> {
                ::std::vec![#(#dependencies),*]
            }

            fn inject(
                fields: &mut #krate::inject::Fields<'_>,
            ) -> ::core::result::Result<Self, #krate::error::Error> {
                #ignore_fields
                ::core::result::Result::Ok(Self {
                    #(#inits),*
                })
            }
        }
    };

    expanded.into()
}
