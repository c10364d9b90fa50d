//! Proc-macros for `rowcore`: per-entity-type glue the design notes ask for
//! in place of the source system's reflection-based property copiers.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields};

/// `#[derive(Cloner)]`
///
/// Generates a field-by-field `rowcore::model::Cloner` impl: `clone_into`
/// copies every named field of `src` onto `dst` in place. Used by the
/// update path to snapshot a victim before mutation and to copy the
/// updater's result back onto the live row without changing its identity.
#[proc_macro_derive(Cloner)]
pub fn derive_cloner(input: TokenStream) -> TokenStream {
    derive_cloner_impl(input.into()).into()
}

fn derive_cloner_impl(input: TokenStream2) -> TokenStream2 {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match named_fields(&input) {
        Ok(fields) => fields,
        Err(err) => return err.to_compile_error(),
    };

    let copy_stmts = fields.iter().map(|field| {
        let field_ident = field.ident.as_ref().expect("named field");
        quote! { dst.#field_ident = src.#field_ident.clone(); }
    });

    quote! {
        impl #impl_generics ::rowcore::model::Cloner for #ident #ty_generics #where_clause {
            fn clone_into(src: &Self, dst: &mut Self) {
                #(#copy_stmts)*
            }
        }
    }
}

fn named_fields(input: &DeriveInput) -> syn::Result<&syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(
            &input.ident,
            "Cloner can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(Error::new_spanned(
            &data.fields,
            "Cloner can only be derived for structs with named fields",
        ));
    };
    Ok(&named.named)
}
