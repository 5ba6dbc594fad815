//! Procedural macros for `lacquer`.
//!
//! The [`Settings`] derive implements `lacquer::Settings` for a struct by
//! reading `#[parameter("...")]` field attributes. Tagged fields are filled
//! from the matching value in a parsed layer; untagged fields are left at
//! their `Default::default()` value.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro for `lacquer::Settings`.
///
/// ```ignore
/// #[derive(Settings, Default)]
/// struct RedisSettings {
///     #[parameter("host")]
///     host: String,
///     #[parameter("port")]
///     port: i64,
///     // not tagged: stays at its default
///     computed: Option<String>,
/// }
/// ```
#[proc_macro_derive(Settings, attributes(parameter))]
pub fn derive_settings(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let ident = input.ident;

    let fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(named) => named.named,
            _ => {
                return syn::Error::new_spanned(
                    data.struct_token,
                    "Settings requires named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(ident, "Settings can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut initializers = Vec::new();
    for field in &fields {
        let name = match field.ident.as_ref() {
            Some(name) => name,
            None => continue,
        };
        match parameter_name(field) {
            Ok(Some(parameter)) => {
                initializers.push(quote! {
                    #name: ::lacquer::bind::bind_field(layer, #parameter)?
                });
            }
            Ok(None) => {
                initializers.push(quote! {
                    #name: ::core::default::Default::default()
                });
            }
            Err(err) => return err.to_compile_error().into(),
        }
    }

    let expanded = quote! {
        impl ::lacquer::Settings for #ident {
            fn from_parsed_layer(
                layer: &::lacquer::ParsedLayer,
            ) -> ::core::result::Result<Self, ::lacquer::LacquerError> {
                Ok(Self {
                    #( #initializers, )*
                })
            }
        }
    };

    TokenStream::from(expanded)
}

/// Extract the parameter name from a `#[parameter("...")]` attribute, if any.
fn parameter_name(field: &syn::Field) -> syn::Result<Option<LitStr>> {
    for attr in &field.attrs {
        if attr.path().is_ident("parameter") {
            return attr.parse_args::<LitStr>().map(Some);
        }
    }
    Ok(None)
}
