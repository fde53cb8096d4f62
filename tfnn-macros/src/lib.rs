//! The derive macros used by the [tfnn](../tfnn) network builder.
//!
//! tfnn keeps most of its enums as plain dispatch over a handful of variants, so these macros
//! write the repetitive `From` and `match` boilerplate for them.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields};

#[proc_macro_derive(FromForAllUnnamedVariants)]
/// Derives all the From<...> implementations for the enum it is being derived on.
///
/// Only variants with exactly one unnamed field get an implementation, so unit variants and
/// variants with named fields are skipped.
pub fn from_for_all_variants(_input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(_input as DeriveInput);
    let enum_name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let variants = if let Data::Enum(enm) = input.data {
        enm.variants
    } else {
        panic!("The 'FromForAllUnnamedVariants' derive macro can only be be used with enums!");
    };

    let single_field_variants: Vec<_> = variants
        .iter()
        .filter_map(|variant| match &variant.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                fields.unnamed.first().map(|field| (&variant.ident, &field.ty))
            }
            _ => None,
        })
        .collect();

    let names = single_field_variants.iter().map(|(name, _)| name);
    let types = single_field_variants.iter().map(|(_, ty)| ty);

    quote! {
        #(impl #impl_generics From<#types> for #enum_name #type_generics #where_clause {
            fn from(v: #types) -> Self {
                #enum_name::#names(v)
            }
        })*
    }
    .into()
}

#[proc_macro_derive(EnumLayer)]
/// Derives the implementation of tfnn::layers::Layer for
/// a enum containing layers, this is used as to not have to write
/// this implementation and change it everytime we need to add a new layer.
///
/// Every variant must have exactly one unnamed field whose type implements the `Layer` trait.
pub fn enum_layer(_input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(_input as DeriveInput);
    let enum_name = &input.ident;

    let layer_variants = if let Data::Enum(enm) = input.data {
        enm.variants
    } else {
        panic!("The 'EnumLayer' derive macro can only be used with enums!");
    };

    let layer_names: Vec<_> = layer_variants.iter().map(|variant| &variant.ident).collect();
    let layer_names = &layer_names;

    TokenStream::from(quote! {
        impl crate::layers::Layer for #enum_name {
            fn layer_type(&self) -> crate::layers::LayerType {
                match self {
                    #(
                        #enum_name::#layer_names(layer) => layer.layer_type(),
                    )*
                }
            }

            fn construct(
                &mut self,
                configs: &crate::layers::LayersConfigs,
            ) -> Result<(), crate::types::LayerConstructionError> {
                match self {
                    #(
                        #enum_name::#layer_names(layer) => layer.construct(configs),
                    )*
                }
            }

            fn config(&self) -> Option<&crate::layers::LayerConfig> {
                match self {
                    #(
                        #enum_name::#layer_names(layer) => layer.config(),
                    )*
                }
            }

            fn weights(&self) -> Option<&crate::layers::VariableSpec> {
                match self {
                    #(
                        #enum_name::#layer_names(layer) => layer.weights(),
                    )*
                }
            }

            fn biases(&self) -> Option<&crate::layers::VariableSpec> {
                match self {
                    #(
                        #enum_name::#layer_names(layer) => layer.biases(),
                    )*
                }
            }

            fn propagate(
                &self,
                inputs: &candle_core::Tensor,
                variables: &crate::session::Variables,
                feeds: &crate::feed::RunFeeds,
            ) -> Result<crate::layers::LayerResults, crate::types::LayerPropagationError> {
                match self {
                    #(
                        #enum_name::#layer_names(layer) => layer.propagate(inputs, variables, feeds),
                    )*
                }
            }
        }
    })
}
