use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives [`tibia_codec::Encode`] for a struct by calling `Encode::encode`
/// on each field in declaration order.
#[proc_macro_derive(Encode)]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let encode_body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                let field_encodes = fields.named.iter().map(|f| {
                    let field_name = &f.ident;
                    quote! {
                        tibia_codec::Encode::encode(&self.#field_name, writer);
                    }
                });
                quote! { #(#field_encodes)* }
            }
            Fields::Unnamed(fields) => {
                let field_encodes = (0..fields.unnamed.len()).map(|i| {
                    let index = syn::Index::from(i);
                    quote! {
                        tibia_codec::Encode::encode(&self.#index, writer);
                    }
                });
                quote! { #(#field_encodes)* }
            }
            Fields::Unit => quote! {},
        },
        Data::Enum(_) => quote! { compile_error!("Encode derive does not support enums") },
        Data::Union(_) => quote! { compile_error!("Encode derive does not support unions") },
    };

    let expanded = quote! {
        impl #impl_generics tibia_codec::Encode for #name #ty_generics #where_clause {
            fn encode(&self, writer: &mut tibia_codec::ByteWriter) {
                #encode_body
            }
        }
    };

    TokenStream::from(expanded)
}

/// Derives [`tibia_codec::Decode`] for a struct by calling `Decode::decode`
/// for each field in declaration order, against the same sticky-error reader.
#[proc_macro_derive(Decode)]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let decode_body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                let field_decodes = fields.named.iter().map(|f| {
                    let field_name = &f.ident;
                    let field_ty = &f.ty;
                    quote! {
                        #field_name: <#field_ty as tibia_codec::Decode>::decode(reader),
                    }
                });
                quote! {
                    Self {
                        #(#field_decodes)*
                    }
                }
            }
            Fields::Unnamed(fields) => {
                let field_decodes = fields.unnamed.iter().map(|f| {
                    let field_ty = &f.ty;
                    quote! {
                        <#field_ty as tibia_codec::Decode>::decode(reader),
                    }
                });
                quote! { Self(#(#field_decodes)*) }
            }
            Fields::Unit => quote! { Self },
        },
        Data::Enum(_) => quote! { compile_error!("Decode derive does not support enums") },
        Data::Union(_) => quote! { compile_error!("Decode derive does not support unions") },
    };

    let expanded = quote! {
        impl #impl_generics tibia_codec::Decode for #name #ty_generics #where_clause {
            fn decode(reader: &mut tibia_codec::ByteReader<'_>) -> Self {
                #decode_body
            }
        }
    };

    TokenStream::from(expanded)
}
