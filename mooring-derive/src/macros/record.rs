//! Derive macro for `Record`
//!
//! Generates the static column shape, the typed field-handle struct, the
//! dynamic accessors used by change tracking, and the `FromRow` materializer.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields};

use crate::attributes;
use crate::utils;

/// Generate the `Record` and `FromRow` implementations for a struct
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let vis = &input.vis;

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs with named fields",
            ));
        }
    };

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic structs",
        ));
    }

    let table_name = attributes::extract_table_name(&input.attrs)?
        .unwrap_or_else(|| utils::snake_case(&struct_name.to_string()));
    let fields_struct = format_ident!("{}Fields", struct_name);

    let mut specs = Vec::new();
    let mut handle_decls = Vec::new();
    let mut handle_inits = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    let mut row_reads = Vec::new();
    let mut key_checks = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let ty = &field.ty;
        let member = ident.unraw().to_string();
        let attrs = attributes::parse_column_attributes(field)?;

        if attrs.is_skipped {
            if attrs.is_primary_key {
                return Err(syn::Error::new_spanned(
                    field,
                    "a #[primary_key] field cannot be #[skip]ped",
                ));
            }
            row_reads.push(quote! {
                #ident: ::core::default::Default::default(),
            });
            continue;
        }

        if attrs.is_auto_increment && !attrs.is_primary_key {
            return Err(syn::Error::new_spanned(
                field,
                "#[auto_increment] is only valid on a #[primary_key] field",
            ));
        }

        let column = attrs.column_name.unwrap_or_else(|| member.clone());
        let is_key = attrs.is_primary_key;
        let auto_increment = attrs.is_auto_increment;

        specs.push(quote! {
            ::mooring::ColumnSpec {
                field: #member,
                column: #column,
                kind: <#ty as ::mooring::ValueType>::KIND,
                nullable: <#ty as ::mooring::ValueType>::NULLABLE,
                key: #is_key,
                auto_increment: #auto_increment,
            }
        });

        handle_decls.push(quote! {
            pub #ident: ::mooring::Field<#struct_name, #ty>
        });
        handle_inits.push(quote! {
            #ident: ::mooring::Field::new(#member)
        });

        getters.push(quote! {
            #member => ::core::option::Option::Some(
                ::mooring::ValueType::into_value(::core::clone::Clone::clone(&self.#ident))
            ),
        });

        setters.push(quote! {
            #member => {
                self.#ident = <#ty as ::mooring::ValueType>::from_value(value).ok_or_else(|| {
                    ::mooring::MoorError::ParseError(::std::format!(
                        "value for `{}` does not fit {}",
                        #member,
                        ::core::any::type_name::<#ty>()
                    ))
                })?;
                ::core::result::Result::Ok(())
            }
        });

        row_reads.push(quote! {
            #ident: row.get::<#ty>(#column)?,
        });

        if is_key {
            key_checks.push(quote! {
                self.#ident == <#ty as ::core::default::Default>::default()
            });
        }
    }

    let is_new_body = if key_checks.is_empty() {
        quote! { true }
    } else {
        quote! { #(#key_checks)&&* }
    };

    let fields_doc = format!("Typed field handles for [`{struct_name}`].");

    let expanded = quote! {
        #[doc = #fields_doc]
        #[derive(Clone, Copy, Debug)]
        #vis struct #fields_struct {
            #(#handle_decls,)*
        }

        impl ::mooring::Record for #struct_name {
            type Fields = #fields_struct;

            const TABLE: &'static str = #table_name;

            const COLUMNS: &'static [::mooring::ColumnSpec] = &[
                #(#specs),*
            ];

            fn fields() -> Self::Fields {
                #fields_struct {
                    #(#handle_inits,)*
                }
            }

            fn get(&self, member: &str) -> ::core::option::Option<::mooring::Value> {
                match member {
                    #(#getters)*
                    _ => ::core::option::Option::None,
                }
            }

            #[allow(unused_variables, unreachable_code)]
            fn set(
                &mut self,
                member: &str,
                value: ::mooring::Value,
            ) -> ::core::result::Result<(), ::mooring::MoorError> {
                match member {
                    #(#setters)*
                    _ => ::core::result::Result::Err(::mooring::MoorError::UnknownColumn {
                        table: ::std::string::String::from(#table_name),
                        column: ::std::string::String::from(member),
                    }),
                }
            }

            fn is_new(&self) -> bool {
                #is_new_body
            }
        }

        impl ::mooring::FromRow for #struct_name {
            fn from_row(row: &::mooring::Row) -> ::core::result::Result<Self, ::mooring::MoorError> {
                ::core::result::Result::Ok(Self {
                    #(#row_reads)*
                })
            }
        }
    };

    Ok(expanded)
}
