//! # Model Derive Macro Implementation
//!
//! This module implements the procedural macro expansion for `#[derive(Model)]`.
//! It analyzes the struct and its `#[orm(...)]` attributes to generate the
//! `Model` trait implementation.
//!
//! ## Overview
//!
//! The derive macro performs the following tasks:
//!
//! 1. **Struct Attributes**: reads `table` and `connection`
//! 2. **Field Analysis**: infers each column's cast from its type (via `types::rust_type_to_cast`)
//! 3. **Attribute Parsing**: extracts `primary_key`, `fillable`, `hidden`, `cast`, timestamps, `soft_delete`
//! 4. **Code Generation**: column metadata plus conversions to and from `Attributes`
//!
//! ## Example
//!
//! ```rust,ignore
//! // Input struct:
//! #[derive(Model)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(primary_key)]
//!     id: Option<i64>,
//!     #[orm(fillable)]
//!     name: String,
//! }
//!
//! // Generated implementation:
//! impl maya_orm::Model for User {
//!     fn table_name() -> &'static str { "users" }
//!     fn connection_name() -> &'static str { "default" }
//!     fn columns() -> Vec<maya_orm::ColumnInfo> {
//!         vec![
//!             maya_orm::ColumnInfo { name: "id", cast: Some(maya_orm::Cast::Int), is_primary_key: true, .. },
//!             maya_orm::ColumnInfo { name: "name", cast: Some(maya_orm::Cast::String), fillable: true, .. },
//!         ]
//!     }
//!     fn from_attributes(attrs: &maya_orm::Attributes) -> Result<Self, maya_orm::Error> {
//!         Ok(Self { id: maya_orm::FromValue::from_value(attrs.get("id"))?, name: ... })
//!     }
//!     fn to_attributes(&self) -> maya_orm::Attributes { ... }
//! }
//! ```

use heck::ToSnakeCase;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr};

use crate::types::{cast_from_name, rust_type_to_cast};

/// Struct-level `#[orm(...)]` settings.
struct ModelAttrs {
    table: String,
    connection: String,
}

fn parse_model_attrs(ast: &DeriveInput) -> syn::Result<ModelAttrs> {
    let mut attrs = ModelAttrs { table: ast.ident.to_string().to_snake_case(), connection: "default".to_string() };

    for attr in &ast.attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                attrs.table = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else if meta.path.is_ident("connection") {
                attrs.connection = meta.value()?.parse::<LitStr>()?.value();
                Ok(())
            } else {
                Err(meta.error("unknown model attribute, expected `table` or `connection`"))
            }
        })?;
    }

    Ok(attrs)
}

/// Generates the `Model` implementation.
pub fn expand(ast: DeriveInput) -> syn::Result<TokenStream> {
    let struct_name = &ast.ident;
    let model = parse_model_attrs(&ast)?;

    let Data::Struct(data) = &ast.data else {
        return Err(syn::Error::new_spanned(struct_name, "Model must be a struct"));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(struct_name, "Model must have named fields"));
    };

    let mut column_defs = Vec::new();
    let mut hydrations = Vec::new();
    let mut conversions = Vec::new();

    for f in &fields.named {
        let Some(field_ident) = &f.ident else { continue };
        let column = field_ident.to_string();
        let column = column.strip_prefix("r#").unwrap_or(&column).to_string();
        let mut cast = rust_type_to_cast(&f.ty);

        let mut is_primary_key = false;
        let mut fillable = false;
        let mut hidden = false;
        let mut create_time = false;
        let mut update_time = false;
        let mut soft_delete = false;

        for attr in &f.attrs {
            if !attr.path().is_ident("orm") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    is_primary_key = true;
                } else if meta.path.is_ident("fillable") {
                    fillable = true;
                } else if meta.path.is_ident("hidden") {
                    hidden = true;
                } else if meta.path.is_ident("create_time") {
                    create_time = true;
                } else if meta.path.is_ident("update_time") {
                    update_time = true;
                } else if meta.path.is_ident("soft_delete") {
                    soft_delete = true;
                } else if meta.path.is_ident("cast") {
                    let value: LitStr = meta.value()?.parse()?;
                    cast = Some(
                        cast_from_name(&value.value())
                            .ok_or_else(|| syn::Error::new(value.span(), "unknown cast"))?,
                    );
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }

        let cast_tokens = match cast {
            Some(variant) => {
                let variant = Ident::new(variant, Span::call_site());
                quote! { Some(maya_orm::Cast::#variant) }
            }
            None => quote! { None },
        };

        column_defs.push(quote! {
            maya_orm::ColumnInfo {
                name: #column,
                cast: #cast_tokens,
                is_primary_key: #is_primary_key,
                fillable: #fillable,
                hidden: #hidden,
                create_time: #create_time,
                update_time: #update_time,
                soft_delete: #soft_delete,
            }
        });

        hydrations.push(quote! {
            #field_ident: maya_orm::FromValue::from_value(attrs.get(#column))?
        });

        conversions.push(quote! {
            attrs.set(#column, maya_orm::Value::from(self.#field_ident.clone()));
        });
    }

    let table = model.table;
    let connection = model.connection;

    Ok(quote! {
        impl maya_orm::Model for #struct_name {
            fn table_name() -> &'static str {
                #table
            }

            fn connection_name() -> &'static str {
                #connection
            }

            fn columns() -> Vec<maya_orm::ColumnInfo> {
                vec![#(#column_defs),*]
            }

            fn from_attributes(attrs: &maya_orm::Attributes) -> Result<Self, maya_orm::Error> {
                Ok(Self {
                    #(#hydrations),*
                })
            }

            fn to_attributes(&self) -> maya_orm::Attributes {
                let mut attrs = maya_orm::Attributes::new();
                #(#conversions)*
                attrs
            }
        }
    })
}
