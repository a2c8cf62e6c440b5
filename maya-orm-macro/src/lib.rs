//! # Maya ORM Procedural Macros
//!
//! This crate provides the `#[derive(Model)]` macro for Maya ORM. It is not
//! meant to be used directly; `maya-orm` re-exports it:
//!
//! ```rust,ignore
//! use maya_orm::Model;
//! use chrono::NaiveDateTime;
//!
//! #[derive(Model, Debug, Clone)]
//! #[orm(table = "posts", connection = "blog")]
//! struct Post {
//!     #[orm(primary_key)]
//!     id: Option<i64>,
//!
//!     #[orm(fillable)]
//!     title: String,
//!
//!     #[orm(fillable, cast = "json")]
//!     tags: Option<String>,
//!
//!     #[orm(hidden)]
//!     edit_token: Option<String>,
//!
//!     #[orm(create_time)]
//!     created_at: Option<NaiveDateTime>,
//!
//!     #[orm(update_time)]
//!     updated_at: Option<NaiveDateTime>,
//!
//!     #[orm(soft_delete)]
//!     deleted_at: Option<NaiveDateTime>,
//! }
//! ```
//!
//! ## Supported Attributes
//!
//! ### Struct Level
//! - `table = "name"`: table name, defaults to the snake_case struct name
//! - `connection = "name"`: connection name, defaults to `default`
//!
//! ### Field Level
//! - `primary_key`: the primary-key column (otherwise `id`)
//! - `fillable`: may be mass-assigned by `create` / `update`
//! - `hidden`: left out when a record is serialized
//! - `cast = "int" | "float" | "bool" | "string" | "json" | "datetime"`:
//!   overrides the cast inferred from the field type
//! - `create_time` / `update_time`: stamped with the current time by `save`
//! - `soft_delete`: turns on the soft-delete overlay for the model
//!
//! Malformed attributes are reported as compile errors on the offending span.

#![warn(missing_docs)]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod derive_model;
mod types;

/// Derives `maya_orm::Model` for a struct with named fields.
///
/// Every field becomes a column named after the field (a leading `r#` is
/// dropped). Field types must convert into `maya_orm::Value` and implement
/// `maya_orm::FromValue`.
#[proc_macro_derive(Model, attributes(orm))]
pub fn model_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    derive_model::expand(ast).unwrap_or_else(syn::Error::into_compile_error).into()
}
