//! # Model Module
//!
//! This module defines the `Model` trait and the metadata structures describing
//! a table's active-record facade: table name, primary key, fillable and hidden
//! columns, casts, timestamp columns, the optional soft-delete column and the
//! connection the table lives on.
//!
//! ## Automatic Implementation
//!
//! The `Model` trait is typically implemented via `#[derive(Model)]`, which
//! reads `#[orm(...)]` attributes on the struct and its fields.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use maya_orm::Model;
//! use chrono::NaiveDateTime;
//!
//! #[derive(Model, Debug, Clone)]
//! #[orm(table = "posts", connection = "default")]
//! struct Post {
//!     #[orm(primary_key)]
//!     id: Option<i64>,
//!
//!     #[orm(fillable)]
//!     title: String,
//!
//!     #[orm(fillable, cast = "json")]
//!     tags: serde_json::Value,
//!
//!     #[orm(hidden)]
//!     secret: Option<String>,
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
//! ## Supported ORM Attributes
//!
//! Struct level:
//! - `#[orm(table = "name")]` - Table name (defaults to the snake_case struct name)
//! - `#[orm(connection = "name")]` - Connection name (defaults to `default`)
//!
//! Field level:
//! - `#[orm(primary_key)]` - Marks the primary key (defaults to `id`)
//! - `#[orm(fillable)]` - Column may be set through `create`/`update`
//! - `#[orm(hidden)]` - Column is left out of serialized records
//! - `#[orm(cast = "json")]` - Explicit cast (otherwise inferred from the field type)
//! - `#[orm(create_time)]` / `#[orm(update_time)]` - Timestamp columns set by `save`
//! - `#[orm(soft_delete)]` - Enables the soft-delete overlay on this column

// ============================================================================
// External Crate Imports
// ============================================================================

use std::collections::HashMap;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{Attributes, Cast, Error, Value};

// ============================================================================
// Column Metadata Structure
// ============================================================================

/// Metadata about a single column.
///
/// Generated by `#[derive(Model)]` for every struct field.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    /// The column name in the database (`r#` prefix already stripped).
    pub name: &'static str,

    /// Declared or inferred cast.
    pub cast: Option<Cast>,

    /// Whether this column is the primary key.
    pub is_primary_key: bool,

    /// Whether the column may be mass-assigned by `create`/`update`.
    pub fillable: bool,

    /// Whether the column is omitted from serialized records.
    pub hidden: bool,

    /// Column receives the current time on insert.
    pub create_time: bool,

    /// Column receives the current time on update.
    pub update_time: bool,

    /// Column marks a row as soft-deleted.
    pub soft_delete: bool,
}

impl ColumnInfo {
    /// A plain column with no flags.
    pub fn new(name: &'static str) -> Self {
        Self { name, ..Default::default() }
    }
}

// ============================================================================
// Model Trait
// ============================================================================

/// The core trait for database models.
///
/// Describes a table and converts between the typed struct and its
/// [`Attributes`] container.
pub trait Model: Sized + Send + Sync {
    /// Returns the table name.
    fn table_name() -> &'static str;

    /// Returns metadata for every declared column.
    fn columns() -> Vec<ColumnInfo>;

    /// Name of the connection the table lives on.
    fn connection_name() -> &'static str {
        "default"
    }

    /// Builds the typed struct from a hydrated attribute container.
    fn from_attributes(attrs: &Attributes) -> Result<Self, Error>;

    /// Converts the typed struct into an attribute container.
    fn to_attributes(&self) -> Attributes;
}

// ============================================================================
// Table Metadata
// ============================================================================

/// Resolved, immutable description of a model's table.
///
/// Computed once per chain; the table name and primary key cannot change
/// after a query has started.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub table: &'static str,
    pub primary_key: &'static str,
    pub connection: &'static str,
    pub fillable: Vec<&'static str>,
    pub hidden: Vec<&'static str>,
    pub casts: HashMap<&'static str, Cast>,
    pub created_at: Option<&'static str>,
    pub updated_at: Option<&'static str>,
    pub soft_delete: Option<&'static str>,
}

impl TableMeta {
    pub fn of<M: Model>() -> Self {
        let columns = M::columns();

        let flagged = |pred: fn(&ColumnInfo) -> bool, fallback: &str| {
            columns
                .iter()
                .find(|c| pred(c))
                .or_else(|| columns.iter().find(|c| c.name == fallback))
                .map(|c| c.name)
        };

        let primary_key = columns.iter().find(|c| c.is_primary_key).map(|c| c.name).unwrap_or("id");

        Self {
            table: M::table_name(),
            primary_key,
            connection: M::connection_name(),
            fillable: columns.iter().filter(|c| c.fillable).map(|c| c.name).collect(),
            hidden: columns.iter().filter(|c| c.hidden).map(|c| c.name).collect(),
            casts: columns.iter().filter_map(|c| c.cast.map(|cast| (c.name, cast))).collect(),
            created_at: flagged(|c| c.create_time, "created_at"),
            updated_at: flagged(|c| c.update_time, "updated_at"),
            soft_delete: columns.iter().find(|c| c.soft_delete).map(|c| c.name),
        }
    }

    pub fn is_fillable(&self, column: &str) -> bool {
        self.fillable.contains(&column)
    }

    pub fn cast_of(&self, column: &str) -> Option<Cast> {
        self.casts.get(column).copied()
    }

    /// Applies every declared cast's `decode` to a freshly read row.
    pub fn decode(&self, attrs: Attributes) -> Result<Attributes, Error> {
        attrs
            .iter()
            .map(|(name, value)| -> Result<(String, Value), Error> {
                let value = match self.cast_of(name) {
                    Some(cast) => cast.decode(value.clone())?,
                    None => value.clone(),
                };
                Ok((name.clone(), value))
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
