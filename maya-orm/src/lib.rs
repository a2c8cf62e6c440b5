//! # Maya ORM
//!
//! A fluent query builder and active-record persistence engine over `sqlx`'s
//! `Any` driver, with a soft-delete overlay and batched, reversible migrations.
//!
//! ```rust,ignore
//! use maya_orm::{ConnectionConfig, ConnectionRegistry, DatabaseConfig, Model, Op, Value};
//!
//! #[derive(Model, Debug, Clone)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(primary_key)]
//!     id: Option<i64>,
//!     #[orm(fillable)]
//!     name: String,
//!     #[orm(fillable)]
//!     age: i32,
//! }
//!
//! let db = ConnectionRegistry::new(DatabaseConfig::new().with("default", ConnectionConfig::sqlite_memory()));
//!
//! let mut user = db.model::<User>()?;
//! user.create([("name", Value::from("Ann")), ("age", Value::from(31))]).await?;
//!
//! let adults = db.model::<User>()?.and_where_op("age", Op::Ge, 18)?.get().await?;
//! ```

pub use maya_orm_macro::Model;

pub mod attributes;
pub mod config;
pub mod database;
pub mod errors;
pub mod gate;
pub mod ledger;
pub mod migration;
pub mod model;
pub mod pagination;
pub mod query_builder;
pub mod query_log;
pub mod record;
pub mod schema;
pub mod soft_delete;
pub mod temporal;
pub mod value;
pub mod value_binding;

pub use attributes::{Attributes, Cast};
pub use config::{ConfigResolver, ConnectionConfig, DatabaseConfig, EnvConfig};
pub use database::{ConnectionRegistry, Database, Dialect, Executed};
pub use errors::Error;
pub use gate::{GateState, Method};
pub use ledger::{Ledger, LedgerEntry};
pub use migration::{Migration, MigrationOutcome, MigrationStatus, MigrationTask, Migrator, SqlMigration};
pub use model::{ColumnInfo, Model, TableMeta};
pub use pagination::{Paginated, Pagination};
pub use query_builder::{Op, Order, Predicates, Statement};
pub use query_log::{QueryLog, QueryLogEntry};
pub use record::Record;
pub use schema::Blueprint;
pub use soft_delete::DeletePolicy;
pub use value::{FromValue, Value};
