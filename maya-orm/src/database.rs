//! # Database Module
//!
//! Connection handling for Maya ORM.
//!
//! - [`Dialect`]: identifier quoting, pagination and current-time syntax per driver family.
//! - [`Database`]: one open, named connection (an `AnyPool` capped at a single session).
//! - [`ConnectionRegistry`]: resolves names through a [`ConfigResolver`] and caches
//!   one [`Database`] per name for its whole lifetime.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let config = DatabaseConfig::new().with("default", ConnectionConfig::sqlite_memory());
//! let db = ConnectionRegistry::new(config);
//!
//! let users = db.model::<User>()?.and_where("active", true)?.get().await?;
//! db.close_all().await;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures::lock::Mutex as AsyncMutex;
use sqlx::AnyPool;
use sqlx::any::{AnyArguments, AnyPoolOptions};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    Attributes, Error, Model,
    config::{ConfigResolver, ConnectionConfig},
    migration::Migrator,
    query_builder::Statement,
    query_log::{QueryLog, QueryLogEntry},
    record::Record,
    value_binding::{ValueBinder, decode_row},
};

// ============================================================================
// SQL Dialects
// ============================================================================

/// SQL syntax family of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL and MariaDB.
    MySql,
    /// Microsoft SQL Server.
    SqlServer,
    /// SQLite.
    Sqlite,
}

impl Dialect {
    /// Maps a configured driver name onto its dialect.
    pub fn from_driver(driver: &str) -> Result<Self, Error> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlsrv" | "mssql" | "sqlserver" => Ok(Dialect::SqlServer),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            other => Err(Error::Configuration(format!("Unsupported database driver `{}`", other))),
        }
    }

    /// Quotes one identifier.
    pub fn quote(self, ident: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Dialect::MySql | Dialect::Sqlite => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Table-qualified, quoted column reference.
    pub fn column(self, table: &str, column: &str) -> String {
        format!("{}.{}", self.quote(table), self.quote(column))
    }

    /// Expression for the current timestamp.
    pub fn now(self) -> &'static str {
        match self {
            Dialect::MySql => "NOW()",
            Dialect::SqlServer => "GETDATE()",
            Dialect::Sqlite => "CURRENT_TIMESTAMP",
        }
    }

    /// Appends the pagination clause.
    pub fn paginate(self, sql: &mut String, offset: u64, count: u64, ordered: bool) {
        match self {
            Dialect::SqlServer => {
                if !ordered {
                    sql.push_str(" ORDER BY (SELECT NULL)");
                }
                sql.push_str(&format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, count));
            }
            Dialect::MySql | Dialect::Sqlite => sql.push_str(&format!(" LIMIT {}, {}", offset, count)),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::MySql => f.write_str("mysql"),
            Dialect::SqlServer => f.write_str("sqlsrv"),
            Dialect::Sqlite => f.write_str("sqlite"),
        }
    }
}

// ============================================================================
// Database Handle
// ============================================================================

/// Outcome of a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// One open, named connection.
///
/// Cloning is cheap; clones share the pool, the query log and the last insert id.
#[derive(Clone)]
pub struct Database {
    name: String,
    pub(crate) pool: AnyPool,
    dialect: Dialect,
    log: QueryLog,
    last_insert_id: Arc<Mutex<Option<i64>>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("name", &self.name).field("dialect", &self.dialect).finish()
    }
}

impl Database {
    /// Opens the connection described by `config`.
    pub async fn connect(name: &str, config: &ConnectionConfig, log: QueryLog) -> Result<Self, Error> {
        let dialect = config.dialect()?;
        let url = config.url()?;

        sqlx::any::install_default_drivers();

        let session_init = config.session_init();
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .after_connect(move |conn, _meta| {
                let session_init = session_init.clone();
                Box::pin(async move {
                    if let Some(sql) = session_init {
                        sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(&sql)).await?;
                    }
                    Ok(())
                })
            })
            .connect(&url)
            .await?;

        log::debug!("Opened `{}` connection ({})", name, dialect);

        Ok(Self { name: name.to_string(), pool, dialect, log, last_insert_id: Arc::new(Mutex::new(None)) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Id generated by the most recent `INSERT` on this connection.
    pub fn last_insert_id(&self) -> Option<i64> {
        *self.last_insert_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn arguments<'q>(statement: &Statement) -> Result<AnyArguments<'q>, Error> {
        let mut args = AnyArguments::default();
        args.bind_all(&statement.values)?;
        Ok(args)
    }

    fn record(&self, statement: &Statement, started: Instant) {
        self.log.record(QueryLogEntry {
            connection: self.name.clone(),
            sql: statement.sql.clone(),
            bindings: statement.values.clone(),
            duration: started.elapsed(),
        });
    }

    /// Runs a write statement.
    pub async fn execute(&self, statement: &Statement) -> Result<Executed, Error> {
        let args = Self::arguments(statement)?;
        let started = Instant::now();
        let result = sqlx::query_with(&statement.sql, args).execute(&self.pool).await?;
        self.record(statement, started);

        let executed = Executed { rows_affected: result.rows_affected(), last_insert_id: result.last_insert_id() };
        if statement.sql.starts_with("INSERT")
            && let Some(id) = executed.last_insert_id
        {
            *self.last_insert_id.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);
        }
        Ok(executed)
    }

    /// Runs a query and reads every row.
    pub async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Attributes>, Error> {
        let args = Self::arguments(statement)?;
        let started = Instant::now();
        let rows = sqlx::query_with(&statement.sql, args).fetch_all(&self.pool).await?;
        self.record(statement, started);

        rows.iter().map(decode_row).collect()
    }

    /// Runs a query and reads the first row, if any.
    pub async fn fetch_optional(&self, statement: &Statement) -> Result<Option<Attributes>, Error> {
        let args = Self::arguments(statement)?;
        let started = Instant::now();
        let row = sqlx::query_with(&statement.sql, args).fetch_optional(&self.pool).await?;
        self.record(statement, started);

        row.as_ref().map(decode_row).transpose()
    }

    /// Runs unparameterized SQL, possibly several `;`-separated statements.
    pub async fn raw(&self, sql: &str) -> Result<u64, Error> {
        let started = Instant::now();
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        self.record(&Statement::new(sql, Vec::new()), started);
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        log::debug!("Closed `{}` connection", self.name);
    }
}

// ============================================================================
// Connection Registry
// ============================================================================

/// Resolves connection names and caches one [`Database`] per name.
///
/// Constructed once and passed by reference to every query.
pub struct ConnectionRegistry {
    resolver: Box<dyn ConfigResolver>,
    connections: AsyncMutex<HashMap<String, Database>>,
    log: QueryLog,
}

impl ConnectionRegistry {
    pub fn new(resolver: impl ConfigResolver + 'static) -> Self {
        Self { resolver: Box::new(resolver), connections: AsyncMutex::new(HashMap::new()), log: QueryLog::new() }
    }

    /// Settings for `name`.
    pub fn config(&self, name: &str) -> Result<ConnectionConfig, Error> {
        self.resolver.resolve(name).ok_or_else(|| Error::Configuration(format!("Unknown connection `{}`", name)))
    }

    /// Dialect of `name`, without opening it.
    pub fn dialect(&self, name: &str) -> Result<Dialect, Error> {
        self.config(name)?.dialect()
    }

    /// Shared execution log of every connection opened here.
    pub fn query_log(&self) -> &QueryLog {
        &self.log
    }

    /// Returns the cached handle for `name`, opening it on first use.
    pub async fn connection(&self, name: &str) -> Result<Database, Error> {
        let mut connections = self.connections.lock().await;
        if let Some(db) = connections.get(name) {
            return Ok(db.clone());
        }

        let config = self.config(name)?;
        let db = Database::connect(name, &config, self.log.clone()).await?;
        connections.insert(name.to_string(), db.clone());
        Ok(db)
    }

    /// Id generated by the most recent `INSERT` on `name`.
    pub async fn last_insert_id(&self, name: &str) -> Result<Option<i64>, Error> {
        Ok(self.connection(name).await?.last_insert_id())
    }

    /// Closes `name` and drops it from the cache. Unknown names are ignored.
    pub async fn close(&self, name: &str) {
        let db = self.connections.lock().await.remove(name);
        if let Some(db) = db {
            db.close().await;
        }
    }

    pub async fn close_all(&self) {
        let drained: Vec<Database> = self.connections.lock().await.drain().map(|(_, db)| db).collect();
        for db in drained {
            db.close().await;
        }
    }

    /// Starts a fresh chain for model `M`.
    ///
    /// Only the dialect is resolved here; the connection is opened by the
    /// first terminal operation.
    pub fn model<M: Model>(&self) -> Result<Record<'_, M>, Error> {
        let dialect = self.dialect(M::connection_name())?;
        Ok(Record::new(self, dialect))
    }

    /// Migration runner keeping its ledger at `ledger_path`.
    pub fn migrator(&self, ledger_path: impl Into<PathBuf>) -> Migrator<'_> {
        Migrator::new(self, ledger_path)
    }
}

// ============================================================================
// Tests
// ============================================================================
