//! # Migration Module
//!
//! Batched, reversible schema migrations.
//!
//! ## Overview
//!
//! A migration is a named unit with an `up` and a `down` step. Names sort
//! lexicographically and are expected to carry a date+counter prefix
//! (`2024_05_01_000001_create_users`), so name order is application order.
//!
//! Units come from two places:
//!
//! 1. **SQL files**: every `*.sql` file in the migrations directory, split
//!    into `-- up` and `-- down` sections. The file stem is the name.
//! 2. **Registered tasks**: async closures given a [`Database`], or any type
//!    implementing [`Migration`].
//!
//! The [`Ledger`] remembers which units ran and in which batch. `up` gives
//! every pending unit the next batch number; `down` undoes one batch in
//! reverse name order. The ledger is written after every step, so a failure
//! keeps the progress made before it.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let outcome = db
//!     .migrator("storage/migrations.json")
//!     .directory("database/migrations")
//!     .register("2024_05_02_000001_seed_roles", |db| Box::pin(async move {
//!         db.raw("INSERT INTO roles (name) VALUES ('admin')").await?;
//!         Ok(())
//!     }), |db| Box::pin(async move {
//!         db.raw("DELETE FROM roles").await?;
//!         Ok(())
//!     }))
//!     .up("default")
//!     .await?;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    Error,
    database::{ConnectionRegistry, Database},
    ledger::Ledger,
};

// ============================================================================
// Migration Units
// ============================================================================

/// Async step run against a database handle.
pub type MigrationTask = Box<dyn Fn(Database) -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

/// A reversible schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Sortable unique name, recorded in the ledger.
    fn name(&self) -> &str;

    async fn up(&self, db: &Database) -> Result<(), Error>;

    async fn down(&self, db: &Database) -> Result<(), Error>;
}

/// Migration read from a `.sql` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    name: String,
    up: String,
    down: String,
}

impl SqlMigration {
    /// Splits `source` into its `-- up` and `-- down` sections.
    ///
    /// Text before any marker belongs to `up`.
    pub fn parse(name: impl Into<String>, source: &str) -> Self {
        let mut up = String::new();
        let mut down = String::new();
        let mut in_down = false;

        for line in source.lines() {
            let marker = line.trim().to_ascii_lowercase();
            if marker == "-- up" || marker == "--up" {
                in_down = false;
                continue;
            }
            if marker == "-- down" || marker == "--down" {
                in_down = true;
                continue;
            }

            let target = if in_down { &mut down } else { &mut up };
            target.push_str(line);
            target.push('\n');
        }

        Self { name: name.into(), up: up.trim().to_string(), down: down.trim().to_string() }
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidArgument(format!("Invalid migration file name `{}`", path.display())))?;
        let source = fs::read_to_string(path)?;
        Ok(Self::parse(name, &source))
    }

    pub fn up_sql(&self) -> &str {
        &self.up
    }

    pub fn down_sql(&self) -> &str {
        &self.down
    }
}

#[async_trait]
impl Migration for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn up(&self, db: &Database) -> Result<(), Error> {
        if !self.up.is_empty() {
            db.raw(&self.up).await?;
        }
        Ok(())
    }

    async fn down(&self, db: &Database) -> Result<(), Error> {
        if !self.down.is_empty() {
            db.raw(&self.down).await?;
        }
        Ok(())
    }
}

struct TaskMigration {
    name: String,
    up: MigrationTask,
    down: MigrationTask,
}

#[async_trait]
impl Migration for TaskMigration {
    fn name(&self) -> &str {
        &self.name
    }

    async fn up(&self, db: &Database) -> Result<(), Error> {
        (self.up)(db.clone()).await
    }

    async fn down(&self, db: &Database) -> Result<(), Error> {
        (self.down)(db.clone()).await
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of [`Migrator::up`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Names applied in this run, all in one batch.
    Applied { batch: u32, migrations: Vec<String> },
    /// Every known migration is already applied.
    NothingToMigrate,
}

/// One row of [`Migrator::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub migration: String,
    /// `None` while pending.
    pub batch: Option<u32>,
}

// ============================================================================
// Migrator
// ============================================================================

/// Applies and rolls back migrations, keeping the ledger current.
pub struct Migrator<'a> {
    registry: &'a ConnectionRegistry,
    ledger_path: PathBuf,
    directory: Option<PathBuf>,
    registered: Vec<Arc<dyn Migration>>,
}

impl<'a> Migrator<'a> {
    pub fn new(registry: &'a ConnectionRegistry, ledger_path: impl Into<PathBuf>) -> Self {
        Self { registry, ledger_path: ledger_path.into(), directory: None, registered: Vec::new() }
    }

    /// Reads `*.sql` migrations from `path` on every run.
    pub fn directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directory = Some(path.into());
        self
    }

    /// Registers a migration built from two async closures.
    pub fn register<U, D>(self, name: &str, up: U, down: D) -> Self
    where
        U: Fn(Database) -> BoxFuture<'static, Result<(), Error>> + Send + Sync + 'static,
        D: Fn(Database) -> BoxFuture<'static, Result<(), Error>> + Send + Sync + 'static,
    {
        self.add(TaskMigration { name: name.to_string(), up: Box::new(up), down: Box::new(down) })
    }

    /// Registers any [`Migration`] implementation.
    pub fn add(mut self, migration: impl Migration + 'static) -> Self {
        self.registered.push(Arc::new(migration));
        self
    }

    /// Every known migration, sorted by name.
    fn units(&self) -> Result<Vec<Arc<dyn Migration>>, Error> {
        let mut units = self.registered.clone();

        if let Some(dir) = &self.directory
            && dir.is_dir()
        {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
                    units.push(Arc::new(SqlMigration::from_file(&path)?));
                }
            }
        }

        units.sort_by(|a, b| a.name().cmp(b.name()));
        if let Some(pair) = units.windows(2).find(|pair| pair[0].name() == pair[1].name()) {
            return Err(Error::InvalidArgument(format!("Duplicate migration name `{}`", pair[0].name())));
        }
        Ok(units)
    }

    /// Applies every pending migration as one new batch.
    pub async fn up(&self, connection: &str) -> Result<MigrationOutcome, Error> {
        let units = self.units()?;
        let mut ledger = Ledger::load(&self.ledger_path)?;

        let pending: Vec<_> = units.into_iter().filter(|u| !ledger.contains(u.name())).collect();
        if pending.is_empty() {
            log::info!("Nothing to migrate");
            return Ok(MigrationOutcome::NothingToMigrate);
        }

        let db = self.registry.connection(connection).await?;
        let batch = ledger.next_batch();
        let mut applied = Vec::with_capacity(pending.len());

        for unit in pending {
            if let Err(e) = unit.up(&db).await {
                log::warn!("Migration `{}` failed: {}", unit.name(), e);
                ledger.save()?;
                return Err(Error::migration_failed(e));
            }

            ledger.record(unit.name(), batch);
            ledger.save()?;
            log::info!("Migrated: {} (batch {})", unit.name(), batch);
            applied.push(unit.name().to_string());
        }

        Ok(MigrationOutcome::Applied { batch, migrations: applied })
    }

    /// Rolls back `batch`, or the most recent one, in reverse name order.
    ///
    /// Returns the rolled-back names; empty when nothing is applied.
    pub async fn down(&self, connection: &str, batch: Option<u32>) -> Result<Vec<String>, Error> {
        let mut ledger = Ledger::load(&self.ledger_path)?;
        let Some(batch) = batch.or_else(|| ledger.last_batch()) else {
            log::info!("Nothing to roll back");
            return Ok(Vec::new());
        };

        let units = self.units()?;
        let db = self.registry.connection(connection).await?;
        let mut rolled_back = Vec::new();

        for name in ledger.rollback_order(batch) {
            let Some(unit) = units.iter().find(|u| u.name() == name) else {
                ledger.save()?;
                return Err(Error::rollback_failed(Error::InvalidArgument(format!(
                    "Migration `{}` is recorded but no longer exists",
                    name
                ))));
            };

            if let Err(e) = unit.down(&db).await {
                log::warn!("Rollback of `{}` failed: {}", name, e);
                ledger.save()?;
                return Err(Error::rollback_failed(e));
            }

            ledger.remove(&name);
            ledger.save()?;
            log::info!("Rolled back: {} (batch {})", name, batch);
            rolled_back.push(name);
        }

        Ok(rolled_back)
    }

    /// Rolls back the `steps` most recent batches, newest first.
    pub async fn rollback_steps(&self, connection: &str, steps: usize) -> Result<Vec<String>, Error> {
        let batches = Ledger::load(&self.ledger_path)?.batches_desc();

        let mut rolled_back = Vec::new();
        for batch in batches.into_iter().take(steps) {
            rolled_back.extend(self.down(connection, Some(batch)).await?);
        }
        Ok(rolled_back)
    }

    /// Rolls back every batch.
    pub async fn reset(&self, connection: &str) -> Result<Vec<String>, Error> {
        let steps = Ledger::load(&self.ledger_path)?.batches_desc().len();
        self.rollback_steps(connection, steps).await
    }

    /// Every known migration with its batch, in application order.
    pub fn status(&self) -> Result<Vec<MigrationStatus>, Error> {
        let ledger = Ledger::load(&self.ledger_path)?;

        Ok(self
            .units()?
            .iter()
            .map(|u| MigrationStatus { migration: u.name().to_string(), batch: ledger.batch_of(u.name()) })
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
