//! # Migration Ledger
//!
//! Durable record of which migrations are applied and in which batch.
//!
//! The ledger is a JSON array of `{"migration": name, "batch": n}` objects.
//! A missing file reads as an empty ledger; the parent directory is created
//! on first write.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Error;

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub migration: String,
    pub batch: u32,
}

/// The applied-migration ledger, bound to its file.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Reads the ledger at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            if data.trim().is_empty() { Vec::new() } else { serde_json::from_str(&data)? }
        } else {
            Vec::new()
        };

        Ok(Self { path, entries })
    }

    /// Writes the ledger back to its file.
    pub fn save(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn contains(&self, migration: &str) -> bool {
        self.entries.iter().any(|e| e.migration == migration)
    }

    pub fn batch_of(&self, migration: &str) -> Option<u32> {
        self.entries.iter().find(|e| e.migration == migration).map(|e| e.batch)
    }

    /// Highest batch number, if anything is applied.
    pub fn last_batch(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.batch).max()
    }

    /// Batch number for the next `up` run.
    pub fn next_batch(&self) -> u32 {
        self.last_batch().map_or(1, |b| b + 1)
    }

    /// Distinct batch numbers, newest first.
    pub fn batches_desc(&self) -> Vec<u32> {
        let batches: BTreeSet<u32> = self.entries.iter().map(|e| e.batch).collect();
        batches.into_iter().rev().collect()
    }

    /// Migrations of `batch`, in reverse name order.
    pub fn rollback_order(&self, batch: u32) -> Vec<String> {
        let mut names: Vec<String> =
            self.entries.iter().filter(|e| e.batch == batch).map(|e| e.migration.clone()).collect();
        names.sort();
        names.reverse();
        names
    }

    /// Adds `migration` to `batch`. A migration is recorded at most once.
    pub fn record(&mut self, migration: &str, batch: u32) {
        if !self.contains(migration) {
            self.entries.push(LedgerEntry { migration: migration.to_string(), batch });
        }
    }

    pub fn remove(&mut self, migration: &str) {
        self.entries.retain(|e| e.migration != migration);
    }
}
