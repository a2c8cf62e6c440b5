//! # Query Log
//!
//! Every finalized statement executed through a [`Database`](crate::Database)
//! is recorded here with its bound values, the connection name and the time
//! it took. The log is shared by all handles of one registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use crate::Value;

/// One executed statement.
#[derive(Debug, Clone, Serialize)]
pub struct QueryLogEntry {
    pub connection: String,
    pub sql: String,
    pub bindings: Vec<Value>,
    pub duration: Duration,
}

/// Shared, append-only execution log.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    entries: Arc<Mutex<Vec<QueryLogEntry>>>,
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueryLogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, entry: QueryLogEntry) {
        log::debug!(
            "[{}] {} {:?} ({:.3} ms)",
            entry.connection,
            entry.sql,
            entry.bindings,
            entry.duration.as_secs_f64() * 1000.0
        );
        self.lock().push(entry);
    }

    /// Snapshot of every entry recorded so far.
    pub fn entries(&self) -> Vec<QueryLogEntry> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<QueryLogEntry> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
