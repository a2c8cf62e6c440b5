//! # Error Handling Module
//!
//! This module defines the error type used throughout Maya ORM.
//!
//! ## Error Types
//!
//! - **Configuration**: unknown connection name, unsupported driver
//! - **MethodNotAllowed**: an operation was chained in a state that forbids it
//! - **InvalidArgument**: a call that can never produce a valid statement
//! - **Conversion**: a value could not be moved between Rust and storage form
//! - **PlaceholderMismatch**: bound values out of step with `?` placeholders
//! - **DatabaseError**: wrapped sqlx errors, propagated unmodified
//! - **Migration**: a migration or rollback step failed
//!
//! Absent rows are not errors: `find`, `first` and `last` return `Ok(None)`.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! match db.model::<User>()?.and_where("email", "a@b.c")?.save().await {
//!     Err(Error::MethodNotAllowed { method, state }) => eprintln!("{method} not allowed while {state}"),
//!     Err(Error::DatabaseError(e)) => eprintln!("Database error: {e}"),
//!     Err(e) => eprintln!("Other error: {e}"),
//!     Ok(_) => {}
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::gate::GateState;

// ============================================================================
// Error Enum Definition
// ============================================================================

/// The main error type for Maya ORM operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connection configuration could not be resolved.
    ///
    /// Raised for unknown connection names and unsupported drivers. These are
    /// fatal: nothing is retried and no statement has been executed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation was invoked in a chain state that does not allow it.
    ///
    /// This is always a programming error, e.g. calling `save()` right after
    /// `and_where(...)` or filtering a row that was already located with `find`.
    #[error("Method `{method}` is not allowed while the query is {state}")]
    MethodNotAllowed {
        /// Name of the rejected operation.
        method: &'static str,
        /// State the chain was in when the call was made.
        state: GateState,
    },

    /// Invalid argument error.
    ///
    /// Used when a call cannot produce a meaningful statement, such as a
    /// predicate-less `DELETE` or restoring rows on a model without a
    /// soft-delete column.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Type conversion error.
    ///
    /// Occurs when a stored value cannot be decoded into the requested Rust
    /// type, or a cast cannot coerce a caller value.
    #[error("Type conversion error: {0}")]
    Conversion(String),

    /// The number of `?` placeholders does not match the number of bound values.
    ///
    /// The builder tracks both counts internally; a mismatch means a raw
    /// fragment was passed the wrong number of values.
    #[error("Statement has {placeholders} placeholders but {values} bound values")]
    PlaceholderMismatch {
        /// Placeholders found in the finalized statement.
        placeholders: usize,
        /// Values collected for binding.
        values: usize,
    },

    /// Database operation error.
    ///
    /// Wraps errors from sqlx (connection failures, syntax errors, constraint
    /// violations). The engine never retries or swallows these.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A migration or rollback step failed.
    ///
    /// The ledger has already been persisted with the steps that succeeded
    /// before the failure.
    #[error("{context}: {source}")]
    Migration {
        /// "Migration failed" or "Rollback failed".
        context: &'static str,
        /// The underlying cause.
        #[source]
        source: Box<Error>,
    },

    /// Filesystem error while reading migrations or the ledger.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error (ledger file, json casts, config).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Helper Functions
// ============================================================================

impl Error {
    /// Creates a `Configuration` error from a string slice.
    pub fn configuration(msg: &str) -> Self {
        Error::Configuration(msg.to_string())
    }

    /// Creates an `InvalidArgument` error from a string slice.
    pub fn invalid_argument(msg: &str) -> Self {
        Error::InvalidArgument(msg.to_string())
    }

    /// Creates a `Conversion` error from a string slice.
    pub fn conversion(msg: &str) -> Self {
        Error::Conversion(msg.to_string())
    }

    /// Wraps an error raised while applying migrations.
    pub fn migration_failed(source: Error) -> Self {
        Error::Migration { context: "Migration failed", source: Box::new(source) }
    }

    /// Wraps an error raised while rolling migrations back.
    pub fn rollback_failed(source: Error) -> Self {
        Error::Migration { context: "Rollback failed", source: Box::new(source) }
    }
}

// ============================================================================
// Tests
// ============================================================================
