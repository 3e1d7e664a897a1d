//! SQLite persistence layer.
//!
//! The core needs four record operations from its store: insert, point
//! lookup by unique key, descending filtered scan with first-row
//! extraction, and status-flip updates. Everything here is built from
//! those.

mod schema;

pub(crate) mod beds;
pub(crate) mod bills;
pub(crate) mod transactions;
pub(crate) mod visits;

pub use schema::SCHEMA;

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decimal parse error: {0}")]
    Decimal(#[from] rust_decimal::Error),

    #[error("constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction that takes the write lock up front.
    ///
    /// Every read-max-then-insert sequence (UHID/regno generation,
    /// transaction-number uniqueness, active-bill checks) runs inside one
    /// of these, so concurrent registrations cannot observe the same
    /// "last identifier" and collide.
    pub fn write_transaction(&mut self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}
