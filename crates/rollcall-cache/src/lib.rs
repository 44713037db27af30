//! Rollcall Cache - Local durable state
//!
//! SQLite-based storage for:
//! - The pending action queue
//! - The dead-letter list
//! - The last good snapshot
//! - The per-installation client id
//!
//! ## Architecture
//!
//! This crate implements the `IKeyValueStore` port from `rollcall-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture; the sync crate owns the document layout.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use rollcall_cache::{DatabasePool, SqliteKeyValueStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/var/lib/rollcall/rollcall.db")).await?;
//! let store = SqliteKeyValueStore::new(pool.pool().clone());
//! // Use store as IKeyValueStore...
//! # Ok(())
//! # }
//! ```

pub mod kv_store;
pub mod pool;

pub use kv_store::SqliteKeyValueStore;
pub use pool::DatabasePool;

/// Errors from the SQLite adapter
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The database file could not be created or opened
    #[error("Cannot open kiosk store: {0}")]
    ConnectionFailed(String),

    /// Schema creation failed, or the schema is from a newer build
    #[error("Kiosk store schema: {0}")]
    MigrationFailed(String),

    /// Reading a key failed
    #[error("Failed to read '{key}': {message}")]
    Read { key: String, message: String },

    /// Writing or deleting a key failed
    #[error("Failed to write '{key}': {message}")]
    Write { key: String, message: String },

    /// Any other statement failed
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl CacheError {
    pub(crate) fn read(key: &str, err: sqlx::Error) -> Self {
        CacheError::Read {
            key: key.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn write(key: &str, err: sqlx::Error) -> Self {
        CacheError::Write {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
