//! SQLite connection pool for the kiosk store
//!
//! The store is small and written on every queue mutation, so durability wins
//! over throughput: WAL with `synchronous = FULL`, a couple of connections
//! and a busy timeout long enough for an operator command running beside the
//! agent.
//!
//! The schema is versioned through `PRAGMA user_version`. Opening a database
//! written by a newer build fails instead of silently reading it.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use tracing::{debug, info};

use crate::CacheError;

/// Schema version this build writes
pub const SCHEMA_VERSION: i64 = 1;

const INITIAL_SCHEMA: &str = include_str!("migrations/20260401_initial.sql");

/// Connections for a file database: the agent plus one operator command
const FILE_MAX_CONNECTIONS: u32 = 2;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool over the kiosk's SQLite database
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (creating if needed) the database file at `db_path`
    ///
    /// Parent directories are created and the schema is brought up to
    /// [`SCHEMA_VERSION`].
    ///
    /// # Errors
    ///
    /// `CacheError::ConnectionFailed` when the file cannot be opened,
    /// `CacheError::MigrationFailed` when the schema cannot be applied or
    /// belongs to a newer build.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(FILE_MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to open database {}: {e}",
                    db_path.display()
                ))
            })?;

        let version = migrate(&pool).await?;
        info!(path = %db_path.display(), schema_version = version, "Kiosk store opened");
        Ok(Self { pool })
    }

    /// Opens a private in-memory database
    ///
    /// A single connection, since every SQLite memory connection is its own
    /// database.
    pub async fn in_memory() -> Result<Self, CacheError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CacheError::ConnectionFailed(e.to_string()))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Failed to create in-memory database: {e}"))
            })?;

        migrate(&pool).await?;
        debug!("In-memory kiosk store opened");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Reads the schema version stored in the database
    pub async fn schema_version(&self) -> Result<i64, CacheError> {
        read_version(&self.pool).await
    }

    /// Closes all connections, checkpointing the WAL
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn read_version(pool: &SqlitePool) -> Result<i64, CacheError> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Brings the schema to [`SCHEMA_VERSION`] and returns the resulting version
async fn migrate(pool: &SqlitePool) -> Result<i64, CacheError> {
    let current = read_version(pool).await?;
    if current > SCHEMA_VERSION {
        return Err(CacheError::MigrationFailed(format!(
            "database schema v{current} is newer than this build (v{SCHEMA_VERSION})"
        )));
    }
    if current == SCHEMA_VERSION {
        return Ok(current);
    }

    let failed = |e: sqlx::Error| CacheError::MigrationFailed(format!("v{SCHEMA_VERSION}: {e}"));
    let mut tx = pool.begin().await.map_err(failed)?;
    sqlx::raw_sql(INITIAL_SCHEMA)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    let set_version = format!("PRAGMA user_version = {SCHEMA_VERSION}");
    sqlx::raw_sql(&set_version)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    tx.commit().await.map_err(failed)?;

    debug!(from = current, to = SCHEMA_VERSION, "Schema migrated");
    Ok(SCHEMA_VERSION)
}
