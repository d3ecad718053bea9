//! Storage layer for NFScan scan tasks, point data and the scan queue.
//!
//! This crate provides a single source of truth for all database operations.
//! All interfaces (worker, UI, tooling) should use this crate for database
//! access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nfscan_db::{NfscanDb, Result};
//!
//! let db = NfscanDb::open("~/.nfscan/nfscan.sqlite3").await?;
//!
//! // Producer side
//! let item_id = db.enqueue(params_json, trace_list_json).await?;
//!
//! // Worker side
//! if let Some(item) = db.claim_next().await? {
//!     let task_id = db.create_task("scan run", &item.params).await?;
//!     db.attach_task(&item.id, &task_id).await?;
//! }
//! ```

mod error;
mod schema;
mod types;

// Method implementations organized by store
mod point;
mod queue;
mod task;

pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Unified database handle for the NFScan stores.
///
/// This is the ONLY way to access the database. Do not use raw sqlx elsewhere.
#[derive(Clone)]
pub struct NfscanDb {
    pool: SqlitePool,
}

impl NfscanDb {
    /// Open or create a database at the given path.
    ///
    /// Creates all tables if they don't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Self::connect(path, true).await?;
        db.ensure_schema().await?;

        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Open an existing database (fails if not exists).
    pub async fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DbError::NotFound(format!(
                "Database not found: {}",
                path.display()
            )));
        }

        Self::connect(path, false).await
    }

    async fn connect(path: &Path, create: bool) -> Result<Self> {
        // foreign_keys is a per-connection pragma; setting it in the connect
        // options covers every pooled connection.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool (escape hatch for complex queries).
    ///
    /// Prefer using the typed methods instead.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

// Timestamp utilities
impl NfscanDb {
    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Convert milliseconds to DateTime.
    pub fn millis_to_datetime(millis: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp_millis(millis).unwrap_or_else(chrono::Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("test.db");

        let db = NfscanDb::open(&db_path).await.unwrap();
        assert!(db_path.exists());

        db.close().await;
    }

    #[tokio::test]
    async fn test_open_existing_fails_if_not_exists() {
        let tmp = TempDir::new().unwrap();
        let db_path = tmp.path().join("nonexistent.db");

        let result = NfscanDb::open_existing(&db_path).await;
        assert!(result.is_err());
    }
}
