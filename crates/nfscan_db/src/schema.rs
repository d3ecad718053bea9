//! Database schema creation for all NFScan tables.
//!
//! All CREATE TABLE statements live here - single source of truth.

use crate::error::Result;
use crate::NfscanDb;
use tracing::info;

impl NfscanDb {
    /// Ensure all tables exist.
    pub(crate) async fn ensure_schema(&self) -> Result<()> {
        self.create_task_tables().await?;
        self.create_queue_tables().await?;

        info!("Database schema verified");
        Ok(())
    }

    /// Create task and point tables
    async fn create_task_tables(&self) -> Result<()> {
        // Tasks: one row per scan run
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS scan_task (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'created',
                config TEXT NOT NULL,
                note TEXT NOT NULL DEFAULT ''
            )"#,
        )
        .execute(&self.pool)
        .await?;

        // Points: append-only samples, id preserves insertion order
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS scan_point (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id TEXT NOT NULL REFERENCES scan_task(id),
                x REAL NOT NULL,
                y REAL NOT NULL,
                z REAL NOT NULL,
                value REAL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scan_point_task ON scan_point(task_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create the scan queue table
    async fn create_queue_tables(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS scan_queue_item (
                id TEXT PRIMARY KEY,
                created_at INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                params TEXT NOT NULL,
                trace_list TEXT NOT NULL,
                task_id TEXT,
                message TEXT NOT NULL DEFAULT ''
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scan_queue_status ON scan_queue_item(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scan_queue_created ON scan_queue_item(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
