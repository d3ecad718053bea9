//! Point store operations.
//!
//! Points are append-only: no update path exists, and rows only disappear
//! through `delete_task`.

use std::path::Path;

use crate::error::Result;
use crate::types::{NewPoint, ScanPoint};
use crate::NfscanDb;
use sqlx::Row;
use tracing::debug;

impl NfscanDb {
    /// Append a batch of points to a task.
    ///
    /// The whole batch is atomic: either all points commit or none do. Fails
    /// with a foreign key violation if the task does not exist, rolling the
    /// batch back.
    pub async fn append_points(&self, task_id: &str, points: &[NewPoint]) -> Result<u64> {
        if points.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for p in points {
            sqlx::query("INSERT INTO scan_point (task_id, x, y, z, value) VALUES (?, ?, ?, ?, ?)")
                .bind(task_id)
                .bind(p.x)
                .bind(p.y)
                .bind(p.z)
                .bind(p.value)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(task_id, count = points.len(), "Scan points appended");
        Ok(points.len() as u64)
    }

    /// Points for a task in insertion order.
    pub async fn get_points(&self, task_id: &str) -> Result<Vec<ScanPoint>> {
        let rows = sqlx::query(
            "SELECT id, task_id, x, y, z, value FROM scan_point WHERE task_id = ? ORDER BY id ASC",
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ScanPoint {
                id: row.get("id"),
                task_id: row.get("task_id"),
                x: row.get("x"),
                y: row.get("y"),
                z: row.get("z"),
                value: row.get("value"),
            })
            .collect())
    }

    /// Number of points recorded for a task.
    pub async fn count_points(&self, task_id: &str) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(1) AS n FROM scan_point WHERE task_id = ?")
            .bind(task_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("n") as u64)
    }

    /// Export a task's points to CSV (x,y,z,value columns, NULL values as
    /// empty cells). Returns the number of data rows written.
    pub async fn export_points_csv(&self, task_id: &str, out_path: &Path) -> Result<u64> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let points = self.get_points(task_id).await?;

        let mut writer = csv::Writer::from_path(out_path)?;
        writer.write_record(["x", "y", "z", "value"])?;
        for p in &points {
            writer.write_record([
                p.x.to_string(),
                p.y.to_string(),
                p.z.to_string(),
                p.value.map(|v| v.to_string()).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;

        debug!(task_id, rows = points.len(), path = %out_path.display(), "Points exported");
        Ok(points.len() as u64)
    }
}
