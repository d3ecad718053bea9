//! Task store operations.

use crate::error::{DbError, Result};
use crate::types::{ScanTask, TaskFilter, TaskStatus};
use crate::NfscanDb;
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

impl NfscanDb {
    /// Create a task with a store-allocated id.
    ///
    /// The task starts in `created` status with an empty note; the config
    /// blob is stored verbatim.
    pub async fn create_task(&self, name: &str, config: &str) -> Result<String> {
        let task_id = Uuid::new_v4().to_string();
        self.create_task_with_id(&task_id, name, config).await?;
        Ok(task_id)
    }

    /// Create a task under a caller-supplied id.
    pub async fn create_task_with_id(&self, task_id: &str, name: &str, config: &str) -> Result<()> {
        let now = Self::now_millis();

        sqlx::query(
            r#"
            INSERT INTO scan_task (id, name, created_at, status, config, note)
            VALUES (?, ?, ?, 'created', ?, '')
            "#,
        )
        .bind(task_id)
        .bind(name)
        .bind(now)
        .bind(config)
        .execute(&self.pool)
        .await?;

        info!(task_id, name, "Scan task created");
        Ok(())
    }

    /// Get a task by id.
    pub async fn get_task(&self, task_id: &str) -> Result<ScanTask> {
        let row = sqlx::query("SELECT * FROM scan_task WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.row_to_task(&row),
            None => Err(DbError::not_found(format!("task {task_id}"))),
        }
    }

    /// Advance a task's status.
    ///
    /// Transitions are forward-only (created -> running -> {done, failed})
    /// and applied as a single compare-and-set against the allowed sources.
    pub async fn set_task_status(&self, task_id: &str, next: TaskStatus) -> Result<()> {
        let sources = TaskStatus::transition_sources(next);
        if sources.is_empty() {
            return Err(DbError::invalid_transition(format!(
                "no status may move to '{next}'"
            )));
        }

        let mut sql = String::from("UPDATE scan_task SET status = ? WHERE id = ? AND status IN (");
        sql.push_str(&vec!["?"; sources.len()].join(", "));
        sql.push(')');

        let mut query = sqlx::query(&sql).bind(next.as_str()).bind(task_id);
        for source in sources {
            query = query.bind(source.as_str());
        }
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            // Distinguish a missing task from a disallowed transition
            let current = self.get_task(task_id).await?.status;
            return Err(DbError::invalid_transition(format!(
                "{current} -> {next} for task {task_id}"
            )));
        }

        info!(task_id, status = %next, "Task status updated");
        Ok(())
    }

    /// Overwrite a task's note.
    pub async fn annotate_task(&self, task_id: &str, note: &str) -> Result<()> {
        let result = sqlx::query("UPDATE scan_task SET note = ? WHERE id = ?")
            .bind(note)
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(format!("task {task_id}")));
        }
        Ok(())
    }

    /// List tasks, newest first, with optional status filter and limit.
    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<ScanTask>> {
        let mut sql = String::from("SELECT * FROM scan_task");

        if let Some(status) = filter.status {
            sql.push_str(&format!(" WHERE status = '{}'", status.as_str()));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| self.row_to_task(row)).collect()
    }

    /// Delete a task and its points in one transaction.
    ///
    /// The schema declares no ON DELETE CASCADE; this is the explicit
    /// cleanup path. Returns the number of points removed.
    pub async fn delete_task(&self, task_id: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let points = sqlx::query("DELETE FROM scan_point WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let tasks = sqlx::query("DELETE FROM scan_task WHERE id = ?")
            .bind(task_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if tasks == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found(format!("task {task_id}")));
        }

        tx.commit().await?;

        info!(task_id, points, "Scan task deleted");
        Ok(points)
    }

    fn row_to_task(&self, row: &sqlx::sqlite::SqliteRow) -> Result<ScanTask> {
        let status_str: String = row.get("status");
        let status = TaskStatus::parse(&status_str).ok_or_else(|| {
            DbError::invalid_state(format!("Unknown task status: {status_str}"))
        })?;

        Ok(ScanTask {
            id: row.get("id"),
            name: row.get("name"),
            created_at: Self::millis_to_datetime(row.get::<i64, _>("created_at")),
            status,
            config: row.get("config"),
            note: row.get("note"),
        })
    }
}
