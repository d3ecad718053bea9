//! Queue store operations.
//!
//! Claiming flips the oldest pending item to claimed with one conditional
//! UPDATE; SQLite serializes writers, so at most one caller ever receives a
//! given item.

use crate::error::{DbError, Result};
use crate::types::{QueueItem, QueueStats, QueueStatus};
use crate::NfscanDb;
use sqlx::Row;
use tracing::info;
use uuid::Uuid;

impl NfscanDb {
    /// Enqueue a scan request with a store-allocated id.
    ///
    /// The item starts pending with no task attached; params and trace_list
    /// blobs are stored verbatim.
    pub async fn enqueue(&self, params: &str, trace_list: &str) -> Result<String> {
        let item_id = Uuid::new_v4().to_string();
        self.enqueue_with_id(&item_id, params, trace_list).await?;
        Ok(item_id)
    }

    /// Enqueue under a caller-supplied id.
    pub async fn enqueue_with_id(
        &self,
        item_id: &str,
        params: &str,
        trace_list: &str,
    ) -> Result<()> {
        let now = Self::now_millis();

        sqlx::query(
            r#"
            INSERT INTO scan_queue_item (id, created_at, status, params, trace_list, task_id, message)
            VALUES (?, ?, 'pending', ?, ?, NULL, '')
            "#,
        )
        .bind(item_id)
        .bind(now)
        .bind(params)
        .bind(trace_list)
        .execute(&self.pool)
        .await?;

        info!(item_id, "Scan request enqueued");
        Ok(())
    }

    /// Get a queue item by id.
    pub async fn get_queue_item(&self, item_id: &str) -> Result<QueueItem> {
        let row = sqlx::query("SELECT * FROM scan_queue_item WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => self.row_to_queue_item(&row),
            None => Err(DbError::not_found(format!("queue item {item_id}"))),
        }
    }

    /// Atomically claim the oldest pending item.
    ///
    /// Returns `None` when the backlog is empty. Ordering is by enqueue time,
    /// ties broken by id.
    pub async fn claim_next(&self) -> Result<Option<QueueItem>> {
        let row = sqlx::query(
            r#"
            UPDATE scan_queue_item
            SET status = 'claimed'
            WHERE id = (
                SELECT id FROM scan_queue_item
                WHERE status = 'pending'
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            AND status = 'pending'
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let item = self.row_to_queue_item(&row)?;
                info!(item_id = %item.id, "Queue item claimed");
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Bind the fulfilling task to a claimed item.
    ///
    /// The task id is set exactly once and never cleared.
    pub async fn attach_task(&self, item_id: &str, task_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE scan_queue_item SET task_id = ? WHERE id = ? AND status = 'claimed' AND task_id IS NULL",
        )
        .bind(task_id)
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let item = self.get_queue_item(item_id).await?;
            if item.task_id.is_some() {
                return Err(DbError::invalid_state(format!(
                    "queue item {item_id} already has a task attached"
                )));
            }
            return Err(DbError::invalid_state(format!(
                "queue item {item_id} is {} (expected claimed)",
                item.status
            )));
        }

        info!(item_id, task_id, "Task attached to queue item");
        Ok(())
    }

    /// Finish a claimed item as done or failed, recording a message.
    pub async fn complete_item(&self, item_id: &str, success: bool, message: &str) -> Result<()> {
        let status = if success {
            QueueStatus::Done
        } else {
            QueueStatus::Failed
        };
        self.finish_item(item_id, status, message).await
    }

    /// Cancel an item that has not been claimed yet.
    pub async fn cancel_item(&self, item_id: &str, message: &str) -> Result<()> {
        self.finish_item(item_id, QueueStatus::Canceled, message).await
    }

    async fn finish_item(&self, item_id: &str, next: QueueStatus, message: &str) -> Result<()> {
        let sources = QueueStatus::transition_sources(next);

        let mut sql =
            String::from("UPDATE scan_queue_item SET status = ?, message = ? WHERE id = ? AND status IN (");
        sql.push_str(&vec!["?"; sources.len()].join(", "));
        sql.push(')');

        let mut query = sqlx::query(&sql)
            .bind(next.as_str())
            .bind(message)
            .bind(item_id);
        for source in sources {
            query = query.bind(source.as_str());
        }
        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            let item = self.get_queue_item(item_id).await?;
            return Err(DbError::invalid_state(format!(
                "queue item {item_id} is {} (cannot move to {next})",
                item.status
            )));
        }

        info!(item_id, status = %next, "Queue item updated");
        Ok(())
    }

    /// Items in a given status, oldest first.
    pub async fn list_queue_by_status(
        &self,
        status: QueueStatus,
        limit: Option<usize>,
    ) -> Result<Vec<QueueItem>> {
        let mut sql = format!(
            "SELECT * FROM scan_queue_item WHERE status = '{}' ORDER BY created_at ASC, id ASC",
            status.as_str()
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| self.row_to_queue_item(row)).collect()
    }

    /// All items regardless of status, oldest first.
    pub async fn list_queue(&self, limit: Option<usize>) -> Result<Vec<QueueItem>> {
        let mut sql = String::from("SELECT * FROM scan_queue_item ORDER BY created_at ASC, id ASC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(|row| self.row_to_queue_item(row)).collect()
    }

    /// Remove a finished (done/failed/canceled) item.
    pub async fn delete_queue_item(&self, item_id: &str) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM scan_queue_item WHERE id = ? AND status IN ('done', 'failed', 'canceled')",
        )
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let item = self.get_queue_item(item_id).await?;
            return Err(DbError::invalid_state(format!(
                "queue item {item_id} is {} (only finished items can be removed)",
                item.status
            )));
        }

        Ok(())
    }

    /// Per-status queue counts.
    pub async fn queue_stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) as pending,
                COALESCE(SUM(CASE WHEN status = 'claimed' THEN 1 ELSE 0 END), 0) as claimed,
                COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0) as done,
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) as failed,
                COALESCE(SUM(CASE WHEN status = 'canceled' THEN 1 ELSE 0 END), 0) as canceled
            FROM scan_queue_item
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QueueStats {
            total: row.get::<i64, _>("total") as u64,
            pending: row.get::<i64, _>("pending") as u64,
            claimed: row.get::<i64, _>("claimed") as u64,
            done: row.get::<i64, _>("done") as u64,
            failed: row.get::<i64, _>("failed") as u64,
            canceled: row.get::<i64, _>("canceled") as u64,
        })
    }

    fn row_to_queue_item(&self, row: &sqlx::sqlite::SqliteRow) -> Result<QueueItem> {
        let status_str: String = row.get("status");
        let status = QueueStatus::parse(&status_str).ok_or_else(|| {
            DbError::invalid_state(format!("Unknown queue status: {status_str}"))
        })?;

        Ok(QueueItem {
            id: row.get("id"),
            created_at: Self::millis_to_datetime(row.get::<i64, _>("created_at")),
            status,
            params: row.get("params"),
            trace_list: row.get("trace_list"),
            task_id: row.get("task_id"),
            message: row.get("message"),
        })
    }
}
