use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use courier_core::DispatchResult;
use courier_domain::entities::QueueEntry;
use courier_domain::repositories::QueueRepository;

pub struct SqliteQueueRepository {
    pool: SqlitePool,
}

impl SqliteQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<QueueEntry> {
        let joined_at: DateTime<Utc> = row.try_get("joined_at")?;
        Ok(QueueEntry {
            worker_id: row.try_get("worker_id")?,
            position: row.try_get("position")?,
            joined_at,
        })
    }
}

#[async_trait]
impl QueueRepository for SqliteQueueRepository {
    async fn insert(&self, entry: &QueueEntry) -> DispatchResult<()> {
        sqlx::query(
            "INSERT INTO queue_entries (worker_id, position, joined_at) VALUES ($1, $2, $3)",
        )
        .bind(&entry.worker_id)
        .bind(entry.position)
        .bind(entry.joined_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_worker_id(&self, worker_id: &str) -> DispatchResult<Option<QueueEntry>> {
        let row = sqlx::query(
            "SELECT worker_id, position, joined_at FROM queue_entries WHERE worker_id = $1",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_entry(&row)).transpose()
    }

    async fn get_all_ordered(&self) -> DispatchResult<Vec<QueueEntry>> {
        let rows = sqlx::query(
            "SELECT worker_id, position, joined_at FROM queue_entries ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    async fn set_position(&self, worker_id: &str, position: i64) -> DispatchResult<()> {
        sqlx::query("UPDATE queue_entries SET position = $2 WHERE worker_id = $1")
            .bind(worker_id)
            .bind(position)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete(&self, worker_id: &str) -> DispatchResult<bool> {
        let result = sqlx::query("DELETE FROM queue_entries WHERE worker_id = $1")
            .bind(worker_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> DispatchResult<u64> {
        let result = sqlx::query("DELETE FROM queue_entries")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
