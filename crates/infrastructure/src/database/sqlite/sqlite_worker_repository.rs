use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::{Worker, WorkerStatus};
use courier_domain::repositories::WorkerRepository;

pub struct SqliteWorkerRepository {
    pool: SqlitePool,
}

impl SqliteWorkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_worker(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<Worker> {
        let status_str: String = row.try_get("status")?;
        let status: WorkerStatus = status_str
            .parse()
            .map_err(DispatchError::Serialization)?;
        let registered_at: DateTime<Utc> = row.try_get("registered_at")?;

        Ok(Worker {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            vehicle_model: row.try_get("vehicle_model")?,
            vehicle_plate: row.try_get("vehicle_plate")?,
            status,
            registered_at,
        })
    }
}

#[async_trait]
impl WorkerRepository for SqliteWorkerRepository {
    async fn register(&self, worker: &Worker) -> DispatchResult<()> {
        sqlx::query(
            r#"
            INSERT INTO workers (id, name, vehicle_model, vehicle_plate, status, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                vehicle_model = excluded.vehicle_model,
                vehicle_plate = excluded.vehicle_plate,
                status = excluded.status
            "#,
        )
        .bind(&worker.id)
        .bind(&worker.name)
        .bind(&worker.vehicle_model)
        .bind(&worker.vehicle_plate)
        .bind(worker.status.to_string())
        .bind(worker.registered_at)
        .execute(&self.pool)
        .await?;

        debug!("Worker {} 已写入注册表", worker.id);
        Ok(())
    }

    async fn get_by_id(&self, worker_id: &str) -> DispatchResult<Option<Worker>> {
        let row = sqlx::query(
            "SELECT id, name, vehicle_model, vehicle_plate, status, registered_at FROM workers WHERE id = $1",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_worker(&row)).transpose()
    }

    async fn get_all(&self) -> DispatchResult<Vec<Worker>> {
        let rows = sqlx::query(
            "SELECT id, name, vehicle_model, vehicle_plate, status, registered_at FROM workers ORDER BY registered_at",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_worker).collect()
    }

    async fn update_status(&self, worker_id: &str, status: WorkerStatus) -> DispatchResult<()> {
        let result = sqlx::query("UPDATE workers SET status = $2 WHERE id = $1")
            .bind(worker_id)
            .bind(status.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::unknown_worker(worker_id));
        }
        Ok(())
    }

    async fn unregister(&self, worker_id: &str) -> DispatchResult<bool> {
        let result = sqlx::query("DELETE FROM workers WHERE id = $1")
            .bind(worker_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
