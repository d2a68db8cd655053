use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::{Order, OrderStatus};
use courier_domain::repositories::OrderRepository;

pub struct SqliteOrderRepository {
    pool: SqlitePool,
}

impl SqliteOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_order(row: &sqlx::sqlite::SqliteRow) -> DispatchResult<Order> {
        let status_str: String = row.try_get("status")?;
        let status: OrderStatus = status_str
            .parse()
            .map_err(DispatchError::Serialization)?;
        let offered_json: String = row.try_get("offered")?;
        let offered: Vec<String> = serde_json::from_str(&offered_json)?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        Ok(Order {
            id: row.try_get("id")?,
            status,
            assignee: row.try_get("assignee")?,
            origin_ref: row.try_get("origin_ref")?,
            payload: row.try_get("payload")?,
            deadline_token: row.try_get("deadline_token")?,
            offered,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn create(&self, order: &Order) -> DispatchResult<()> {
        let offered_json = serde_json::to_string(&order.offered)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, status, assignee, origin_ref, payload, deadline_token, offered, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&order.id)
        .bind(order.status.to_string())
        .bind(&order.assignee)
        .bind(&order.origin_ref)
        .bind(&order.payload)
        .bind(order.deadline_token)
        .bind(offered_json)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_id(&self, order_id: &str) -> DispatchResult<Option<Order>> {
        let row = sqlx::query(
            "SELECT id, status, assignee, origin_ref, payload, deadline_token, offered, created_at, updated_at FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_order(&row)).transpose()
    }

    async fn update(&self, order: &Order) -> DispatchResult<()> {
        let offered_json = serde_json::to_string(&order.offered)?;

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, assignee = $3, origin_ref = $4, payload = $5,
                deadline_token = $6, offered = $7, created_at = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(&order.id)
        .bind(order.status.to_string())
        .bind(&order.assignee)
        .bind(&order.origin_ref)
        .bind(&order.payload)
        .bind(order.deadline_token)
        .bind(offered_json)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::order_not_found(&order.id));
        }
        Ok(())
    }

    async fn get_pending(&self) -> DispatchResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, status, assignee, origin_ref, payload, deadline_token, offered, created_at, updated_at FROM orders WHERE status = $1 ORDER BY created_at ASC",
        )
        .bind(OrderStatus::Pending.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_order).collect()
    }
}
