pub mod sqlite;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use courier_core::{DatabaseConfig, DispatchError, DispatchResult};

/// 数据库连接管理：建池并初始化表结构
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> DispatchResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                DispatchError::Configuration(format!("无效的数据库地址 {}: {}", config.url, e))
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.init_schema().await?;
        info!("数据库初始化完成: {}", config.url);
        Ok(database)
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn init_schema(&self) -> DispatchResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS workers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                vehicle_model TEXT NOT NULL,
                vehicle_plate TEXT NOT NULL,
                status TEXT NOT NULL,
                registered_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_entries (
                worker_id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                joined_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                assignee TEXT,
                origin_ref TEXT NOT NULL,
                payload TEXT NOT NULL,
                deadline_token INTEGER,
                offered TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
