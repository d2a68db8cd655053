use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use courier_api::{create_routes, AppState};
use courier_core::AppConfig;
use courier_dispatcher::{
    AvailabilityQueue, CoordinatorConfig, DeadlineScheduler, DispatchCoordinator, ExpiryListener,
    OfferRecoveryService, OrderLedger, OrderLedgerService, WorkerQueueService,
    WorkerRegistryService,
};
use courier_infrastructure::{
    Database, HttpNotifier, SqliteOrderRepository, SqliteQueueRepository, SqliteWorkerRepository,
};

/// 主应用程序：装配存储、派发引擎与API
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        // 存储层
        let database = Database::connect(&self.config.database)
            .await
            .context("初始化数据库失败")?;
        let pool = database.pool();
        let worker_repo = Arc::new(SqliteWorkerRepository::new(pool.clone()));
        let queue_repo = Arc::new(SqliteQueueRepository::new(pool.clone()));
        let order_repo = Arc::new(SqliteOrderRepository::new(pool));

        // 通知网关
        let notifier = Arc::new(HttpNotifier::new(&self.config.notifier)?);

        // 派发引擎
        let queue: Arc<dyn AvailabilityQueue> = Arc::new(WorkerQueueService::new(
            worker_repo.clone(),
            queue_repo.clone(),
        ));
        let ledger: Arc<dyn OrderLedger> = Arc::new(OrderLedgerService::new(order_repo.clone()));
        let (deadlines, expiry_rx) = DeadlineScheduler::new();
        let coordinator = Arc::new(DispatchCoordinator::new(
            queue.clone(),
            ledger.clone(),
            worker_repo.clone(),
            notifier,
            Arc::new(deadlines),
            Some(CoordinatorConfig {
                offer_timeout: Duration::from_secs(self.config.dispatcher.offer_timeout_seconds),
            }),
        ));
        let registry = Arc::new(WorkerRegistryService::new(worker_repo, queue.clone()));

        // 重启前的在途订单：重新装配截止时间或重新派发
        let recovery = OfferRecoveryService::new(order_repo, coordinator.clone());
        let report = recovery.recover().await.context("启动恢复失败")?;
        if !report.errors.is_empty() {
            warn!("启动恢复有 {} 个订单失败", report.errors.len());
        }

        // 到期监听器
        let listener = ExpiryListener::new(coordinator.clone(), expiry_rx);
        let listener_handle = tokio::spawn(listener.run(shutdown_rx.resubscribe()));

        // API服务器
        if self.config.api.enabled {
            let state = AppState {
                coordinator,
                registry,
                queue,
                ledger,
            };
            let mut app = create_routes(state);
            if self.config.api.cors_enabled {
                app = app.layer(CorsLayer::permissive());
            }

            let tcp_listener = TcpListener::bind(&self.config.api.bind_address)
                .await
                .with_context(|| format!("绑定API地址失败: {}", self.config.api.bind_address))?;
            info!("API服务器监听 {}", self.config.api.bind_address);

            let mut serve_shutdown = shutdown_rx.resubscribe();
            axum::serve(tcp_listener, app)
                .with_graceful_shutdown(async move {
                    let _ = serve_shutdown.recv().await;
                    info!("API服务器开始优雅关闭");
                })
                .await
                .context("API服务器运行失败")?;
        } else {
            warn!("API已禁用，仅运行派发引擎");
            let mut idle_shutdown = shutdown_rx.resubscribe();
            let _ = idle_shutdown.recv().await;
        }

        let _ = listener_handle.await;
        info!("应用组件已全部停止");
        Ok(())
    }
}
