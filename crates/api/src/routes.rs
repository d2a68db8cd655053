use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use courier_dispatcher::{
    AvailabilityQueue, DispatchCoordinator, OrderLedger, WorkerRegistryService,
};

use crate::handlers::{health, orders, queue, workers};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<DispatchCoordinator>,
    pub registry: Arc<WorkerRegistryService>,
    pub queue: Arc<dyn AvailabilityQueue>,
    pub ledger: Arc<dyn OrderLedger>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health::health_check))
        // 订单
        .route("/api/orders", post(orders::create_order))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/accept", post(orders::accept_order))
        // Worker管理
        .route(
            "/api/workers",
            get(workers::list_workers).post(workers::register_worker),
        )
        .route("/api/workers/{id}", get(workers::get_worker_profile))
        .route("/api/workers/{id}/delete", post(workers::delete_worker))
        // 可用性队列
        .route("/api/queue", get(queue::list_queue))
        .route("/api/queue/join", post(queue::join_queue))
        .route("/api/queue/leave", post(queue::leave_queue))
        .route("/api/queue/reset", post(queue::reset_queue))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
