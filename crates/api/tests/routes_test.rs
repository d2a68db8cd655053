use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::util::ServiceExt;

use courier_api::{create_routes, AppState};
use courier_dispatcher::{
    AvailabilityQueue, DeadlineScheduler, DispatchCoordinator, OrderLedger, OrderLedgerService,
    WorkerQueueService, WorkerRegistryService,
};
use courier_testing_utils::{
    MockNotifier, MockOrderRepository, MockQueueRepository, MockWorkerRepository,
};

fn test_router() -> axum::Router {
    let worker_repo = Arc::new(MockWorkerRepository::new());
    let queue_repo = Arc::new(MockQueueRepository::new());
    let order_repo = Arc::new(MockOrderRepository::new());
    let notifier = Arc::new(MockNotifier::new());

    let queue: Arc<dyn AvailabilityQueue> = Arc::new(WorkerQueueService::new(
        worker_repo.clone(),
        queue_repo.clone(),
    ));
    let ledger: Arc<dyn OrderLedger> = Arc::new(OrderLedgerService::new(order_repo));
    let (deadlines, _expiry_rx) = DeadlineScheduler::new();

    let coordinator = Arc::new(DispatchCoordinator::new(
        queue.clone(),
        ledger.clone(),
        worker_repo.clone(),
        notifier,
        Arc::new(deadlines),
        None,
    ));
    let registry = Arc::new(WorkerRegistryService::new(worker_repo, queue.clone()));

    create_routes(AppState {
        coordinator,
        registry,
        queue,
        ledger,
    })
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let router = test_router();
    let response = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn worker_registration_and_queue_flow() {
    let router = test_router();

    let register = json!({
        "id": "w1",
        "name": "Worker One",
        "vehicle_model": "Toyota Camry",
        "vehicle_plate": "A123BC",
    });
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/workers", register.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 重复注册冲突
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/workers", register))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let join = json!({ "worker_id": "w1" });
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/queue/join", join.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 重复入队冲突
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/queue/join", join))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(get_request("/api/queue"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // 退出队列幂等
    let leave = json!({ "worker_id": "w1" });
    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/queue/leave", leave.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = router
        .oneshot(json_request("POST", "/api/queue/leave", leave))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn join_queue_with_unknown_worker_returns_not_found() {
    let router = test_router();
    let response = router
        .oneshot(json_request(
            "POST",
            "/api/queue/join",
            json!({ "worker_id": "ghost" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_order_with_empty_payload_is_rejected() {
    let router = test_router();
    let response = router
        .oneshot(json_request(
            "POST",
            "/api/orders",
            json!({ "origin_ref": "origin-1", "payload": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_order_without_workers_still_succeeds() {
    // 空队列的订单立即转为exhausted，但提交本身不是错误
    let router = test_router();
    let response = router
        .oneshot(json_request(
            "POST",
            "/api/orders",
            json!({ "order_id": "order-1", "origin_ref": "origin-1", "payload": "pickup" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn get_missing_order_returns_not_found() {
    let router = test_router();
    let response = router
        .oneshot(get_request("/api/orders/ghost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accept_on_missing_order_returns_not_found() {
    let router = test_router();
    let response = router
        .oneshot(json_request(
            "POST",
            "/api/orders/ghost/accept",
            json!({ "worker_id": "w1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
