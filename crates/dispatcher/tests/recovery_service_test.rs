use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use courier_domain::entities::OrderStatus;
use courier_testing_utils::{
    MockNotifier, MockOrderRepository, MockQueueRepository, MockWorkerRepository, OrderBuilder,
    WorkerBuilder,
};

use courier_dispatcher::{
    AvailabilityQueue, CoordinatorConfig, DeadlineExpiry, DeadlineScheduler, DispatchCoordinator,
    OfferRecoveryService, OrderLedger, OrderLedgerService, WorkerQueueService,
};

struct RecoveryHarness {
    recovery: OfferRecoveryService,
    coordinator: Arc<DispatchCoordinator>,
    ledger: Arc<dyn OrderLedger>,
    queue: Arc<dyn AvailabilityQueue>,
    deadlines: Arc<DeadlineScheduler>,
    expiry_rx: mpsc::UnboundedReceiver<DeadlineExpiry>,
}

fn harness(
    seeded_orders: Vec<courier_domain::entities::Order>,
    registered_workers: &[&str],
) -> RecoveryHarness {
    let workers = registered_workers
        .iter()
        .map(|id| WorkerBuilder::new().with_id(id).build())
        .collect();
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(workers));
    let queue_repo = Arc::new(MockQueueRepository::new());
    let order_repo = Arc::new(MockOrderRepository::with_orders(seeded_orders));
    let notifier = Arc::new(MockNotifier::new());

    let queue: Arc<dyn AvailabilityQueue> = Arc::new(WorkerQueueService::new(
        worker_repo.clone(),
        queue_repo.clone(),
    ));
    let ledger: Arc<dyn OrderLedger> = Arc::new(OrderLedgerService::new(order_repo.clone()));
    let (deadlines, expiry_rx) = DeadlineScheduler::new();
    let deadlines = Arc::new(deadlines);

    let coordinator = Arc::new(DispatchCoordinator::new(
        queue.clone(),
        ledger.clone(),
        worker_repo,
        notifier,
        deadlines.clone(),
        Some(CoordinatorConfig {
            offer_timeout: Duration::from_secs(30),
        }),
    ));
    let recovery = OfferRecoveryService::new(order_repo, coordinator.clone());

    RecoveryHarness {
        recovery,
        coordinator,
        ledger,
        queue,
        deadlines,
        expiry_rx,
    }
}

#[tokio::test(start_paused = true)]
async fn recovery_rearms_pending_offer() {
    // 重启前的派发：订单挂在w1名下，旧令牌指向已不存在的定时器
    let seeded = OrderBuilder::new()
        .with_id("order-1")
        .assigned_to("w1")
        .with_deadline_token(999)
        .build();
    let mut h = harness(vec![seeded], &["w1"]);

    let report = h.recovery.recover().await.unwrap();
    assert_eq!(report.rearmed_offers, 1);
    assert_eq!(report.redispatched_orders, 0);
    assert!(report.errors.is_empty());
    assert_eq!(h.deadlines.armed_count().await, 1);

    let order = h.ledger.get("order-1").await.unwrap().unwrap();
    let fresh_token = order.deadline_token.unwrap();
    assert_ne!(fresh_token, 999);

    // 重新装配的截止时间照常走超时路径
    tokio::time::advance(Duration::from_secs(31)).await;
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
    let expiry = h.expiry_rx.try_recv().unwrap();
    assert_eq!(expiry.token, fresh_token);
    h.coordinator.handle_deadline(&expiry).await.unwrap();

    let order = h.ledger.get("order-1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Exhausted);
}

#[tokio::test(start_paused = true)]
async fn recovery_redispatches_unassigned_order() {
    let seeded = OrderBuilder::new().with_id("order-1").build();
    let h = harness(vec![seeded], &["w1"]);
    h.queue.enqueue("w1").await.unwrap();

    let report = h.recovery.recover().await.unwrap();
    assert_eq!(report.rearmed_offers, 0);
    assert_eq!(report.redispatched_orders, 1);

    let order = h.ledger.get("order-1").await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.assignee.as_deref(), Some("w1"));
    assert_eq!(h.deadlines.armed_count().await, 1);
}

#[tokio::test]
async fn recovery_ignores_terminal_orders() {
    let seeded = vec![
        OrderBuilder::new()
            .with_id("order-1")
            .assigned_to("w1")
            .accepted()
            .build(),
        OrderBuilder::new().with_id("order-2").exhausted().build(),
    ];
    let h = harness(seeded, &[]);

    let report = h.recovery.recover().await.unwrap();
    assert_eq!(report.rearmed_offers, 0);
    assert_eq!(report.redispatched_orders, 0);
    assert_eq!(h.deadlines.armed_count().await, 0);
}
