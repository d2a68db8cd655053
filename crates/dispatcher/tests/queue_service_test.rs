use std::sync::Arc;

use courier_core::DispatchError;
use courier_domain::entities::WorkerStatus;
use courier_domain::repositories::WorkerRepository;
use courier_testing_utils::{MockQueueRepository, MockWorkerRepository, WorkerBuilder};

use courier_dispatcher::queue_service::{AvailabilityQueue, WorkerQueueService};

fn service_with_workers(
    ids: &[&str],
) -> (
    WorkerQueueService,
    Arc<MockWorkerRepository>,
    Arc<MockQueueRepository>,
) {
    let workers = ids
        .iter()
        .map(|id| WorkerBuilder::new().with_id(id).build())
        .collect();
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(workers));
    let queue_repo = Arc::new(MockQueueRepository::new());
    let service = WorkerQueueService::new(worker_repo.clone(), queue_repo.clone());
    (service, worker_repo, queue_repo)
}

#[tokio::test]
async fn enqueue_assigns_contiguous_positions() {
    let (service, worker_repo, _) = service_with_workers(&["w1", "w2", "w3"]);

    assert_eq!(service.enqueue("w1").await.unwrap().position, 1);
    assert_eq!(service.enqueue("w2").await.unwrap().position, 2);
    assert_eq!(service.enqueue("w3").await.unwrap().position, 3);

    for id in ["w1", "w2", "w3"] {
        let worker = worker_repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(worker.status, WorkerStatus::Available);
    }
}

#[tokio::test]
async fn enqueue_unknown_worker_fails() {
    let (service, _, _) = service_with_workers(&[]);

    let result = service.enqueue("ghost").await;
    assert!(matches!(result, Err(DispatchError::UnknownWorker { .. })));
}

#[tokio::test]
async fn enqueue_engaged_worker_is_refused() {
    let worker_repo = Arc::new(MockWorkerRepository::with_workers(vec![WorkerBuilder::new()
        .with_id("w1")
        .engaged()
        .build()]));
    let queue_repo = Arc::new(MockQueueRepository::new());
    let service = WorkerQueueService::new(worker_repo, queue_repo);

    let result = service.enqueue("w1").await;
    assert!(matches!(result, Err(DispatchError::UnknownWorker { .. })));
}

#[tokio::test]
async fn enqueue_twice_fails_with_already_queued() {
    let (service, _, _) = service_with_workers(&["w1"]);

    service.enqueue("w1").await.unwrap();
    let result = service.enqueue("w1").await;
    assert!(matches!(result, Err(DispatchError::AlreadyQueued { .. })));

    // 失败的入队不能破坏已有条目
    assert_eq!(service.snapshot().await.unwrap().len(), 1);
}

#[tokio::test]
async fn dequeue_head_returns_minimal_position_without_mutating() {
    let (service, _, queue_repo) = service_with_workers(&["w1", "w2"]);
    service.enqueue("w1").await.unwrap();
    service.enqueue("w2").await.unwrap();

    let first = service.dequeue_head().await.unwrap().unwrap();
    let second = service.dequeue_head().await.unwrap().unwrap();
    assert_eq!(first.worker_id, "w1");
    assert_eq!(first, second);
    assert_eq!(queue_repo.count(), 2);
}

#[tokio::test]
async fn dequeue_head_on_empty_queue_returns_none() {
    let (service, _, _) = service_with_workers(&[]);
    assert!(service.dequeue_head().await.unwrap().is_none());
}

#[tokio::test]
async fn remove_renumbers_remaining_entries() {
    let (service, worker_repo, _) = service_with_workers(&["w1", "w2", "w3"]);
    for id in ["w1", "w2", "w3"] {
        service.enqueue(id).await.unwrap();
    }

    service.remove("w2").await.unwrap();

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].worker_id, "w1");
    assert_eq!(snapshot[0].position, 1);
    assert_eq!(snapshot[1].worker_id, "w3");
    assert_eq!(snapshot[1].position, 2);

    let removed = worker_repo.get_by_id("w2").await.unwrap().unwrap();
    assert_eq!(removed.status, WorkerStatus::Inactive);
}

#[tokio::test]
async fn remove_absent_worker_is_a_noop() {
    let (service, _, _) = service_with_workers(&["w1"]);
    service.enqueue("w1").await.unwrap();

    service.remove("w2").await.unwrap();
    assert_eq!(service.snapshot().await.unwrap().len(), 1);
}

#[tokio::test]
async fn enqueue_head_remove_round_trip() {
    let (service, _, _) = service_with_workers(&["w1", "w2"]);
    service.enqueue("w1").await.unwrap();
    service.enqueue("w2").await.unwrap();

    let head = service.dequeue_head().await.unwrap().unwrap();
    assert_eq!(head.worker_id, "w1");

    service.remove("w1").await.unwrap();

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].worker_id, "w2");
    assert_eq!(snapshot[0].position, 1);
}

#[tokio::test]
async fn positions_stay_contiguous_after_mixed_operations() {
    let ids = ["w1", "w2", "w3", "w4", "w5"];
    let (service, _, _) = service_with_workers(&ids);

    for id in ids {
        service.enqueue(id).await.unwrap();
    }
    service.remove("w1").await.unwrap();
    service.remove("w4").await.unwrap();
    service.enqueue("w1").await.unwrap();
    service.remove("w3").await.unwrap();

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 3);
    for (index, entry) in snapshot.iter().enumerate() {
        assert_eq!(entry.position, (index + 1) as i64);
    }
    // 位置顺序必须与入队时间顺序一致
    for pair in snapshot.windows(2) {
        assert!(pair[0].joined_at <= pair[1].joined_at);
    }
    // 重新入队的w1排在仍在队中的w2、w5之后
    assert_eq!(snapshot[2].worker_id, "w1");
}

#[tokio::test]
async fn no_worker_appears_twice() {
    let (service, _, _) = service_with_workers(&["w1", "w2"]);
    service.enqueue("w1").await.unwrap();
    service.enqueue("w2").await.unwrap();
    let _ = service.enqueue("w1").await;

    let snapshot = service.snapshot().await.unwrap();
    let mut ids: Vec<&str> = snapshot.iter().map(|e| e.worker_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), snapshot.len());
}

#[tokio::test]
async fn position_of_reports_current_position() {
    let (service, _, _) = service_with_workers(&["w1", "w2"]);
    service.enqueue("w1").await.unwrap();
    service.enqueue("w2").await.unwrap();

    assert_eq!(service.position_of("w2").await.unwrap(), Some(2));
    service.remove("w1").await.unwrap();
    assert_eq!(service.position_of("w2").await.unwrap(), Some(1));
    assert_eq!(service.position_of("w1").await.unwrap(), None);
}

#[tokio::test]
async fn reconcile_trusts_membership_over_status() {
    let (service, worker_repo, _) = service_with_workers(&["w1", "w2"]);
    service.enqueue("w1").await.unwrap();

    // 外部直接改写状态字段，队列成员关系不变
    worker_repo
        .update_status("w1", WorkerStatus::Inactive)
        .await
        .unwrap();
    assert!(service.reconcile("w1").await.unwrap());
    let fixed = worker_repo.get_by_id("w1").await.unwrap().unwrap();
    assert_eq!(fixed.status, WorkerStatus::Available);

    // 不在队列却标记可用的也要被修复
    worker_repo
        .update_status("w2", WorkerStatus::Available)
        .await
        .unwrap();
    assert!(!service.reconcile("w2").await.unwrap());
    let fixed = worker_repo.get_by_id("w2").await.unwrap().unwrap();
    assert_eq!(fixed.status, WorkerStatus::Inactive);
}

#[tokio::test]
async fn reconcile_leaves_engaged_worker_alone() {
    let (service, worker_repo, _) = service_with_workers(&["w1"]);
    worker_repo
        .update_status("w1", WorkerStatus::Engaged)
        .await
        .unwrap();

    assert!(!service.reconcile("w1").await.unwrap());
    let worker = worker_repo.get_by_id("w1").await.unwrap().unwrap();
    assert_eq!(worker.status, WorkerStatus::Engaged);
}

#[tokio::test]
async fn reconcile_unknown_worker_fails() {
    let (service, _, _) = service_with_workers(&[]);
    let result = service.reconcile("ghost").await;
    assert!(matches!(result, Err(DispatchError::UnknownWorker { .. })));
}

#[tokio::test]
async fn reset_clears_queue_and_deactivates_workers() {
    let (service, worker_repo, _) = service_with_workers(&["w1", "w2"]);
    service.enqueue("w1").await.unwrap();
    service.enqueue("w2").await.unwrap();

    let cleared = service.reset().await.unwrap();
    assert_eq!(cleared, 2);
    assert!(service.snapshot().await.unwrap().is_empty());
    for id in ["w1", "w2"] {
        let worker = worker_repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(worker.status, WorkerStatus::Inactive);
    }
}
