//! Mock implementations for the repository and notifier traits
//!
//! In-memory stand-ins that mirror the behavior of the SQLite-backed
//! implementations (unique-key violations, row-count based results) so
//! services can be exercised without external dependencies.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::{Order, OrderStatus, QueueEntry, Worker, WorkerStatus};
use courier_domain::ports::{MessageHandle, Notifier, WorkerAction};
use courier_domain::repositories::{OrderRepository, QueueRepository, WorkerRepository};

/// Mock implementation of WorkerRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockWorkerRepository {
    workers: Arc<Mutex<HashMap<String, Worker>>>,
}

impl MockWorkerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workers(workers: Vec<Worker>) -> Self {
        let map = workers.into_iter().map(|w| (w.id.clone(), w)).collect();
        Self {
            workers: Arc::new(Mutex::new(map)),
        }
    }

    pub fn count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.workers.lock().unwrap().clear();
    }
}

#[async_trait]
impl WorkerRepository for MockWorkerRepository {
    async fn register(&self, worker: &Worker) -> DispatchResult<()> {
        // The SQLite implementation upserts on conflict
        self.workers
            .lock()
            .unwrap()
            .insert(worker.id.clone(), worker.clone());
        Ok(())
    }

    async fn get_by_id(&self, worker_id: &str) -> DispatchResult<Option<Worker>> {
        Ok(self.workers.lock().unwrap().get(worker_id).cloned())
    }

    async fn get_all(&self) -> DispatchResult<Vec<Worker>> {
        let mut workers: Vec<Worker> = self.workers.lock().unwrap().values().cloned().collect();
        workers.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(workers)
    }

    async fn update_status(&self, worker_id: &str, status: WorkerStatus) -> DispatchResult<()> {
        let mut workers = self.workers.lock().unwrap();
        let worker = workers
            .get_mut(worker_id)
            .ok_or_else(|| DispatchError::unknown_worker(worker_id))?;
        worker.status = status;
        Ok(())
    }

    async fn unregister(&self, worker_id: &str) -> DispatchResult<bool> {
        Ok(self.workers.lock().unwrap().remove(worker_id).is_some())
    }
}

/// Mock implementation of QueueRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockQueueRepository {
    entries: Arc<Mutex<HashMap<String, QueueEntry>>>,
}

impl MockQueueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl QueueRepository for MockQueueRepository {
    async fn insert(&self, entry: &QueueEntry) -> DispatchResult<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(&entry.worker_id) {
            // Mirrors the primary-key violation the SQLite store would raise
            return Err(DispatchError::DatabaseOperation(format!(
                "UNIQUE constraint failed: queue_entries.worker_id ({})",
                entry.worker_id
            )));
        }
        entries.insert(entry.worker_id.clone(), entry.clone());
        Ok(())
    }

    async fn get_by_worker_id(&self, worker_id: &str) -> DispatchResult<Option<QueueEntry>> {
        Ok(self.entries.lock().unwrap().get(worker_id).cloned())
    }

    async fn get_all_ordered(&self) -> DispatchResult<Vec<QueueEntry>> {
        let mut entries: Vec<QueueEntry> =
            self.entries.lock().unwrap().values().cloned().collect();
        entries.sort_by(|a, b| a.position.cmp(&b.position));
        Ok(entries)
    }

    async fn set_position(&self, worker_id: &str, position: i64) -> DispatchResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(worker_id).ok_or_else(|| {
            DispatchError::DatabaseOperation(format!("queue entry not found: {worker_id}"))
        })?;
        entry.position = position;
        Ok(())
    }

    async fn delete(&self, worker_id: &str) -> DispatchResult<bool> {
        Ok(self.entries.lock().unwrap().remove(worker_id).is_some())
    }

    async fn clear(&self) -> DispatchResult<u64> {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len() as u64;
        entries.clear();
        Ok(count)
    }
}

/// Mock implementation of OrderRepository for testing
#[derive(Debug, Clone, Default)]
pub struct MockOrderRepository {
    orders: Arc<Mutex<HashMap<String, Order>>>,
}

impl MockOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: Vec<Order>) -> Self {
        let map = orders.into_iter().map(|o| (o.id.clone(), o)).collect();
        Self {
            orders: Arc::new(Mutex::new(map)),
        }
    }

    pub fn count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl OrderRepository for MockOrderRepository {
    async fn create(&self, order: &Order) -> DispatchResult<()> {
        let mut orders = self.orders.lock().unwrap();
        if orders.contains_key(&order.id) {
            return Err(DispatchError::DatabaseOperation(format!(
                "UNIQUE constraint failed: orders.id ({})",
                order.id
            )));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_by_id(&self, order_id: &str) -> DispatchResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(order_id).cloned())
    }

    async fn update(&self, order: &Order) -> DispatchResult<()> {
        let mut orders = self.orders.lock().unwrap();
        if !orders.contains_key(&order.id) {
            return Err(DispatchError::order_not_found(&order.id));
        }
        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get_pending(&self) -> DispatchResult<Vec<Order>> {
        let mut pending: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.status == OrderStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }
}

/// A worker notification captured by the mock notifier
#[derive(Debug, Clone, PartialEq)]
pub struct SentWorkerMessage {
    pub worker_id: String,
    pub content: String,
    pub actions: Vec<WorkerAction>,
}

/// An origin notification captured by the mock notifier
#[derive(Debug, Clone, PartialEq)]
pub struct SentOriginMessage {
    pub origin_ref: String,
    pub content: String,
}

/// Recording mock for the Notifier port
///
/// Workers marked unreachable make `notify_worker` fail with
/// `NotificationFailed`, which lets tests drive the skip-and-cascade path.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    worker_messages: Arc<Mutex<Vec<SentWorkerMessage>>>,
    origin_messages: Arc<Mutex<Vec<SentOriginMessage>>>,
    unreachable_workers: Arc<Mutex<HashSet<String>>>,
    next_message_id: Arc<Mutex<i64>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, worker_id: &str) {
        self.unreachable_workers
            .lock()
            .unwrap()
            .insert(worker_id.to_string());
    }

    pub fn set_reachable(&self, worker_id: &str) {
        self.unreachable_workers.lock().unwrap().remove(worker_id);
    }

    pub fn worker_messages(&self) -> Vec<SentWorkerMessage> {
        self.worker_messages.lock().unwrap().clone()
    }

    pub fn origin_messages(&self) -> Vec<SentOriginMessage> {
        self.origin_messages.lock().unwrap().clone()
    }

    pub fn messages_to(&self, worker_id: &str) -> Vec<SentWorkerMessage> {
        self.worker_messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.worker_id == worker_id)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.worker_messages.lock().unwrap().clear();
        self.origin_messages.lock().unwrap().clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify_worker(
        &self,
        worker_id: &str,
        content: &str,
        actions: &[WorkerAction],
    ) -> DispatchResult<MessageHandle> {
        if self.unreachable_workers.lock().unwrap().contains(worker_id) {
            return Err(DispatchError::notification_failed(format!(
                "worker {worker_id} unreachable"
            )));
        }

        self.worker_messages.lock().unwrap().push(SentWorkerMessage {
            worker_id: worker_id.to_string(),
            content: content.to_string(),
            actions: actions.to_vec(),
        });

        let mut next_id = self.next_message_id.lock().unwrap();
        *next_id += 1;
        Ok(MessageHandle {
            id: format!("msg-{next_id}"),
        })
    }

    async fn notify_origin(&self, origin_ref: &str, content: &str) -> DispatchResult<()> {
        self.origin_messages.lock().unwrap().push(SentOriginMessage {
            origin_ref: origin_ref.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }
}
