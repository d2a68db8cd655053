//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，存储技术由infrastructure层选择

use async_trait::async_trait;

use crate::entities::{Order, QueueEntry, Worker, WorkerStatus};
use courier_core::DispatchResult;

/// Worker注册表仓储抽象
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    async fn register(&self, worker: &Worker) -> DispatchResult<()>;
    async fn get_by_id(&self, worker_id: &str) -> DispatchResult<Option<Worker>>;
    async fn get_all(&self) -> DispatchResult<Vec<Worker>>;
    async fn update_status(&self, worker_id: &str, status: WorkerStatus) -> DispatchResult<()>;
    async fn unregister(&self, worker_id: &str) -> DispatchResult<bool>;
}

/// 可用性队列仓储抽象
///
/// 只负责存取，不维护位置不变量；不变量由队列服务在锁内保证。
#[async_trait]
pub trait QueueRepository: Send + Sync {
    async fn insert(&self, entry: &QueueEntry) -> DispatchResult<()>;
    async fn get_by_worker_id(&self, worker_id: &str) -> DispatchResult<Option<QueueEntry>>;
    /// 按position升序返回全部条目
    async fn get_all_ordered(&self) -> DispatchResult<Vec<QueueEntry>>;
    async fn set_position(&self, worker_id: &str, position: i64) -> DispatchResult<()>;
    async fn delete(&self, worker_id: &str) -> DispatchResult<bool>;
    async fn clear(&self) -> DispatchResult<u64>;
}

/// 订单仓储抽象
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order) -> DispatchResult<()>;
    async fn get_by_id(&self, order_id: &str) -> DispatchResult<Option<Order>>;
    async fn update(&self, order: &Order) -> DispatchResult<()>;
    /// 所有未结束的订单，按创建时间升序
    async fn get_pending(&self) -> DispatchResult<Vec<Order>>;
}
