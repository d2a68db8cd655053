use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::{QueueEntry, WorkerStatus};
use courier_domain::repositories::{QueueRepository, WorkerRepository};

/// 可用性队列服务接口
#[async_trait]
pub trait AvailabilityQueue: Send + Sync {
    /// 将Worker追加到队尾并标记为可用
    async fn enqueue(&self, worker_id: &str) -> DispatchResult<QueueEntry>;

    /// 返回位置最小的条目，不产生任何变更
    async fn dequeue_head(&self) -> DispatchResult<Option<QueueEntry>>;

    /// 将Worker移出队列；幂等，不在队列中时静默成功
    ///
    /// 返回本次调用是否真正删除了条目，级联用它判断候选是否已被
    /// 并发派发抢走。
    async fn remove(&self, worker_id: &str) -> DispatchResult<bool>;

    /// 按joined_at升序重新编号为1..N
    async fn reorder(&self) -> DispatchResult<()>;

    /// 当前1起始的队列位置
    async fn position_of(&self, worker_id: &str) -> DispatchResult<Option<i64>>;

    /// 读取时修复：以队列成员关系为准校正status字段，返回成员关系
    async fn reconcile(&self, worker_id: &str) -> DispatchResult<bool>;

    /// 按位置升序的完整队列视图
    async fn snapshot(&self) -> DispatchResult<Vec<QueueEntry>>;

    /// 清空队列并将所有可用Worker置为inactive，返回清除的条目数
    async fn reset(&self) -> DispatchResult<u64>;
}

/// 基于仓储的可用性队列实现
///
/// 队列成员关系是Worker可用性的唯一事实来源；status字段只是派生
/// 视图，外部直接改动造成的分歧由reconcile在读取时修复。所有变更
/// 串行化在一把队列锁之后。
pub struct WorkerQueueService {
    worker_repo: Arc<dyn WorkerRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    lock: Mutex<()>,
}

impl WorkerQueueService {
    pub fn new(worker_repo: Arc<dyn WorkerRepository>, queue_repo: Arc<dyn QueueRepository>) -> Self {
        Self {
            worker_repo,
            queue_repo,
            lock: Mutex::new(()),
        }
    }

    /// 持有队列锁的前提下重新编号
    ///
    /// 单独成方法是为了让批量移除只在最后重排一次。
    async fn reorder_locked(&self) -> DispatchResult<()> {
        let mut entries = self.queue_repo.get_all_ordered().await?;
        entries.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.position.cmp(&b.position))
        });

        for (index, entry) in entries.iter().enumerate() {
            let expected = (index + 1) as i64;
            if entry.position != expected {
                self.queue_repo
                    .set_position(&entry.worker_id, expected)
                    .await?;
            }
        }

        debug!("队列位置重排完成，共 {} 个条目", entries.len());
        Ok(())
    }
}

#[async_trait]
impl AvailabilityQueue for WorkerQueueService {
    async fn enqueue(&self, worker_id: &str) -> DispatchResult<QueueEntry> {
        let _guard = self.lock.lock().await;

        let worker = self
            .worker_repo
            .get_by_id(worker_id)
            .await?
            .ok_or_else(|| DispatchError::unknown_worker(worker_id))?;

        // 被订单占用的Worker不具备入队资格
        if worker.status == WorkerStatus::Engaged {
            return Err(DispatchError::unknown_worker(worker_id));
        }

        if self.queue_repo.get_by_worker_id(worker_id).await?.is_some() {
            return Err(DispatchError::AlreadyQueued {
                id: worker_id.to_string(),
            });
        }

        let position = self
            .queue_repo
            .get_all_ordered()
            .await?
            .last()
            .map(|entry| entry.position)
            .unwrap_or(0)
            + 1;

        let entry = QueueEntry {
            worker_id: worker_id.to_string(),
            position,
            joined_at: Utc::now(),
        };
        self.queue_repo.insert(&entry).await?;
        self.worker_repo
            .update_status(worker_id, WorkerStatus::Available)
            .await?;

        info!("Worker {} 加入队列，位置 {}", worker_id, position);
        Ok(entry)
    }

    async fn dequeue_head(&self) -> DispatchResult<Option<QueueEntry>> {
        let entries = self.queue_repo.get_all_ordered().await?;
        Ok(entries.into_iter().next())
    }

    async fn remove(&self, worker_id: &str) -> DispatchResult<bool> {
        let _guard = self.lock.lock().await;

        let deleted = self.queue_repo.delete(worker_id).await?;
        if !deleted {
            debug!("Worker {} 不在队列中，移除操作跳过", worker_id);
            return Ok(false);
        }

        self.worker_repo
            .update_status(worker_id, WorkerStatus::Inactive)
            .await?;
        self.reorder_locked().await?;

        info!("Worker {} 已移出队列", worker_id);
        Ok(true)
    }

    async fn reorder(&self) -> DispatchResult<()> {
        let _guard = self.lock.lock().await;
        self.reorder_locked().await
    }

    async fn position_of(&self, worker_id: &str) -> DispatchResult<Option<i64>> {
        let entry = self.queue_repo.get_by_worker_id(worker_id).await?;
        Ok(entry.map(|e| e.position))
    }

    async fn reconcile(&self, worker_id: &str) -> DispatchResult<bool> {
        let _guard = self.lock.lock().await;

        let worker = self
            .worker_repo
            .get_by_id(worker_id)
            .await?
            .ok_or_else(|| DispatchError::unknown_worker(worker_id))?;
        let in_queue = self.queue_repo.get_by_worker_id(worker_id).await?.is_some();

        // status字段不可信，以成员关系为准修复；Engaged属于派发中的
        // 合法离队状态，不在此处触碰
        if in_queue && worker.status != WorkerStatus::Available {
            warn!(
                "Worker {} 在队列中但状态为 {}，已校正为AVAILABLE",
                worker_id, worker.status
            );
            self.worker_repo
                .update_status(worker_id, WorkerStatus::Available)
                .await?;
        } else if !in_queue && worker.status == WorkerStatus::Available {
            warn!(
                "Worker {} 不在队列中但状态为AVAILABLE，已校正为INACTIVE",
                worker_id
            );
            self.worker_repo
                .update_status(worker_id, WorkerStatus::Inactive)
                .await?;
        }

        Ok(in_queue)
    }

    async fn snapshot(&self) -> DispatchResult<Vec<QueueEntry>> {
        self.queue_repo.get_all_ordered().await
    }

    async fn reset(&self) -> DispatchResult<u64> {
        let _guard = self.lock.lock().await;

        let cleared = self.queue_repo.clear().await?;
        for worker in self.worker_repo.get_all().await? {
            if worker.status == WorkerStatus::Available {
                self.worker_repo
                    .update_status(&worker.id, WorkerStatus::Inactive)
                    .await?;
            }
        }

        info!("队列已重置，清除 {} 个条目", cleared);
        Ok(cleared)
    }
}
