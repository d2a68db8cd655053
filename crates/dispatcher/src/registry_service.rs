use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::Worker;
use courier_domain::repositories::WorkerRepository;

use crate::queue_service::AvailabilityQueue;

/// Worker档案：注册信息加上经过校准的队列位置
#[derive(Debug, Clone, Serialize)]
pub struct WorkerProfile {
    pub worker: Worker,
    pub in_queue: bool,
    pub queue_position: Option<i64>,
}

/// Worker注册与管理服务
pub struct WorkerRegistryService {
    worker_repo: Arc<dyn WorkerRepository>,
    queue: Arc<dyn AvailabilityQueue>,
}

impl WorkerRegistryService {
    pub fn new(worker_repo: Arc<dyn WorkerRepository>, queue: Arc<dyn AvailabilityQueue>) -> Self {
        Self { worker_repo, queue }
    }

    /// 登记新Worker，初始状态为inactive
    pub async fn register(
        &self,
        id: &str,
        name: &str,
        vehicle_model: &str,
        vehicle_plate: &str,
    ) -> DispatchResult<Worker> {
        if self.worker_repo.get_by_id(id).await?.is_some() {
            return Err(DispatchError::WorkerAlreadyRegistered { id: id.to_string() });
        }

        let worker = Worker::new(id, name, vehicle_model, vehicle_plate);
        self.worker_repo.register(&worker).await?;

        info!("Worker {} 注册成功", id);
        Ok(worker)
    }

    /// 查看档案；队列位置先经过reconcile校准再读取
    pub async fn profile(&self, worker_id: &str) -> DispatchResult<WorkerProfile> {
        let in_queue = self.queue.reconcile(worker_id).await?;
        let worker = self
            .worker_repo
            .get_by_id(worker_id)
            .await?
            .ok_or_else(|| DispatchError::unknown_worker(worker_id))?;
        let queue_position = if in_queue {
            self.queue.position_of(worker_id).await?
        } else {
            None
        };

        Ok(WorkerProfile {
            worker,
            in_queue,
            queue_position,
        })
    }

    pub async fn list(&self) -> DispatchResult<Vec<Worker>> {
        self.worker_repo.get_all().await
    }

    /// 管理员删除Worker：先移出队列再注销
    ///
    /// 删除只影响后续派发资格，在途订单的接单或超时仍可正常结清。
    pub async fn remove(&self, worker_id: &str) -> DispatchResult<()> {
        self.queue.remove(worker_id).await?;
        let removed = self.worker_repo.unregister(worker_id).await?;
        if !removed {
            return Err(DispatchError::unknown_worker(worker_id));
        }

        info!("Worker {} 已删除", worker_id);
        Ok(())
    }
}
