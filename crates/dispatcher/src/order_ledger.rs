use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::{Order, OrderStatus};
use courier_domain::repositories::OrderRepository;

/// 订单台账服务接口
///
/// 订单记录只能经由这些原子操作变更，任何调用方都不得直接改写字段。
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// 登记新订单；同一标识的未结束订单会触发DuplicateOrder
    async fn open(&self, order_id: &str, origin_ref: &str, payload: &str) -> DispatchResult<Order>;

    /// 把pending订单派发给一个Worker并记入派发历史
    async fn assign(&self, order_id: &str, worker_id: &str) -> DispatchResult<Order>;

    /// 原子检查并接单：仅当订单pending且当前派发对象是该Worker时成功
    ///
    /// 接单与超时竞争的唯一裁决点。
    async fn try_accept(&self, order_id: &str, worker_id: &str) -> DispatchResult<Order>;

    /// 候选Worker耗尽，订单转入终态exhausted
    async fn exhaust(&self, order_id: &str) -> DispatchResult<Order>;

    /// 记录或清除当前装配的截止时间令牌
    async fn record_deadline(&self, order_id: &str, token: Option<i64>) -> DispatchResult<()>;

    async fn get(&self, order_id: &str) -> DispatchResult<Option<Order>>;
}

/// 基于仓储的订单台账实现，全部变更串行化在一把台账锁之后
pub struct OrderLedgerService {
    order_repo: Arc<dyn OrderRepository>,
    lock: Mutex<()>,
}

impl OrderLedgerService {
    pub fn new(order_repo: Arc<dyn OrderRepository>) -> Self {
        Self {
            order_repo,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self, order_id: &str) -> DispatchResult<Order> {
        self.order_repo
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| DispatchError::order_not_found(order_id))
    }
}

#[async_trait]
impl OrderLedger for OrderLedgerService {
    async fn open(&self, order_id: &str, origin_ref: &str, payload: &str) -> DispatchResult<Order> {
        let _guard = self.lock.lock().await;

        match self.order_repo.get_by_id(order_id).await? {
            Some(existing) if !existing.is_terminal() => {
                return Err(DispatchError::DuplicateOrder {
                    id: order_id.to_string(),
                });
            }
            Some(_) => {
                // 同一标识的终态记录被全新的pending订单替换
                let order = Order::new(order_id, origin_ref, payload);
                self.order_repo.update(&order).await?;
                info!("订单 {} 重新登记（旧记录已结束）", order_id);
                return Ok(order);
            }
            None => {}
        }

        let order = Order::new(order_id, origin_ref, payload);
        self.order_repo.create(&order).await?;
        info!("订单 {} 已登记，来源 {}", order_id, origin_ref);
        Ok(order)
    }

    async fn assign(&self, order_id: &str, worker_id: &str) -> DispatchResult<Order> {
        let _guard = self.lock.lock().await;

        let mut order = self.load(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(DispatchError::InvalidOrderState {
                order_id: order_id.to_string(),
                status: order.status.to_string(),
            });
        }
        if order.was_offered_to(worker_id) {
            return Err(DispatchError::AlreadyOffered {
                order_id: order_id.to_string(),
                worker_id: worker_id.to_string(),
            });
        }

        order.assignee = Some(worker_id.to_string());
        order.offered.push(worker_id.to_string());
        order.updated_at = Utc::now();
        self.order_repo.update(&order).await?;

        debug!(
            "订单 {} 派发给Worker {}（第 {} 次派发）",
            order_id,
            worker_id,
            order.offered.len()
        );
        Ok(order)
    }

    async fn try_accept(&self, order_id: &str, worker_id: &str) -> DispatchResult<Order> {
        let _guard = self.lock.lock().await;

        let mut order = self.load(order_id).await?;
        let accepting_assignee =
            order.status == OrderStatus::Pending && order.assignee.as_deref() == Some(worker_id);
        if !accepting_assignee {
            debug!(
                "Worker {} 对订单 {} 的接单确认已失效（状态 {}，当前派发 {:?}）",
                worker_id, order_id, order.status, order.assignee
            );
            return Err(DispatchError::StaleAcceptance {
                order_id: order_id.to_string(),
            });
        }

        order.status = OrderStatus::Accepted;
        order.updated_at = Utc::now();
        self.order_repo.update(&order).await?;

        info!("订单 {} 已被Worker {} 接受", order_id, worker_id);
        Ok(order)
    }

    async fn exhaust(&self, order_id: &str) -> DispatchResult<Order> {
        let _guard = self.lock.lock().await;

        let mut order = self.load(order_id).await?;
        if order.status != OrderStatus::Pending {
            return Err(DispatchError::InvalidOrderState {
                order_id: order_id.to_string(),
                status: order.status.to_string(),
            });
        }

        order.status = OrderStatus::Exhausted;
        order.assignee = None;
        order.deadline_token = None;
        order.updated_at = Utc::now();
        self.order_repo.update(&order).await?;

        info!("订单 {} 候选耗尽，已转入exhausted", order_id);
        Ok(order)
    }

    async fn record_deadline(&self, order_id: &str, token: Option<i64>) -> DispatchResult<()> {
        let _guard = self.lock.lock().await;

        let mut order = self.load(order_id).await?;
        order.deadline_token = token;
        order.updated_at = Utc::now();
        self.order_repo.update(&order).await
    }

    async fn get(&self, order_id: &str) -> DispatchResult<Option<Order>> {
        self.order_repo.get_by_id(order_id).await
    }
}
