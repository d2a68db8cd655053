use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use courier_core::{DispatchError, DispatchResult};
use courier_domain::entities::{Order, OrderStatus, WorkerStatus};
use courier_domain::ports::{Notifier, WorkerAction};
use courier_domain::repositories::WorkerRepository;

use crate::deadline::{DeadlineExpiry, DeadlineScheduler};
use crate::order_ledger::OrderLedger;
use crate::queue_service::AvailabilityQueue;

/// 派发协调器配置
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// 每次派发后等待Worker接单的时限
    pub offer_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            offer_timeout: Duration::from_secs(30),
        }
    }
}

/// 订单派发协调器
///
/// 订单状态机 pending(assignee) → accepted | exhausted 的唯一驱动方。
/// 自身不持有持久状态：读写队列与台账，装配/取消截止时间，并把结果
/// 通知给Worker与订单来源。
pub struct DispatchCoordinator {
    queue: Arc<dyn AvailabilityQueue>,
    ledger: Arc<dyn OrderLedger>,
    worker_repo: Arc<dyn WorkerRepository>,
    notifier: Arc<dyn Notifier>,
    deadlines: Arc<DeadlineScheduler>,
    config: CoordinatorConfig,
}

impl DispatchCoordinator {
    pub fn new(
        queue: Arc<dyn AvailabilityQueue>,
        ledger: Arc<dyn OrderLedger>,
        worker_repo: Arc<dyn WorkerRepository>,
        notifier: Arc<dyn Notifier>,
        deadlines: Arc<DeadlineScheduler>,
        config: Option<CoordinatorConfig>,
    ) -> Self {
        Self {
            queue,
            ledger,
            worker_repo,
            notifier,
            deadlines,
            config: config.unwrap_or_default(),
        }
    }

    /// 接收新订单并立即尝试派发
    ///
    /// 入站投递是至少一次语义：同一标识的未结束订单重复提交视为
    /// 无操作，返回已存在的记录。
    pub async fn submit_order(
        &self,
        order_id: &str,
        origin_ref: &str,
        payload: &str,
    ) -> DispatchResult<Order> {
        match self.ledger.open(order_id, origin_ref, payload).await {
            Ok(_) => {}
            Err(DispatchError::DuplicateOrder { id }) => {
                info!("订单 {} 已在处理中，忽略重复提交", id);
                return self
                    .ledger
                    .get(&id)
                    .await?
                    .ok_or_else(|| DispatchError::order_not_found(&id));
            }
            Err(e) => return Err(e),
        }

        self.dispatch_next(order_id).await
    }

    /// 将订单派发给下一个候选Worker；候选用尽时订单转入exhausted
    ///
    /// 候选是队列中尚未派发过该订单的第一个Worker。派出即离队，
    /// 一个Worker不会同时被两个订单占用。
    pub async fn dispatch_next(&self, order_id: &str) -> DispatchResult<Order> {
        loop {
            let order = self
                .ledger
                .get(order_id)
                .await?
                .ok_or_else(|| DispatchError::order_not_found(order_id))?;
            if order.status != OrderStatus::Pending {
                debug!("订单 {} 已处于 {} 状态，停止派发", order_id, order.status);
                return Ok(order);
            }

            let Some(worker_id) = self.next_candidate(&order).await? else {
                let exhausted = self.ledger.exhaust(order_id).await?;
                warn!("订单 {} 没有可派发的Worker", order_id);
                self.notify_origin_logged(&exhausted.origin_ref, "没有可用的Worker，订单未能派出")
                    .await;
                return Ok(exhausted);
            };

            let order = match self.ledger.assign(order_id, &worker_id).await {
                Ok(order) => order,
                // 并发级联可能抢先派发了同一候选，换下一个
                Err(DispatchError::AlreadyOffered { .. }) => continue,
                Err(e) => return Err(e),
            };

            // 派出即离队；若另一条级联在快照之后抢先占用了该Worker，
            // 条目已经不在了，本单跳过这个候选
            let claimed = self.queue.remove(&worker_id).await?;
            if !claimed {
                warn!("Worker {} 已被并发派发占用，跳过", worker_id);
                continue;
            }
            self.worker_repo
                .update_status(&worker_id, WorkerStatus::Engaged)
                .await?;

            let content = format!(
                "有新订单!\n\n{}\n\n{} 秒内未接单将派发给下一位。",
                order.payload,
                self.config.offer_timeout.as_secs()
            );
            let actions = [WorkerAction::AcceptOrder {
                order_id: order_id.to_string(),
            }];

            match self.notifier.notify_worker(&worker_id, &content, &actions).await {
                Ok(handle) => {
                    let token = self
                        .deadlines
                        .arm(self.config.offer_timeout, order_id, &worker_id)
                        .await;
                    self.ledger.record_deadline(order_id, Some(token)).await?;
                    info!(
                        "订单 {} 已派发给Worker {}，消息 {}，令牌 {}",
                        order_id, worker_id, handle.id, token
                    );
                    return self
                        .ledger
                        .get(order_id)
                        .await?
                        .ok_or_else(|| DispatchError::order_not_found(order_id));
                }
                Err(e) => {
                    // 通知失败等同于立即超时：该Worker留在派发历史里
                    // 不会再被选中，级联直接继续
                    warn!("通知Worker {} 失败，跳过该候选: {}", worker_id, e);
                    self.worker_repo
                        .update_status(&worker_id, WorkerStatus::Inactive)
                        .await?;
                    continue;
                }
            }
        }
    }

    /// Worker接单确认
    ///
    /// 接单与超时的竞争由台账的try_accept裁决；竞争失败方会收到
    /// "订单已不可用"的明确反馈，绝不静默成功。
    pub async fn accept_order(&self, order_id: &str, worker_id: &str) -> DispatchResult<Order> {
        match self.ledger.try_accept(order_id, worker_id).await {
            Ok(mut order) => {
                if let Some(token) = order.deadline_token {
                    self.deadlines.cancel(token).await;
                    self.ledger.record_deadline(order_id, None).await?;
                    order.deadline_token = None;
                }

                // 管理员可能已删除该Worker；在途订单仍需可结单，此时
                // 来源消息退化为只含标识
                let label = match self.worker_repo.get_by_id(worker_id).await? {
                    Some(worker) => format!("{}（{}）", worker.name, worker.vehicle_label()),
                    None => worker_id.to_string(),
                };
                self.notify_origin_logged(
                    &order.origin_ref,
                    &format!("订单已被接受，{label} 正在前往"),
                )
                .await;
                if let Err(e) = self
                    .notifier
                    .notify_worker(worker_id, "您已接下此订单，完成后请重新加入队列。", &[])
                    .await
                {
                    warn!("向Worker {} 发送接单确认失败: {}", worker_id, e);
                }

                info!("订单 {} 接单完成，Worker {}", order_id, worker_id);
                Ok(order)
            }
            Err(DispatchError::StaleAcceptance { order_id: id }) => {
                if let Err(e) = self
                    .notifier
                    .notify_worker(worker_id, "该订单已不再可用。", &[])
                    .await
                {
                    warn!("向Worker {} 发送失效提示失败: {}", worker_id, e);
                }
                Err(DispatchError::StaleAcceptance { order_id: id })
            }
            Err(e) => Err(e),
        }
    }

    /// 截止时间到期
    ///
    /// 先做幂等状态检查：订单必须仍在该Worker名下pending且令牌
    /// 匹配，否则说明接单或取消赢得了竞争，这里无操作。
    pub async fn handle_deadline(&self, expiry: &DeadlineExpiry) -> DispatchResult<()> {
        let Some(order) = self.ledger.get(&expiry.order_id).await? else {
            debug!("到期事件指向不存在的订单 {}，忽略", expiry.order_id);
            return Ok(());
        };

        let still_pending = order.status == OrderStatus::Pending
            && order.assignee.as_deref() == Some(expiry.worker_id.as_str())
            && order.deadline_token == Some(expiry.token);
        if !still_pending {
            debug!("订单 {} 的到期事件已失效，忽略", expiry.order_id);
            return Ok(());
        }

        self.ledger.record_deadline(&expiry.order_id, None).await?;

        if let Err(e) = self
            .notifier
            .notify_worker(&expiry.worker_id, "接单时间已到，订单将派发给下一位。", &[])
            .await
        {
            warn!("向Worker {} 发送超时提示失败: {}", expiry.worker_id, e);
        }
        self.worker_repo
            .update_status(&expiry.worker_id, WorkerStatus::Inactive)
            .await?;
        self.notify_origin_logged(&order.origin_ref, "Worker未在时限内接单，正在重新派发...")
            .await;

        info!(
            "订单 {} 在Worker {} 处超时，进入级联",
            expiry.order_id, expiry.worker_id
        );
        self.dispatch_next(&expiry.order_id).await?;
        Ok(())
    }

    /// 为挂起的派发重新装配截止时间（进程重启后定时器已丢失）
    pub async fn rearm_offer(&self, order: &Order) -> DispatchResult<i64> {
        let worker_id = order.assignee.as_deref().ok_or_else(|| {
            DispatchError::internal(format!("订单 {} 没有派发对象，无法重新装配", order.id))
        })?;

        let token = self
            .deadlines
            .arm(self.config.offer_timeout, &order.id, worker_id)
            .await;
        self.ledger.record_deadline(&order.id, Some(token)).await?;

        info!("订单 {} 的截止时间已重新装配，令牌 {}", order.id, token);
        Ok(token)
    }

    async fn next_candidate(&self, order: &Order) -> DispatchResult<Option<String>> {
        let entries = self.queue.snapshot().await?;
        Ok(entries
            .into_iter()
            .map(|entry| entry.worker_id)
            .find(|worker_id| !order.was_offered_to(worker_id)))
    }

    /// 来源通知失败只记录，不影响订单状态机
    async fn notify_origin_logged(&self, origin_ref: &str, content: &str) {
        if let Err(e) = self.notifier.notify_origin(origin_ref, content).await {
            warn!("通知来源 {} 失败: {}", origin_ref, e);
        }
    }
}
