use std::sync::Arc;

use tracing::{info, warn};

use courier_core::DispatchResult;
use courier_domain::repositories::OrderRepository;

use crate::coordinator::DispatchCoordinator;

/// 启动恢复报告
#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    pub rearmed_offers: usize,
    pub redispatched_orders: usize,
    pub errors: Vec<String>,
}

/// 启动时恢复在途订单
///
/// 进程重启会丢掉内存中的全部定时器：已派发的pending订单重新装配
/// 完整时限，尚未派出的重新进入级联。
pub struct OfferRecoveryService {
    order_repo: Arc<dyn OrderRepository>,
    coordinator: Arc<DispatchCoordinator>,
}

impl OfferRecoveryService {
    pub fn new(order_repo: Arc<dyn OrderRepository>, coordinator: Arc<DispatchCoordinator>) -> Self {
        Self {
            order_repo,
            coordinator,
        }
    }

    pub async fn recover(&self) -> DispatchResult<RecoveryReport> {
        let pending = self.order_repo.get_pending().await?;
        let mut report = RecoveryReport::default();

        for order in pending {
            let outcome = if order.assignee.is_some() {
                self.coordinator
                    .rearm_offer(&order)
                    .await
                    .map(|_| report.rearmed_offers += 1)
            } else {
                self.coordinator
                    .dispatch_next(&order.id)
                    .await
                    .map(|_| report.redispatched_orders += 1)
            };

            if let Err(e) = outcome {
                warn!("恢复订单 {} 失败: {}", order.id, e);
                report.errors.push(format!("{}: {}", order.id, e));
            }
        }

        info!(
            "启动恢复完成：重新装配 {} 个派发，重新派出 {} 个订单，{} 个失败",
            report.rearmed_offers,
            report.redispatched_orders,
            report.errors.len()
        );
        Ok(report)
    }
}
