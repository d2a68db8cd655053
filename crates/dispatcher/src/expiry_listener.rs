use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};

use crate::coordinator::DispatchCoordinator;
use crate::deadline::DeadlineExpiry;

/// 截止时间到期监听器
///
/// 消费调度器的到期事件并驱动协调器的超时路径，直到收到关闭信号
/// 或事件通道关闭。
pub struct ExpiryListener {
    coordinator: Arc<DispatchCoordinator>,
    expiry_rx: mpsc::UnboundedReceiver<DeadlineExpiry>,
}

impl ExpiryListener {
    pub fn new(
        coordinator: Arc<DispatchCoordinator>,
        expiry_rx: mpsc::UnboundedReceiver<DeadlineExpiry>,
    ) -> Self {
        Self {
            coordinator,
            expiry_rx,
        }
    }

    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("到期监听器已启动");
        loop {
            tokio::select! {
                maybe_expiry = self.expiry_rx.recv() => match maybe_expiry {
                    Some(expiry) => {
                        debug!("处理订单 {} 的到期事件", expiry.order_id);
                        if let Err(e) = self.coordinator.handle_deadline(&expiry).await {
                            error!("处理订单 {} 超时失败: {}", expiry.order_id, e);
                        }
                    }
                    None => {
                        info!("到期事件通道已关闭，监听器退出");
                        break;
                    }
                },
                _ = shutdown_rx.recv() => {
                    info!("到期监听器收到关闭信号");
                    break;
                }
            }
        }
    }
}
