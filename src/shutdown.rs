use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// 优雅关闭管理器
pub struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    is_shutdown: Arc<RwLock<bool>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            is_shutdown: Arc::new(RwLock::new(false)),
        }
    }

    /// 订阅关闭信号
    pub async fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// 触发关闭；重复触发是无操作
    pub async fn shutdown(&self) {
        let mut is_shutdown = self.is_shutdown.write().await;
        if *is_shutdown {
            debug!("关闭已经触发过");
            return;
        }
        *is_shutdown = true;

        let subscriber_count = self.shutdown_tx.receiver_count();
        debug!("发送关闭信号给 {} 个订阅者", subscriber_count);

        // 可能没有接收者，忽略发送错误
        let _ = self.shutdown_tx.send(());
        info!("系统关闭信号已发出");
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
