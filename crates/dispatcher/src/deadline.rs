use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// 截止时间到期事件，经由通道转交给到期监听器
#[derive(Debug, Clone, PartialEq)]
pub struct DeadlineExpiry {
    pub token: i64,
    pub order_id: String,
    pub worker_id: String,
}

/// 可取消的截止时间调度器
///
/// 每个令牌至多触发一次：到期任务与cancel争夺armed集合里的令牌，
/// 谁先摘除谁生效。取消只是建议性的——正确性由协调器的幂等状态
/// 检查兜底，而不依赖取消一定赢得竞争。
pub struct DeadlineScheduler {
    next_token: AtomicI64,
    armed: Arc<Mutex<HashSet<i64>>>,
    expiry_tx: mpsc::UnboundedSender<DeadlineExpiry>,
}

impl DeadlineScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeadlineExpiry>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_token: AtomicI64::new(1),
            armed: Arc::new(Mutex::new(HashSet::new())),
            expiry_tx,
        };
        (scheduler, expiry_rx)
    }

    /// 装配一个截止时间，返回用于取消的令牌
    pub async fn arm(&self, duration: Duration, order_id: &str, worker_id: &str) -> i64 {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.armed.lock().await.insert(token);

        let armed = Arc::clone(&self.armed);
        let tx = self.expiry_tx.clone();
        let expiry = DeadlineExpiry {
            token,
            order_id: order_id.to_string(),
            worker_id: worker_id.to_string(),
        };

        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // 令牌还在集合里说明没被取消，本任务摘除它并触发到期
            let fired = armed.lock().await.remove(&token);
            if fired && tx.send(expiry).is_err() {
                warn!("到期事件通道已关闭，令牌 {} 的超时被丢弃", token);
            }
        });

        debug!(
            "已装配截止时间 {:?}，订单 {}，Worker {}，令牌 {}",
            duration, order_id, worker_id, token
        );
        token
    }

    /// 取消一个已装配的截止时间；若到期任务已经触发则返回false
    pub async fn cancel(&self, token: i64) -> bool {
        let cancelled = self.armed.lock().await.remove(&token);
        debug!("取消令牌 {}: {}", token, cancelled);
        cancelled
    }

    /// 当前仍在等待到期的令牌数
    pub async fn armed_count(&self) -> usize {
        self.armed.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain_timers() {
        for _ in 0..32 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_exactly_once() {
        let (scheduler, mut rx) = DeadlineScheduler::new();
        let token = scheduler
            .arm(Duration::from_secs(30), "order-1", "worker-1")
            .await;
        assert_eq!(scheduler.armed_count().await, 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        drain_timers().await;

        let expiry = rx.try_recv().unwrap();
        assert_eq!(expiry.token, token);
        assert_eq!(expiry.order_id, "order-1");
        assert_eq!(expiry.worker_id, "worker-1");
        assert_eq!(scheduler.armed_count().await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let (scheduler, mut rx) = DeadlineScheduler::new();
        let token = scheduler
            .arm(Duration::from_secs(30), "order-1", "worker-1")
            .await;

        assert!(scheduler.cancel(token).await);
        tokio::time::advance(Duration::from_secs(60)).await;
        drain_timers().await;

        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.armed_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_expiry_reports_loss() {
        let (scheduler, mut rx) = DeadlineScheduler::new();
        let token = scheduler
            .arm(Duration::from_secs(30), "order-1", "worker-1")
            .await;

        tokio::time::advance(Duration::from_secs(31)).await;
        drain_timers().await;
        assert!(rx.try_recv().is_ok());

        // 到期任务已经摘走令牌，取消方必须能观察到自己输掉了竞争
        assert!(!scheduler.cancel(token).await);
    }

    #[tokio::test(start_paused = true)]
    async fn tokens_are_unique_per_arming() {
        let (scheduler, _rx) = DeadlineScheduler::new();
        let first = scheduler
            .arm(Duration::from_secs(10), "order-1", "worker-1")
            .await;
        let second = scheduler
            .arm(Duration::from_secs(10), "order-1", "worker-2")
            .await;
        assert_ne!(first, second);
        assert_eq!(scheduler.armed_count().await, 2);
    }
}
