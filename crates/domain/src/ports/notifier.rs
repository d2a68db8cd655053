use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use courier_core::DispatchResult;

/// 附加在Worker通知上的可交互操作
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerAction {
    AcceptOrder { order_id: String },
}

/// 已送出消息的句柄，由传输层生成
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageHandle {
    pub id: String,
}

/// 通知传输抽象
///
/// 送达失败以错误报告给调用方，核心不做重试。
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_worker(
        &self,
        worker_id: &str,
        content: &str,
        actions: &[WorkerAction],
    ) -> DispatchResult<MessageHandle>;

    async fn notify_origin(&self, origin_ref: &str, content: &str) -> DispatchResult<()>;
}
