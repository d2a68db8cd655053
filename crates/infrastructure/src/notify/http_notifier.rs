use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use courier_core::{DispatchError, DispatchResult, NotifierConfig};
use courier_domain::ports::{MessageHandle, Notifier, WorkerAction};

#[derive(Debug, Serialize)]
struct WorkerNotification<'a> {
    worker_id: &'a str,
    content: &'a str,
    actions: &'a [WorkerAction],
}

#[derive(Debug, Serialize)]
struct OriginNotification<'a> {
    origin_ref: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct NotifyResponse {
    message_id: String,
}

/// 基于HTTP网关的通知实现
///
/// Worker与来源消息分别POST到 {endpoint}/worker 和 {endpoint}/origin；
/// 网关负责具体的聊天/推送通道。任何传输层失败都报告为
/// NotificationFailed，由协调器决定跳过还是记录。
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(config: &NotifierConfig) -> DispatchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| DispatchError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify_worker(
        &self,
        worker_id: &str,
        content: &str,
        actions: &[WorkerAction],
    ) -> DispatchResult<MessageHandle> {
        let url = format!("{}/worker", self.endpoint);
        let body = WorkerNotification {
            worker_id,
            content,
            actions,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DispatchError::notification_failed(format!("请求Worker通知网关失败: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(DispatchError::notification_failed(format!(
                "Worker通知网关返回 {}",
                response.status()
            )));
        }

        let parsed: NotifyResponse = response.json().await.map_err(|e| {
            DispatchError::notification_failed(format!("Worker通知网关响应解析失败: {e}"))
        })?;

        debug!("Worker {} 通知已送出，消息 {}", worker_id, parsed.message_id);
        Ok(MessageHandle {
            id: parsed.message_id,
        })
    }

    async fn notify_origin(&self, origin_ref: &str, content: &str) -> DispatchResult<()> {
        let url = format!("{}/origin", self.endpoint);
        let body = OriginNotification {
            origin_ref,
            content,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DispatchError::notification_failed(format!("请求来源通知网关失败: {e}"))
            })?;

        if !response.status().is_success() {
            return Err(DispatchError::notification_failed(format!(
                "来源通知网关返回 {}",
                response.status()
            )));
        }

        debug!("来源 {} 通知已送出", origin_ref);
        Ok(())
    }
}
