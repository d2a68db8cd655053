use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use courier_core::DispatchError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("派发错误: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::Dispatch(e) => match e {
                DispatchError::UnknownWorker { id } => (
                    StatusCode::NOT_FOUND,
                    "UNKNOWN_WORKER",
                    format!("Worker {id} 不存在"),
                ),
                DispatchError::OrderNotFound { id } => (
                    StatusCode::NOT_FOUND,
                    "ORDER_NOT_FOUND",
                    format!("订单 {id} 不存在"),
                ),
                DispatchError::WorkerAlreadyRegistered { id } => (
                    StatusCode::CONFLICT,
                    "WORKER_ALREADY_REGISTERED",
                    format!("Worker {id} 已注册"),
                ),
                DispatchError::AlreadyQueued { id } => (
                    StatusCode::CONFLICT,
                    "ALREADY_QUEUED",
                    format!("Worker {id} 已在队列中"),
                ),
                DispatchError::DuplicateOrder { id } => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_ORDER",
                    format!("订单 {id} 已存在"),
                ),
                DispatchError::AlreadyOffered { order_id, .. } => (
                    StatusCode::CONFLICT,
                    "ALREADY_OFFERED",
                    format!("订单 {order_id} 已派发过该Worker"),
                ),
                DispatchError::StaleAcceptance { order_id } => (
                    StatusCode::CONFLICT,
                    "STALE_ACCEPTANCE",
                    format!("订单 {order_id} 已不再可接受"),
                ),
                DispatchError::InvalidOrderState { order_id, status } => (
                    StatusCode::CONFLICT,
                    "INVALID_ORDER_STATE",
                    format!("订单 {order_id} 当前状态 {status} 不允许该操作"),
                ),
                DispatchError::NoWorkersAvailable => (
                    StatusCode::CONFLICT,
                    "NO_WORKERS_AVAILABLE",
                    "没有可用的Worker".to_string(),
                ),
                DispatchError::NotificationFailed(msg) => (
                    StatusCode::BAD_GATEWAY,
                    "NOTIFICATION_FAILED",
                    format!("通知发送失败: {msg}"),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "系统繁忙，请稍后重试".to_string(),
                ),
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "success": false,
            "error": {
                "type": error_type,
                "message": message,
            },
            "timestamp": chrono::Utc::now(),
        });

        (status, Json(body)).into_response()
    }
}
