use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use courier_domain::entities::QueueEntry;

use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::AppState;

/// 队列成员操作请求
#[derive(Debug, Deserialize)]
pub struct QueueMembershipRequest {
    pub worker_id: String,
}

/// 加入可用性队列
pub async fn join_queue(
    State(state): State<AppState>,
    Json(request): Json<QueueMembershipRequest>,
) -> ApiResult<ApiResponse<QueueEntry>> {
    let entry = state.queue.enqueue(&request.worker_id).await?;
    let position = entry.position;
    Ok(ApiResponse::success_with_message(
        entry,
        format!("已加入队列，当前位置 {position}"),
    ))
}

/// 退出队列；不在队列中也视为成功
pub async fn leave_queue(
    State(state): State<AppState>,
    Json(request): Json<QueueMembershipRequest>,
) -> ApiResult<ApiResponse<()>> {
    state.queue.remove(&request.worker_id).await?;
    Ok(ApiResponse::success_empty_with_message(
        "已退出队列".to_string(),
    ))
}

/// 当前队列
pub async fn list_queue(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<QueueEntry>>> {
    let entries = state.queue.snapshot().await?;
    Ok(ApiResponse::success(entries))
}

/// 重置队列（管理员）
pub async fn reset_queue(State(state): State<AppState>) -> ApiResult<ApiResponse<u64>> {
    let cleared = state.queue.reset().await?;
    Ok(ApiResponse::success_with_message(
        cleared,
        format!("队列已重置，清除 {cleared} 个条目"),
    ))
}
