use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use courier_domain::entities::Worker;
use courier_dispatcher::WorkerProfile;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::routes::AppState;

/// Worker注册请求
#[derive(Debug, Deserialize)]
pub struct RegisterWorkerRequest {
    pub id: String,
    pub name: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
}

/// 注册Worker
pub async fn register_worker(
    State(state): State<AppState>,
    Json(request): Json<RegisterWorkerRequest>,
) -> ApiResult<ApiResponse<Worker>> {
    for (field, value) in [
        ("id", &request.id),
        ("name", &request.name),
        ("vehicle_model", &request.vehicle_model),
        ("vehicle_plate", &request.vehicle_plate),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{field}不能为空")));
        }
    }

    let worker = state
        .registry
        .register(
            &request.id,
            &request.name,
            &request.vehicle_model,
            &request.vehicle_plate,
        )
        .await?;

    Ok(ApiResponse::success_with_message(
        worker,
        "注册成功，现在可以加入队列接单".to_string(),
    ))
}

/// Worker列表
pub async fn list_workers(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Worker>>> {
    let workers = state.registry.list().await?;
    Ok(ApiResponse::success(workers))
}

/// Worker档案，含经过校准的队列位置
pub async fn get_worker_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<WorkerProfile>> {
    let profile = state.registry.profile(&id).await?;
    Ok(ApiResponse::success(profile))
}

/// 删除Worker（管理员）
pub async fn delete_worker(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    state.registry.remove(&id).await?;
    Ok(ApiResponse::success_empty_with_message(format!(
        "Worker {id} 已删除"
    )))
}
