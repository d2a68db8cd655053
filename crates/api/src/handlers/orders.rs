use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use courier_core::DispatchError;
use courier_domain::entities::Order;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::routes::AppState;

/// 创建订单请求
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// 不提供时由服务端生成
    pub order_id: Option<String>,
    pub origin_ref: String,
    pub payload: String,
}

/// 接单请求
#[derive(Debug, Deserialize)]
pub struct AcceptOrderRequest {
    pub worker_id: String,
}

/// 提交新订单并立即派发
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<ApiResponse<Order>> {
    if request.origin_ref.trim().is_empty() {
        return Err(ApiError::BadRequest("origin_ref不能为空".to_string()));
    }
    if request.payload.trim().is_empty() {
        return Err(ApiError::BadRequest("payload不能为空".to_string()));
    }

    let order_id = request
        .order_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let order = state
        .coordinator
        .submit_order(&order_id, &request.origin_ref, &request.payload)
        .await?;

    Ok(ApiResponse::success(order))
}

/// 查询订单
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Order>> {
    let order = state
        .ledger
        .get(&id)
        .await
        .map_err(ApiError::Dispatch)?
        .ok_or(ApiError::Dispatch(DispatchError::OrderNotFound { id }))?;

    Ok(ApiResponse::success(order))
}

/// Worker接单确认
pub async fn accept_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AcceptOrderRequest>,
) -> ApiResult<ApiResponse<Order>> {
    let order = state
        .coordinator
        .accept_order(&id, &request.worker_id)
        .await?;

    Ok(ApiResponse::success_with_message(order, "接单成功".to_string()))
}
