use serde_json::json;

use crate::response::ApiResponse;

/// 健康检查
pub async fn health_check() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(json!({
        "status": "healthy",
        "service": "courier",
    }))
}
