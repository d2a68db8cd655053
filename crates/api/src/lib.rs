//! # Courier API
//!
//! 订单派发系统的REST API模块，基于Axum构建。
//!
//! ## API 端点
//!
//! ### 订单
//! - `POST /api/orders` - 提交新订单并立即派发
//! - `GET /api/orders/{id}` - 查询订单
//! - `POST /api/orders/{id}/accept` - Worker接单确认
//!
//! ### Worker
//! - `POST /api/workers` - 注册Worker
//! - `GET /api/workers` - Worker列表
//! - `GET /api/workers/{id}` - Worker档案（含队列位置）
//! - `POST /api/workers/{id}/delete` - 删除Worker（管理员）
//!
//! ### 队列
//! - `POST /api/queue/join` - 加入可用性队列
//! - `POST /api/queue/leave` - 退出队列
//! - `GET /api/queue` - 当前队列
//! - `POST /api/queue/reset` - 重置队列（管理员）
//!
//! ### 系统
//! - `GET /health` - 健康检查

pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use routes::{create_routes, AppState};
