use thiserror::Error;

/// 派发系统统一错误类型
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Worker不存在或不具备入队资格: {id}")]
    UnknownWorker { id: String },

    #[error("Worker已注册: {id}")]
    WorkerAlreadyRegistered { id: String },

    #[error("Worker已在队列中: {id}")]
    AlreadyQueued { id: String },

    #[error("订单已向该Worker派发过: order={order_id}, worker={worker_id}")]
    AlreadyOffered { order_id: String, worker_id: String },

    #[error("订单已存在且未结束: {id}")]
    DuplicateOrder { id: String },

    #[error("订单不存在: {id}")]
    OrderNotFound { id: String },

    #[error("接单确认已失效: {order_id}")]
    StaleAcceptance { order_id: String },

    #[error("订单状态不允许该操作: order={order_id}, status={status}")]
    InvalidOrderState { order_id: String, status: String },

    #[error("没有可用的Worker")]
    NoWorkersAvailable,

    #[error("通知发送失败: {0}")]
    NotificationFailed(String),

    #[error("数据库操作失败: {0}")]
    DatabaseOperation(String),

    #[error("数据序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

impl DispatchError {
    pub fn unknown_worker<S: Into<String>>(id: S) -> Self {
        Self::UnknownWorker { id: id.into() }
    }

    pub fn order_not_found<S: Into<String>>(id: S) -> Self {
        Self::OrderNotFound { id: id.into() }
    }

    pub fn notification_failed<S: Into<String>>(msg: S) -> Self {
        Self::NotificationFailed(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// 冲突类错误：违反队列/台账不变量，由直接调用方处理，不代表系统故障
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::WorkerAlreadyRegistered { .. }
                | Self::AlreadyQueued { .. }
                | Self::AlreadyOffered { .. }
                | Self::DuplicateOrder { .. }
                | Self::StaleAcceptance { .. }
                | Self::InvalidOrderState { .. }
        )
    }

    /// 致命错误：核心没有独立的恢复策略，直接向上传播
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DatabaseOperation(_) | Self::Configuration(_) | Self::Internal(_)
        )
    }
}

impl From<sqlx::Error> for DispatchError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
