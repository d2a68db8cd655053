use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub vehicle_model: String,
    pub vehicle_plate: String,
    pub status: WorkerStatus,
    pub registered_at: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: &str, name: &str, vehicle_model: &str, vehicle_plate: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            vehicle_model: vehicle_model.to_string(),
            vehicle_plate: vehicle_plate.to_string(),
            status: WorkerStatus::Inactive,
            registered_at: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == WorkerStatus::Available
    }

    /// 展示给订单来源的车辆描述
    pub fn vehicle_label(&self) -> String {
        format!("{} {}", self.vehicle_model, self.vehicle_plate)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerStatus {
    /// 未在队列中，不参与派发
    Inactive,
    /// 在队列中等待订单
    Available,
    /// 已被派发订单占用（含等待接单确认的窗口期）
    Engaged,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Available => write!(f, "AVAILABLE"),
            Self::Engaged => write!(f, "ENGAGED"),
        }
    }
}

impl FromStr for WorkerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INACTIVE" => Ok(Self::Inactive),
            "AVAILABLE" => Ok(Self::Available),
            "ENGAGED" => Ok(Self::Engaged),
            _ => Err(format!("Invalid worker status: {s}")),
        }
    }
}

/// 可用性队列条目
///
/// 位置从1开始，按joined_at升序构成连续排列；队列成员关系是
/// Worker可用性的唯一事实来源，status字段只是派生视图。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub worker_id: String,
    pub position: i64,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    /// 当前被派发的Worker；pending期间可随级联变化
    pub assignee: Option<String>,
    /// 来源路由句柄，核心不解释其内容
    pub origin_ref: String,
    pub payload: String,
    /// 当前装配的截止时间令牌
    pub deadline_token: Option<i64>,
    /// 已派发过的Worker历史，按派发顺序；防止级联环路
    pub offered: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: &str, origin_ref: &str, payload: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            status: OrderStatus::Pending,
            assignee: None,
            origin_ref: origin_ref.to_string(),
            payload: payload.to_string(),
            deadline_token: None,
            offered: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn was_offered_to(&self, worker_id: &str) -> bool {
        self.offered.iter().any(|w| w == worker_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// 等待某个Worker接单
    Pending,
    /// 已被接受，终态
    Accepted,
    /// 候选Worker耗尽仍无人接单，终态
    Exhausted,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Exhausted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::Exhausted => write!(f, "EXHAUSTED"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "EXHAUSTED" => Ok(Self::Exhausted),
            _ => Err(format!("Invalid order status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_round_trips() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Exhausted,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        for status in [
            WorkerStatus::Inactive,
            WorkerStatus::Available,
            WorkerStatus::Engaged,
        ] {
            assert_eq!(status.to_string().parse::<WorkerStatus>().unwrap(), status);
        }
    }

    #[test]
    fn new_order_is_pending_without_assignee() {
        let order = Order::new("order-1", "origin-1", "pickup at gate 3");
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.assignee.is_none());
        assert!(order.offered.is_empty());
        assert!(!order.is_terminal());
    }

    #[test]
    fn offered_history_lookup() {
        let mut order = Order::new("order-1", "origin-1", "payload");
        order.offered.push("worker-1".to_string());
        assert!(order.was_offered_to("worker-1"));
        assert!(!order.was_offered_to("worker-2"));
    }
}
