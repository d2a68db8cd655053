//! Test data builders for creating test entities
//!
//! Builder patterns with sensible defaults and easy customization.

use chrono::{DateTime, Utc};

use courier_domain::entities::{Order, OrderStatus, Worker, WorkerStatus};

/// Builder for creating test Worker entities
pub struct WorkerBuilder {
    worker: Worker,
}

impl WorkerBuilder {
    pub fn new() -> Self {
        Self {
            worker: Worker {
                id: "worker-1".to_string(),
                name: "Test Worker".to_string(),
                vehicle_model: "Toyota Camry".to_string(),
                vehicle_plate: "A123BC".to_string(),
                status: WorkerStatus::Inactive,
                registered_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.worker.id = id.to_string();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.worker.name = name.to_string();
        self
    }

    pub fn with_vehicle(mut self, model: &str, plate: &str) -> Self {
        self.worker.vehicle_model = model.to_string();
        self.worker.vehicle_plate = plate.to_string();
        self
    }

    pub fn with_status(mut self, status: WorkerStatus) -> Self {
        self.worker.status = status;
        self
    }

    pub fn with_registered_at(mut self, registered_at: DateTime<Utc>) -> Self {
        self.worker.registered_at = registered_at;
        self
    }

    pub fn available(mut self) -> Self {
        self.worker.status = WorkerStatus::Available;
        self
    }

    pub fn engaged(mut self) -> Self {
        self.worker.status = WorkerStatus::Engaged;
        self
    }

    pub fn build(self) -> Worker {
        self.worker
    }
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Order entities
pub struct OrderBuilder {
    order: Order,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self {
            order: Order {
                id: "order-1".to_string(),
                status: OrderStatus::Pending,
                assignee: None,
                origin_ref: "origin-1".to_string(),
                payload: "pickup at gate 3".to_string(),
                deadline_token: None,
                offered: vec![],
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.order.id = id.to_string();
        self
    }

    pub fn with_origin_ref(mut self, origin_ref: &str) -> Self {
        self.order.origin_ref = origin_ref.to_string();
        self
    }

    pub fn with_payload(mut self, payload: &str) -> Self {
        self.order.payload = payload.to_string();
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.order.status = status;
        self
    }

    /// Assigns the order to a worker and records the offer in history
    pub fn assigned_to(mut self, worker_id: &str) -> Self {
        self.order.assignee = Some(worker_id.to_string());
        self.order.offered.push(worker_id.to_string());
        self
    }

    pub fn with_offered(mut self, offered: Vec<&str>) -> Self {
        self.order.offered = offered.into_iter().map(String::from).collect();
        self
    }

    pub fn with_deadline_token(mut self, token: i64) -> Self {
        self.order.deadline_token = Some(token);
        self
    }

    pub fn accepted(mut self) -> Self {
        self.order.status = OrderStatus::Accepted;
        self
    }

    pub fn exhausted(mut self) -> Self {
        self.order.status = OrderStatus::Exhausted;
        self
    }

    pub fn build(self) -> Order {
        self.order
    }
}

impl Default for OrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
