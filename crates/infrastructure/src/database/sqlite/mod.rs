mod sqlite_order_repository;
mod sqlite_queue_repository;
mod sqlite_worker_repository;

pub use sqlite_order_repository::SqliteOrderRepository;
pub use sqlite_queue_repository::SqliteQueueRepository;
pub use sqlite_worker_repository::SqliteWorkerRepository;
