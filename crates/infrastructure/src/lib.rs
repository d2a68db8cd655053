pub mod database;
pub mod notify;

pub use database::sqlite::{SqliteOrderRepository, SqliteQueueRepository, SqliteWorkerRepository};
pub use database::Database;
pub use notify::HttpNotifier;
