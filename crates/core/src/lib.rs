pub mod config;
pub mod errors;

pub use config::{ApiConfig, AppConfig, DatabaseConfig, DispatcherConfig, NotifierConfig};
pub use errors::{DispatchError, DispatchResult};
