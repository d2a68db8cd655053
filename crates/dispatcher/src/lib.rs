pub mod coordinator;
pub mod deadline;
pub mod expiry_listener;
pub mod order_ledger;
pub mod queue_service;
pub mod recovery_service;
pub mod registry_service;

pub use coordinator::{CoordinatorConfig, DispatchCoordinator};
pub use deadline::{DeadlineExpiry, DeadlineScheduler};
pub use expiry_listener::ExpiryListener;
pub use order_ledger::{OrderLedger, OrderLedgerService};
pub use queue_service::{AvailabilityQueue, WorkerQueueService};
pub use recovery_service::{OfferRecoveryService, RecoveryReport};
pub use registry_service::{WorkerProfile, WorkerRegistryService};
