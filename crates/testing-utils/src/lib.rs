//! # Courier Testing Utils
//!
//! Shared testing utilities for the order dispatch system. This crate
//! provides in-memory mock implementations of the repository and notifier
//! traits plus test data builders, so unit tests run without a database
//! or a real notification gateway.
//!
//! Add it as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! courier-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
