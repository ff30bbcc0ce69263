//! Ports for calls between the two services.
//!
//! Each port has a resilient decorator (retry around a circuit breaker), an
//! in-process adapter and a mock. HTTP adapters live in the `api` crate.

pub mod history;
pub mod location;

pub use history::{HistoryClient, LocalHistoryClient, MockHistoryClient, ResilientHistoryClient};
pub use location::{LocalLocationClient, LocationClient, ResilientLocationClient};
