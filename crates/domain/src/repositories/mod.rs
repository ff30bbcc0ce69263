//! Storage ports used by the services, with in-memory implementations.
//!
//! The Postgres implementations live in the `persistence` crate.

pub mod history;
pub mod location;

pub use history::{HistoryStore, InMemoryHistoryStore};
pub use location::{InMemoryLocationStore, LocationStore, SetLocationOutcome, UsersPage};
