//! Persistence layer for the geotracker services.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Postgres implementations of the domain storage ports
//! - Query timing metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use repositories::{LocationRepository, RecordRepository};
