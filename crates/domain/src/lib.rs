//! Domain layer for the geotracker services.
//!
//! This crate contains:
//! - Domain models (User, Location, MovementRecord) and request payloads
//! - The error taxonomy shared by both services
//! - Storage and client ports with in-memory and resilient implementations
//! - The location and history services

pub mod clients;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

pub use error::{DomainError, FieldViolation};
