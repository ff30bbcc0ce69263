//! Shared utilities and common types for the geotracker services.
//!
//! This crate provides common functionality used across all other crates:
//! - Geographic points and coordinate truncation
//! - Page cursor encoding
//! - Common validation logic
//! - Circuit breaker and retry for remote calls

pub mod geo;
pub mod pagination;
pub mod resilience;
pub mod validation;
