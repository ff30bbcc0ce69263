//! HTTP route handlers.

pub mod distance;
pub mod health;
pub mod records;
pub mod users;
