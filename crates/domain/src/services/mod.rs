//! Domain services for the geotracker.
//!
//! Services validate requests, apply coordinate truncation and orchestrate the
//! storage and client ports.

pub mod history;
pub mod location;

pub use history::{resolve_distance_window, HistoryService, DEFAULT_DISTANCE_WINDOW_HOURS};
pub use location::LocationService;
