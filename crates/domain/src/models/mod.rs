//! Domain models for the geotracker services.

pub mod location;
pub mod record;
pub mod user;

pub use location::Location;
pub use record::MovementRecord;
pub use user::User;
