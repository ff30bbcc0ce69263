//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod location;
pub mod record;
pub mod user;

pub use location::LocationEntity;
pub use record::RecordEntity;
pub use user::UserEntity;
