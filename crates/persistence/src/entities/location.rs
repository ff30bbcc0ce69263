//! Location entity (database row mapping).

use chrono::{DateTime, Utc};
use shared::geo::GeoPoint;
use sqlx::FromRow;

/// Database row mapping for the locations table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub user_id: i64,
    pub longitude: f64,
    pub latitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LocationEntity> for domain::models::Location {
    fn from(entity: LocationEntity) -> Self {
        Self {
            user_id: entity.user_id,
            point: GeoPoint::new(entity.longitude, entity.latitude),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
