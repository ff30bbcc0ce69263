//! Movement record entity (database row mapping).

use chrono::{DateTime, Utc};
use shared::geo::GeoPoint;
use sqlx::FromRow;

/// Database row mapping for the records table.
#[derive(Debug, Clone, FromRow)]
pub struct RecordEntity {
    pub id: i64,
    pub user_id: i64,
    pub a_longitude: f64,
    pub a_latitude: f64,
    pub b_longitude: f64,
    pub b_latitude: f64,
    pub recorded_at: DateTime<Utc>,
}

impl From<RecordEntity> for domain::models::MovementRecord {
    fn from(entity: RecordEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            a: GeoPoint::new(entity.a_longitude, entity.a_latitude),
            b: GeoPoint::new(entity.b_longitude, entity.b_latitude),
            timestamp: entity.recorded_at,
        }
    }
}
