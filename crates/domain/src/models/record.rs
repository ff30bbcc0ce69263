//! Movement record domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geo::GeoPoint;
use validator::Validate;

/// One movement segment of a user, from `a` to `b`. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    pub id: i64,
    pub user_id: i64,
    pub a: GeoPoint,
    pub b: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl MovementRecord {
    /// Great-circle length of the segment in meters.
    pub fn distance(&self) -> f64 {
        self.a.haversine_distance(&self.b)
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to append a movement record. Also the body of `POST /internal/v1/records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AddRecordRequest {
    #[validate(custom(function = "shared::validation::validate_user_id"))]
    pub user_id: i64,

    #[validate(nested)]
    pub a: GeoPoint,

    #[validate(nested)]
    pub b: GeoPoint,

    pub timestamp: DateTime<Utc>,
}

/// Distance query for a username. Missing bounds default to a 24 hour window.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GetDistanceRequest {
    #[validate(custom(function = "shared::validation::validate_username"))]
    pub username: String,

    pub from: Option<DateTime<Utc>>,

    pub to: Option<DateTime<Utc>>,
}

/// Query parameters for `GET /api/v1/users/:username/distance`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistanceQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResponse {
    /// Distance travelled in meters.
    pub distance: f64,
}
