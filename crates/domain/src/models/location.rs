//! Location domain model and request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geo::GeoPoint;
use validator::{Validate, ValidationError};

use super::user::User;

/// Current position of a user. One row per user, overwritten on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub user_id: i64,
    pub point: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Request DTOs
// ============================================================================

/// Request to move a user, creating the user if needed.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetUserLocationRequest {
    #[validate(custom(function = "shared::validation::validate_username"))]
    pub username: String,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,
}

impl SetUserLocationRequest {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

/// Request body for `PUT /api/v1/users/:username/location`.
#[derive(Debug, Clone, Deserialize)]
pub struct SetLocationBody {
    pub longitude: f64,
    pub latitude: f64,
}

/// Radius search request. Exactly one of `page_token` (a cursor from a previous
/// page) or `page_size` (first page) must be set.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_page_selector"))]
pub struct ListUsersInRadiusRequest {
    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    /// Search radius in meters.
    #[validate(custom(function = "shared::validation::validate_radius"))]
    pub radius: f64,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_page_cursor"))]
    pub page_token: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "shared::validation::validate_page_size"))]
    pub page_size: Option<i64>,
}

impl ListUsersInRadiusRequest {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.longitude, self.latitude)
    }
}

fn validate_page_selector(request: &ListUsersInRadiusRequest) -> Result<(), ValidationError> {
    match (&request.page_token, &request.page_size) {
        (Some(_), Some(_)) => {
            let mut err = ValidationError::new("page_selector");
            err.message = Some("Provide either page_token or page_size, not both".into());
            Err(err)
        }
        (None, None) => {
            let mut err = ValidationError::new("page_selector");
            err.message = Some("Either page_token or page_size is required".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetUserLocationResponse {
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListUsersInRadiusResponse {
    pub users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_cursor: Option<String>,
}
