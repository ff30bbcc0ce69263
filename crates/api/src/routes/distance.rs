//! Distance endpoint handler (history service).

use axum::{extract::State, Json};
use domain::models::record::{DistanceQuery, DistanceResponse, GetDistanceRequest};

use crate::app::HistoryState;
use crate::error::ApiError;
use crate::extractors::{AppPath, AppQuery};

/// Distance in meters a user travelled within a time window.
///
/// GET /api/v1/users/:username/distance?from=..&to=..
///
/// Bounds are RFC 3339 timestamps. A missing bound makes the window 24 hours
/// wide; with neither bound the window ends now.
pub async fn get_distance(
    State(state): State<HistoryState>,
    AppPath(username): AppPath<String>,
    AppQuery(query): AppQuery<DistanceQuery>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let response = state
        .service
        .get_distance_by_username(GetDistanceRequest {
            username,
            from: query.from,
            to: query.to,
        })
        .await?;

    Ok(Json(response))
}
