//! User location endpoint handlers (location service).

use axum::{extract::State, Json};
use domain::models::location::{
    ListUsersInRadiusRequest, ListUsersInRadiusResponse, SetLocationBody, SetUserLocationRequest,
    SetUserLocationResponse,
};
use domain::models::User;

use crate::app::LocationState;
use crate::error::ApiError;
use crate::extractors::{AppJson, AppPath, AppQuery};

/// Set a user's current location, creating the user on first sight.
///
/// PUT /api/v1/users/:username/location
pub async fn set_user_location(
    State(state): State<LocationState>,
    AppPath(username): AppPath<String>,
    AppJson(body): AppJson<SetLocationBody>,
) -> Result<Json<SetUserLocationResponse>, ApiError> {
    let response = state
        .service
        .set_user_location(SetUserLocationRequest {
            username,
            longitude: body.longitude,
            latitude: body.latitude,
        })
        .await?;

    Ok(Json(response))
}

/// List users within a radius (meters) of a point, one page at a time.
///
/// GET /api/v1/users/radius?longitude=..&latitude=..&radius=..&page_size=..
/// GET /api/v1/users/radius?longitude=..&latitude=..&radius=..&page_token=..
pub async fn list_users_in_radius(
    State(state): State<LocationState>,
    AppQuery(request): AppQuery<ListUsersInRadiusRequest>,
) -> Result<Json<ListUsersInRadiusResponse>, ApiError> {
    let response = state.service.list_users_in_radius(request).await?;
    Ok(Json(response))
}

/// Look a user up by username. Served on the internal listener.
///
/// GET /internal/v1/users/:username
pub async fn get_user_by_username(
    State(state): State<LocationState>,
    AppPath(username): AppPath<String>,
) -> Result<Json<User>, ApiError> {
    let user = state.service.get_user_by_username(&username).await?;
    Ok(Json(user))
}
