//! Movement record ingestion (history service, internal listener).

use axum::{extract::State, http::StatusCode, Json};
use domain::models::record::{AddRecordRequest, MovementRecord};

use crate::app::HistoryState;
use crate::error::ApiError;
use crate::extractors::AppJson;

/// Append a movement record.
///
/// POST /internal/v1/records
pub async fn add_record(
    State(state): State<HistoryState>,
    AppJson(request): AppJson<AddRecordRequest>,
) -> Result<(StatusCode, Json<MovementRecord>), ApiError> {
    let record = state.service.add_record(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
