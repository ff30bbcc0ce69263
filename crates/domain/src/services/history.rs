//! Movement ledger and windowed distance aggregation.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use validator::Validate;

use crate::clients::LocationClient;
use crate::error::DomainError;
use crate::models::record::{
    AddRecordRequest, DistanceResponse, GetDistanceRequest, MovementRecord,
};
use crate::repositories::HistoryStore;

/// Width of the distance window when a bound is missing.
pub const DEFAULT_DISTANCE_WINDOW_HOURS: i64 = 24;

/// Fills missing bounds of a distance query.
///
/// Only `from`: `[from, from + 24h]`. Only `to`: `[to - 24h, to]`. Neither:
/// the 24 hours before `now`. A bound too close to the representable range
/// to extend is an invalid argument.
pub fn resolve_distance_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), DomainError> {
    let window = Duration::hours(DEFAULT_DISTANCE_WINDOW_HOURS);
    match (from, to) {
        (Some(from), Some(to)) => Ok((from, to)),
        (Some(from), None) => from
            .checked_add_signed(window)
            .map(|to| (from, to))
            .ok_or_else(|| DomainError::invalid_field("from", "from is out of range")),
        (None, Some(to)) => to
            .checked_sub_signed(window)
            .map(|from| (from, to))
            .ok_or_else(|| DomainError::invalid_field("to", "to is out of range")),
        (None, None) => Ok((now - window, now)),
    }
}

/// Owns movement records.
pub struct HistoryService {
    store: Arc<dyn HistoryStore>,
    locations: Arc<dyn LocationClient>,
    shutdown: CancellationToken,
}

impl HistoryService {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        locations: Arc<dyn LocationClient>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            locations,
            shutdown,
        }
    }

    /// Validates, truncates and appends a movement record.
    pub async fn add_record(&self, request: AddRecordRequest) -> Result<MovementRecord, DomainError> {
        request.validate()?;

        let record = self
            .store
            .add_record(AddRecordRequest {
                a: request.a.truncate(),
                b: request.b.truncate(),
                ..request
            })
            .await?;

        debug!(
            user_id = record.user_id,
            record_id = record.id,
            "Movement record added"
        );
        Ok(record)
    }

    /// Distance in meters travelled by `user_id` within `[from, to]`.
    pub async fn get_distance(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<f64, DomainError> {
        if user_id <= 0 {
            return Err(DomainError::invalid_field("user_id", "User id must be positive"));
        }
        if from > to {
            return Err(DomainError::invalid_field("from", "from must not be after to"));
        }
        self.store.get_distance(user_id, from, to).await
    }

    /// Distance for a username, resolved through the location service.
    pub async fn get_distance_by_username(
        &self,
        request: GetDistanceRequest,
    ) -> Result<DistanceResponse, DomainError> {
        request.validate()?;

        let (from, to) = resolve_distance_window(request.from, request.to, Utc::now())?;
        if from > to {
            return Err(DomainError::invalid_field("from", "from must not be after to"));
        }

        let cancel = self.shutdown.child_token();
        let user = self
            .locations
            .get_user_by_username(&cancel, &request.username)
            .await?;

        let distance = self.store.get_distance(user.id, from, to).await?;

        info!(
            user_id = user.id,
            from = %from,
            to = %to,
            distance,
            "Distance computed"
        );

        Ok(DistanceResponse { distance })
    }
}
