//! Location mutation and radius search.

use std::sync::Arc;

use chrono::Utc;
use shared::pagination::{decode_page_cursor, encode_page_cursor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::clients::HistoryClient;
use crate::error::DomainError;
use crate::models::location::{
    ListUsersInRadiusRequest, ListUsersInRadiusResponse, SetUserLocationRequest,
    SetUserLocationResponse,
};
use crate::models::record::AddRecordRequest;
use crate::models::User;
use crate::repositories::LocationStore;

/// Owns the write path for users and their current location.
pub struct LocationService {
    store: Arc<dyn LocationStore>,
    history: Arc<dyn HistoryClient>,
    shutdown: CancellationToken,
}

impl LocationService {
    /// `shutdown` cancels pending history submissions when the process stops.
    pub fn new(
        store: Arc<dyn LocationStore>,
        history: Arc<dyn HistoryClient>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            history,
            shutdown,
        }
    }

    /// Sets a user's location, creating the user on first sight.
    ///
    /// When the user already had a location, the movement is submitted to the
    /// history service in the background. That submission never affects the
    /// returned value.
    pub async fn set_user_location(
        &self,
        request: SetUserLocationRequest,
    ) -> Result<SetUserLocationResponse, DomainError> {
        request.validate()?;

        let point = request.point().truncate();
        let outcome = self.store.set_user_location(&request.username, point).await?;

        if let Some(previous) = outcome.previous {
            self.submit_movement(AddRecordRequest {
                user_id: outcome.user.id,
                a: previous.point,
                b: outcome.current.point,
                timestamp: Utc::now(),
            });
        }

        info!(
            user_id = outcome.user.id,
            username = %outcome.user.username,
            longitude = outcome.current.point.longitude,
            latitude = outcome.current.point.latitude,
            "User location set"
        );

        Ok(SetUserLocationResponse {
            longitude: outcome.current.point.longitude,
            latitude: outcome.current.point.latitude,
        })
    }

    fn submit_movement(&self, record: AddRecordRequest) {
        let history = self.history.clone();
        let cancel = self.shutdown.child_token();

        tokio::spawn(async move {
            let user_id = record.user_id;
            match history.add_record(&cancel, record).await {
                Ok(stored) => debug!(user_id, record_id = stored.id, "Movement recorded"),
                Err(e) => warn!(user_id, error = %e, "Failed to record movement"),
            }
        });
    }

    /// One page of users whose location is within `radius` meters.
    pub async fn list_users_in_radius(
        &self,
        request: ListUsersInRadiusRequest,
    ) -> Result<ListUsersInRadiusResponse, DomainError> {
        request.validate()?;

        let (page_token, page_size) = match (&request.page_token, request.page_size) {
            (Some(cursor), None) => decode_page_cursor(cursor)
                .map_err(|e| DomainError::invalid_field("page_token", e.to_string()))?,
            (None, Some(page_size)) => (0, page_size),
            _ => {
                return Err(DomainError::invalid_field(
                    "request",
                    "Provide exactly one of page_token or page_size",
                ))
            }
        };
        if page_size <= 0 {
            return Err(DomainError::invalid_field(
                "page_size",
                "Page size must be positive",
            ));
        }

        let center = request.point().truncate();
        let page = self
            .store
            .list_users_in_radius(center, request.radius, page_token, page_size)
            .await?;

        Ok(ListUsersInRadiusResponse {
            users: page.users,
            next_page_cursor: page
                .next_page_token
                .map(|token| encode_page_cursor(token, page_size)),
        })
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, DomainError> {
        if username.is_empty() {
            return Err(DomainError::invalid_field("username", "Username is required"));
        }
        self.store.get_user_by_username(username).await
    }
}
