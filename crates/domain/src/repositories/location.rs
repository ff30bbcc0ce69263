//! Location side storage port.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use shared::geo::GeoPoint;
use shared::validation::validate_username;
use tokio::sync::Mutex;

use crate::error::DomainError;
use crate::models::{Location, User};

/// Result of a transactional location write.
#[derive(Debug, Clone, PartialEq)]
pub struct SetLocationOutcome {
    pub user: User,
    /// Location before the write, absent for a new user or a user without a location.
    pub previous: Option<Location>,
    pub current: Location,
}

/// One page of a radius search.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UsersPage {
    pub users: Vec<User>,
    /// Id of the last returned user when more users match.
    pub next_page_token: Option<i64>,
}

/// Storage for users and their current location.
#[async_trait::async_trait]
pub trait LocationStore: Send + Sync {
    /// Gets or creates the user and upserts its location, atomically.
    ///
    /// `point` must already be truncated.
    async fn set_user_location(
        &self,
        username: &str,
        point: GeoPoint,
    ) -> Result<SetLocationOutcome, DomainError>;

    /// Users with a location within `radius` meters of `center`, ordered by id,
    /// with ids greater than `page_token`.
    async fn list_users_in_radius(
        &self,
        center: GeoPoint,
        radius: f64,
        page_token: i64,
        page_size: i64,
    ) -> Result<UsersPage, DomainError>;

    async fn get_user_by_username(&self, username: &str) -> Result<User, DomainError>;
}

#[derive(Debug, Default)]
struct LocationState {
    next_id: i64,
    users: BTreeMap<i64, User>,
    ids_by_username: HashMap<String, i64>,
    locations: HashMap<i64, Location>,
}

/// In-memory [`LocationStore`] for tests and local runs.
///
/// Distances use the haversine formula.
#[derive(Debug, Default)]
pub struct InMemoryLocationStore {
    state: Mutex<LocationState>,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn location_of(&self, user_id: i64) -> Option<Location> {
        self.state.lock().await.locations.get(&user_id).cloned()
    }
}

#[async_trait::async_trait]
impl LocationStore for InMemoryLocationStore {
    async fn set_user_location(
        &self,
        username: &str,
        point: GeoPoint,
    ) -> Result<SetLocationOutcome, DomainError> {
        // Mirrors the table constraints.
        if let Err(e) = validate_username(username) {
            return Err(DomainError::invalid_field(
                "username",
                e.message.map(|m| m.to_string()).unwrap_or_default(),
            ));
        }
        if !(-180.0..=180.0).contains(&point.longitude) {
            return Err(DomainError::invalid_field("longitude", "value out of range"));
        }
        if !(-90.0..=90.0).contains(&point.latitude) {
            return Err(DomainError::invalid_field("latitude", "value out of range"));
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Utc::now();

        let user = match state.ids_by_username.get(username) {
            Some(id) => state
                .users
                .get(id)
                .cloned()
                .ok_or_else(|| DomainError::Internal("user index out of sync".into()))?,
            None => {
                state.next_id += 1;
                let user = User {
                    id: state.next_id,
                    username: username.to_string(),
                    created_at: now,
                    updated_at: now,
                };
                state.users.insert(user.id, user.clone());
                state.ids_by_username.insert(user.username.clone(), user.id);
                user
            }
        };

        let previous = state.locations.get(&user.id).cloned();
        let current = Location {
            user_id: user.id,
            point,
            created_at: previous.as_ref().map(|l| l.created_at).unwrap_or(now),
            updated_at: now,
        };
        state.locations.insert(user.id, current.clone());

        Ok(SetLocationOutcome {
            user,
            previous,
            current,
        })
    }

    async fn list_users_in_radius(
        &self,
        center: GeoPoint,
        radius: f64,
        page_token: i64,
        page_size: i64,
    ) -> Result<UsersPage, DomainError> {
        let state = self.state.lock().await;
        let limit = usize::try_from(page_size).unwrap_or(0);

        let mut users: Vec<User> = state
            .users
            .range(page_token.saturating_add(1)..)
            .filter(|(id, _)| {
                state
                    .locations
                    .get(id)
                    .is_some_and(|l| center.haversine_distance(&l.point) <= radius)
            })
            .map(|(_, user)| user.clone())
            .take(limit + 1)
            .collect();

        let has_more = users.len() > limit;
        if has_more {
            users.pop();
        }
        let next_page_token = if has_more {
            users.last().map(|u| u.id)
        } else {
            None
        };

        Ok(UsersPage {
            users,
            next_page_token,
        })
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, DomainError> {
        let state = self.state.lock().await;
        state
            .ids_by_username
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("user {} not found", username)))
    }
}
