//! Location repository: users, current locations and radius search.

use domain::models::{Location, User};
use domain::repositories::{LocationStore, SetLocationOutcome, UsersPage};
use domain::DomainError;
use shared::geo::{GeoPoint, METERS_PER_MILE};
use sqlx::{PgConnection, PgPool};

use super::{internal, violated_constraint};
use crate::entities::{LocationEntity, UserEntity};
use crate::metrics::QueryTimer;

const CONSTRAINT_USERS_USERNAME_KEY: &str = "users_username_key";
const CONSTRAINT_USERS_USERNAME_VALID: &str = "users_username_valid";
const CONSTRAINT_LOCATIONS_USER_ID_FKEY: &str = "locations_user_id_fkey";
const CONSTRAINT_LOCATIONS_LONGITUDE_VALID: &str = "locations_longitude_valid";
const CONSTRAINT_LOCATIONS_LATITUDE_VALID: &str = "locations_latitude_valid";

/// Repository for user and location database operations.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a user by username, locking the row until the transaction ends.
    async fn find_user_for_update(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_for_update");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, created_at, updated_at
            FROM users
            WHERE username = $1
            FOR UPDATE
            "#,
        )
        .bind(username)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    async fn insert_user(conn: &mut PgConnection, username: &str) -> Result<UserEntity, DomainError> {
        let timer = QueryTimer::new("insert_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (username)
            VALUES ($1)
            RETURNING id, username, created_at, updated_at
            "#,
        )
        .bind(username)
        .fetch_one(conn)
        .await;
        timer.record();

        result.map_err(|e| match violated_constraint(&e) {
            Some(CONSTRAINT_USERS_USERNAME_KEY) => {
                DomainError::AlreadyExists(format!("user {} already exists", username))
            }
            Some(CONSTRAINT_USERS_USERNAME_VALID) => {
                DomainError::invalid_field("username", "Username must be 4 to 16 letters or digits")
            }
            _ => internal(e),
        })
    }

    async fn find_location_for_update(
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<Option<LocationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_location_for_update");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            SELECT user_id, longitude, latitude, created_at, updated_at
            FROM locations
            WHERE user_id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await;
        timer.record();
        result
    }

    async fn upsert_location(
        conn: &mut PgConnection,
        user_id: i64,
        point: GeoPoint,
    ) -> Result<LocationEntity, DomainError> {
        let timer = QueryTimer::new("upsert_location");
        let result = sqlx::query_as::<_, LocationEntity>(
            r#"
            INSERT INTO locations (user_id, longitude, latitude)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT locations_pkey
            DO UPDATE SET longitude = EXCLUDED.longitude, latitude = EXCLUDED.latitude
            RETURNING user_id, longitude, latitude, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(point.longitude)
        .bind(point.latitude)
        .fetch_one(conn)
        .await;
        timer.record();

        result.map_err(|e| match violated_constraint(&e) {
            Some(CONSTRAINT_LOCATIONS_USER_ID_FKEY) => {
                DomainError::FailedPrecondition(format!("user {} does not exist", user_id))
            }
            Some(CONSTRAINT_LOCATIONS_LONGITUDE_VALID) => {
                DomainError::invalid_field("longitude", "Longitude must be between -180 and 180")
            }
            Some(CONSTRAINT_LOCATIONS_LATITUDE_VALID) => {
                DomainError::invalid_field("latitude", "Latitude must be between -90 and 90")
            }
            _ => internal(e),
        })
    }
}

#[async_trait::async_trait]
impl LocationStore for LocationRepository {
    /// Runs the whole get-or-create-then-upsert sequence in one transaction.
    /// Any error drops the transaction, which rolls it back.
    async fn set_user_location(
        &self,
        username: &str,
        point: GeoPoint,
    ) -> Result<SetLocationOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let (user, previous) = match Self::find_user_for_update(&mut tx, username)
            .await
            .map_err(internal)?
        {
            Some(user) => {
                let previous = Self::find_location_for_update(&mut tx, user.id)
                    .await
                    .map_err(internal)?;
                (user, previous)
            }
            None => (Self::insert_user(&mut tx, username).await?, None),
        };

        let current = Self::upsert_location(&mut tx, user.id, point).await?;

        tx.commit().await.map_err(internal)?;

        Ok(SetLocationOutcome {
            user: User::from(user),
            previous: previous.map(Location::from),
            current: Location::from(current),
        })
    }

    async fn list_users_in_radius(
        &self,
        center: GeoPoint,
        radius: f64,
        page_token: i64,
        page_size: i64,
    ) -> Result<UsersPage, DomainError> {
        let timer = QueryTimer::new("list_users_in_radius");
        // One extra row tells whether another page exists.
        let fetch_limit = page_size + 1;

        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT u.id, u.username, u.created_at, u.updated_at
            FROM users u
            INNER JOIN locations l ON l.user_id = u.id
            WHERE (point($1, $2) <@> point(l.longitude, l.latitude)) * $3 <= $4
              AND u.id > $5
            ORDER BY u.id
            LIMIT $6
            "#,
        )
        .bind(center.longitude)
        .bind(center.latitude)
        .bind(METERS_PER_MILE)
        .bind(radius)
        .bind(page_token)
        .bind(fetch_limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        let mut users: Vec<User> = result
            .map_err(internal)?
            .into_iter()
            .map(User::from)
            .collect();

        let has_more = users.len() as i64 > page_size;
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
        let timer = QueryTimer::new("find_user_by_username");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, username, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(internal)?
            .map(User::from)
            .ok_or_else(|| DomainError::NotFound(format!("user {} not found", username)))
    }
}
