//! Movement record repository.

use chrono::{DateTime, Utc};
use domain::models::record::{AddRecordRequest, MovementRecord};
use domain::repositories::HistoryStore;
use domain::DomainError;
use shared::geo::METERS_PER_MILE;
use sqlx::PgPool;

use super::{internal, violated_constraint};
use crate::entities::RecordEntity;
use crate::metrics::QueryTimer;

/// Check constraints on the records table and the field each one guards.
const POINT_CONSTRAINTS: [(&str, &str, &str); 4] = [
    ("records_a_longitude_valid", "a.longitude", "Longitude must be between -180 and 180"),
    ("records_a_latitude_valid", "a.latitude", "Latitude must be between -90 and 90"),
    ("records_b_longitude_valid", "b.longitude", "Longitude must be between -180 and 180"),
    ("records_b_latitude_valid", "b.latitude", "Latitude must be between -90 and 90"),
];

/// Repository for movement record database operations.
#[derive(Clone)]
pub struct RecordRepository {
    pool: PgPool,
}

impl RecordRepository {
    /// Creates a new RecordRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl HistoryStore for RecordRepository {
    async fn add_record(&self, record: AddRecordRequest) -> Result<MovementRecord, DomainError> {
        let timer = QueryTimer::new("insert_record");
        let result = sqlx::query_as::<_, RecordEntity>(
            r#"
            INSERT INTO records (user_id, a_longitude, a_latitude, b_longitude, b_latitude, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, a_longitude, a_latitude, b_longitude, b_latitude, recorded_at
            "#,
        )
        .bind(record.user_id)
        .bind(record.a.longitude)
        .bind(record.a.latitude)
        .bind(record.b.longitude)
        .bind(record.b.latitude)
        .bind(record.timestamp)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map(MovementRecord::from).map_err(|e| {
            let violated = violated_constraint(&e).and_then(|name| {
                POINT_CONSTRAINTS
                    .iter()
                    .find(|(constraint, _, _)| *constraint == name)
            });
            match violated {
                Some((_, field, message)) => DomainError::invalid_field(*field, *message),
                None => internal(e),
            }
        })
    }

    async fn get_distance(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<f64, DomainError> {
        let timer = QueryTimer::new("sum_record_distance");
        let result = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(point(a_longitude, a_latitude) <@> point(b_longitude, b_latitude)), 0) * $4
            FROM records
            WHERE user_id = $1 AND recorded_at >= $2 AND recorded_at <= $3
            "#,
        )
        .bind(user_id)
        .bind(from)
        .bind(to)
        .bind(METERS_PER_MILE)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map_err(internal)
    }
}
