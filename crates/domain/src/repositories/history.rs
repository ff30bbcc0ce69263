//! History side storage port.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::error::DomainError;
use crate::models::record::{AddRecordRequest, MovementRecord};

/// Append-only storage for movement records.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Persists a record. Points must already be truncated.
    async fn add_record(&self, record: AddRecordRequest) -> Result<MovementRecord, DomainError>;

    /// Sum of segment lengths in meters for records with timestamp in `[from, to]`.
    async fn get_distance(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<f64, DomainError>;
}

/// In-memory [`HistoryStore`] for tests and local runs.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    records: Mutex<Vec<MovementRecord>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored records, oldest first.
    pub async fn records(&self) -> Vec<MovementRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn add_record(&self, record: AddRecordRequest) -> Result<MovementRecord, DomainError> {
        for (name, point) in [("a", &record.a), ("b", &record.b)] {
            if !(-180.0..=180.0).contains(&point.longitude) {
                return Err(DomainError::invalid_field(
                    format!("{}.longitude", name),
                    "value out of range",
                ));
            }
            if !(-90.0..=90.0).contains(&point.latitude) {
                return Err(DomainError::invalid_field(
                    format!("{}.latitude", name),
                    "value out of range",
                ));
            }
        }

        let mut records = self.records.lock().await;
        let stored = MovementRecord {
            id: records.len() as i64 + 1,
            user_id: record.user_id,
            a: record.a,
            b: record.b,
            timestamp: record.timestamp,
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn get_distance(
        &self,
        user_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<f64, DomainError> {
        let records = self.records.lock().await;
        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id && r.timestamp >= from && r.timestamp <= to)
            .map(MovementRecord::distance)
            .sum())
    }
}
