//! Client port for the history service.

use std::sync::Arc;

use shared::resilience::Resilience;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::DomainError;
use crate::models::record::{AddRecordRequest, MovementRecord};
use crate::services::history::HistoryService;

/// Remote access to the movement ledger.
#[async_trait::async_trait]
pub trait HistoryClient: Send + Sync {
    async fn add_record(
        &self,
        cancel: &CancellationToken,
        record: AddRecordRequest,
    ) -> Result<MovementRecord, DomainError>;
}

/// Wraps another client with retry and a shared circuit breaker.
pub struct ResilientHistoryClient {
    inner: Arc<dyn HistoryClient>,
    resilience: Arc<Resilience>,
}

impl ResilientHistoryClient {
    pub fn new(inner: Arc<dyn HistoryClient>, resilience: Arc<Resilience>) -> Self {
        Self { inner, resilience }
    }
}

#[async_trait::async_trait]
impl HistoryClient for ResilientHistoryClient {
    async fn add_record(
        &self,
        cancel: &CancellationToken,
        record: AddRecordRequest,
    ) -> Result<MovementRecord, DomainError> {
        self.resilience
            .execute(cancel, || self.inner.add_record(cancel, record.clone()))
            .await
    }
}

/// Calls a [`HistoryService`] in the same process.
pub struct LocalHistoryClient {
    service: Arc<HistoryService>,
}

impl LocalHistoryClient {
    pub fn new(service: Arc<HistoryService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl HistoryClient for LocalHistoryClient {
    async fn add_record(
        &self,
        _cancel: &CancellationToken,
        record: AddRecordRequest,
    ) -> Result<MovementRecord, DomainError> {
        self.service.add_record(record).await
    }
}

/// Mock client that records every request.
#[derive(Debug, Default)]
pub struct MockHistoryClient {
    requests: Mutex<Vec<AddRecordRequest>>,
    should_fail: bool,
}

impl MockHistoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose calls all fail with an internal error.
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    pub async fn requests(&self) -> Vec<AddRecordRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl HistoryClient for MockHistoryClient {
    async fn add_record(
        &self,
        _cancel: &CancellationToken,
        record: AddRecordRequest,
    ) -> Result<MovementRecord, DomainError> {
        let mut requests = self.requests.lock().await;
        requests.push(record.clone());

        if self.should_fail {
            return Err(DomainError::Internal("history service unavailable".into()));
        }

        Ok(MovementRecord {
            id: requests.len() as i64,
            user_id: record.user_id,
            a: record.a,
            b: record.b,
            timestamp: record.timestamp,
        })
    }
}
