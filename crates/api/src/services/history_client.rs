//! HTTP client for the history service's internal API.

use std::time::Duration;

use domain::clients::HistoryClient;
use domain::models::record::{AddRecordRequest, MovementRecord};
use domain::DomainError;
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{build_client, decode, join_segments, parse_base_url, send};

/// Submits movement records to `POST /internal/v1/records`.
#[derive(Debug, Clone)]
pub struct HttpHistoryClient {
    client: Client,
    records_url: Url,
}

impl HttpHistoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let base = parse_base_url(base_url)?;
        Ok(Self {
            client: build_client(timeout)?,
            records_url: join_segments(&base, &["internal", "v1", "records"])?,
        })
    }
}

#[async_trait::async_trait]
impl HistoryClient for HttpHistoryClient {
    async fn add_record(
        &self,
        cancel: &CancellationToken,
        record: AddRecordRequest,
    ) -> Result<MovementRecord, DomainError> {
        debug!(user_id = record.user_id, url = %self.records_url, "Submitting movement record");
        let request = self.client.post(self.records_url.clone()).json(&record);
        let response = send(cancel, request).await?;
        decode(response).await
    }
}
