//! HTTP adapters for calls between the location and history services.
//!
//! Both clients speak to the other service's internal listener and translate
//! response statuses back into [`DomainError`]s, so the resilient decorators in
//! `domain::clients` can tell caller errors from backend failures.

pub mod history_client;
pub mod location_client;

pub use history_client::HttpHistoryClient;
pub use location_client::HttpLocationClient;

use std::time::Duration;

use domain::{DomainError, FieldViolation};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::ErrorBody;

/// Builds the shared reqwest client for one remote service.
pub(crate) fn build_client(timeout: Duration) -> Result<Client, DomainError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, DomainError> {
    let url = Url::parse(base_url)
        .map_err(|e| DomainError::Internal(format!("Invalid base URL {}: {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(DomainError::Internal(format!(
            "Invalid base URL {}: cannot be a base",
            base_url
        )));
    }
    Ok(url)
}

/// Appends path segments to `base`, percent-encoding each one.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, DomainError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DomainError::Internal(format!("Invalid base URL {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Sends a request unless `cancel` fires first.
pub(crate) async fn send(
    cancel: &CancellationToken,
    request: reqwest::RequestBuilder,
) -> Result<Response, DomainError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(DomainError::Cancelled),
        result = request.send() => result.map_err(transport_error),
    }
}

/// Decodes a success body, or maps an error status into the taxonomy.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DomainError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| DomainError::Internal(format!("Invalid response body: {}", e)));
    }

    let body = response.json::<ErrorBody>().await.ok();
    Err(status_error(status, body))
}

fn transport_error(err: reqwest::Error) -> DomainError {
    if err.is_timeout() {
        DomainError::Internal(format!("Request timed out: {}", err))
    } else {
        DomainError::Internal(format!("Request failed: {}", err))
    }
}

/// Maps a remote error status and body into a [`DomainError`].
pub(crate) fn status_error(status: StatusCode, body: Option<ErrorBody>) -> DomainError {
    let (message, details) = match body {
        Some(body) => (body.message, body.details.unwrap_or_default()),
        None => (
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            Vec::new(),
        ),
    };

    match status {
        StatusCode::BAD_REQUEST => DomainError::InvalidArgument {
            message,
            violations: details.into_iter().map(FieldViolation::from).collect(),
        },
        StatusCode::NOT_FOUND => DomainError::NotFound(message),
        StatusCode::CONFLICT => DomainError::AlreadyExists(message),
        StatusCode::UNPROCESSABLE_ENTITY => DomainError::FailedPrecondition(message),
        _ => DomainError::Internal(format!("Remote returned {}: {}", status.as_u16(), message)),
    }
}
