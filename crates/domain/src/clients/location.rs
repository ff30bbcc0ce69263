//! Client port for the location service, used by the history service to
//! resolve usernames.

use std::sync::Arc;

use shared::resilience::Resilience;
use tokio_util::sync::CancellationToken;

use crate::error::DomainError;
use crate::models::User;
use crate::services::location::LocationService;

#[async_trait::async_trait]
pub trait LocationClient: Send + Sync {
    async fn get_user_by_username(
        &self,
        cancel: &CancellationToken,
        username: &str,
    ) -> Result<User, DomainError>;
}

/// Wraps another client with retry and a shared circuit breaker.
pub struct ResilientLocationClient {
    inner: Arc<dyn LocationClient>,
    resilience: Arc<Resilience>,
}

impl ResilientLocationClient {
    pub fn new(inner: Arc<dyn LocationClient>, resilience: Arc<Resilience>) -> Self {
        Self { inner, resilience }
    }
}

#[async_trait::async_trait]
impl LocationClient for ResilientLocationClient {
    async fn get_user_by_username(
        &self,
        cancel: &CancellationToken,
        username: &str,
    ) -> Result<User, DomainError> {
        self.resilience
            .execute(cancel, || self.inner.get_user_by_username(cancel, username))
            .await
    }
}

/// Calls a [`LocationService`] in the same process.
pub struct LocalLocationClient {
    service: Arc<LocationService>,
}

impl LocalLocationClient {
    pub fn new(service: Arc<LocationService>) -> Self {
        Self { service }
    }
}

#[async_trait::async_trait]
impl LocationClient for LocalLocationClient {
    async fn get_user_by_username(
        &self,
        _cancel: &CancellationToken,
        username: &str,
    ) -> Result<User, DomainError> {
        self.service.get_user_by_username(username).await
    }
}
