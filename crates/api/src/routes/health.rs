//! Health check endpoint handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use shared::resilience::{CircuitState, Resilience};
use sqlx::PgPool;

/// Dependencies inspected by the health endpoints.
#[derive(Clone)]
pub struct HealthProbe {
    pub service: &'static str,
    /// Absent when the service runs on in-memory storage.
    pub pool: Option<PgPool>,
    pub remote: Option<Arc<Resilience>>,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteHealth>,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Status of the other service as seen through its circuit breaker.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RemoteHealth {
    pub name: String,
    /// Whether calls are currently let through (circuit not open).
    pub available: bool,
    pub circuit_state: String,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

impl HealthProbe {
    async fn database(&self) -> Option<DatabaseHealth> {
        let pool = self.pool.as_ref()?;
        let start = std::time::Instant::now();
        let connected = persistence::db::ping(pool).await.is_ok();
        let latency_ms = start.elapsed().as_millis() as u64;

        persistence::metrics::record_pool_metrics(pool);

        Some(DatabaseHealth {
            connected,
            latency_ms: connected.then_some(latency_ms),
        })
    }

    async fn remote(&self) -> Option<RemoteHealth> {
        let resilience = self.remote.as_ref()?;
        let state = resilience.circuit_state().await;
        Some(RemoteHealth {
            name: resilience.breaker().name().to_string(),
            available: state != CircuitState::Open,
            circuit_state: state.as_str().to_string(),
        })
    }
}

/// Full health check endpoint.
///
/// Reports database connectivity and the remote circuit breaker state. An open
/// circuit degrades the service but does not make it unhealthy.
pub async fn health_check(
    State(probe): State<HealthProbe>,
) -> (StatusCode, Json<HealthResponse>) {
    let database = probe.database().await;
    let remote = probe.remote().await;

    let db_connected = database.as_ref().map_or(true, |db| db.connected);
    let remote_available = remote.as_ref().map_or(true, |r| r.available);

    let status = match (db_connected, remote_available) {
        (false, _) => "unhealthy",
        (true, false) => "degraded",
        (true, true) => "healthy",
    };

    let response = HealthResponse {
        status: status.to_string(),
        service: probe.service.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
        remote,
    };

    let code = if db_connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(response))
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 OK if the service can accept traffic (database connected).
pub async fn ready(State(probe): State<HealthProbe>) -> Result<Json<StatusResponse>, StatusCode> {
    let db_connected = match &probe.pool {
        Some(pool) => persistence::db::ping(pool).await.is_ok(),
        None => true,
    };

    if db_connected {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
        }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
