use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::{HistoryService, LocationService};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{distance, health, records, users};
use crate::routes::health::HealthProbe;

/// Shared state of the location service routers.
#[derive(Clone)]
pub struct LocationState {
    pub service: Arc<LocationService>,
    pub health: HealthProbe,
}

/// Shared state of the history service routers.
#[derive(Clone)]
pub struct HistoryState {
    pub service: Arc<HistoryService>,
    pub health: HealthProbe,
}

impl FromRef<LocationState> for HealthProbe {
    fn from_ref(state: &LocationState) -> Self {
        state.health.clone()
    }
}

impl FromRef<HistoryState> for HealthProbe {
    fn from_ref(state: &HistoryState) -> Self {
        state.health.clone()
    }
}

/// The two routers of one service: client-facing and service-to-service.
pub struct Routers {
    pub public: Router,
    pub internal: Router,
}

/// Health and metrics routes, mounted on every public listener.
fn operational_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HealthProbe: FromRef<S>,
{
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
}

/// Global middleware (order matters: bottom layers run first).
fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
}

pub fn location_routers(state: LocationState, request_timeout: Duration) -> Routers {
    let public = Router::new()
        .route("/api/v1/users/radius", get(users::list_users_in_radius))
        .route(
            "/api/v1/users/:username/location",
            put(users::set_user_location),
        )
        .merge(operational_routes())
        .with_state(state.clone());

    let internal = Router::new()
        .route(
            "/internal/v1/users/:username",
            get(users::get_user_by_username),
        )
        .route("/internal/health/live", get(health::live))
        .with_state(state);

    Routers {
        public: with_middleware(public, request_timeout),
        internal: with_middleware(internal, request_timeout),
    }
}

pub fn history_routers(state: HistoryState, request_timeout: Duration) -> Routers {
    let public = Router::new()
        .route(
            "/api/v1/users/:username/distance",
            get(distance::get_distance),
        )
        .merge(operational_routes())
        .with_state(state.clone());

    let internal = Router::new()
        .route("/internal/v1/records", post(records::add_record))
        .route("/internal/health/live", get(health::live))
        .with_state(state);

    Routers {
        public: with_middleware(public, request_timeout),
        internal: with_middleware(internal, request_timeout),
    }
}
