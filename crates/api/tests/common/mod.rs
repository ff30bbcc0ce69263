//! Common test utilities for integration tests.
//!
//! Router fixtures run on the in-memory stores. Postgres fixtures connect to
//! `TEST_DATABASE_URL` and are skipped when it is unset.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::clients::{HistoryClient, LocalLocationClient, MockHistoryClient};
use domain::repositories::{InMemoryHistoryStore, InMemoryLocationStore};
use domain::services::{HistoryService, LocationService};
use fake::Fake;
use geotracker_api::app::{history_routers, location_routers, HistoryState, LocationState, Routers};
use geotracker_api::routes::health::HealthProbe;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Location service on an in-memory store.
pub struct LocationFixture {
    pub routers: Routers,
    pub service: Arc<LocationService>,
    pub store: Arc<InMemoryLocationStore>,
}

pub fn location_fixture(history: Arc<dyn HistoryClient>) -> LocationFixture {
    let store = Arc::new(InMemoryLocationStore::new());
    let service = Arc::new(LocationService::new(
        store.clone(),
        history,
        CancellationToken::new(),
    ));
    let state = LocationState {
        service: service.clone(),
        health: HealthProbe {
            service: "location",
            pool: None,
            remote: None,
        },
    };

    LocationFixture {
        routers: location_routers(state, REQUEST_TIMEOUT),
        service,
        store,
    }
}

/// Location service whose history submissions are recorded by a mock.
pub fn location_fixture_with_mock() -> (LocationFixture, Arc<MockHistoryClient>) {
    let history = Arc::new(MockHistoryClient::new());
    (location_fixture(history.clone()), history)
}

/// History service on an in-memory store, resolving usernames through an
/// in-process location service.
pub struct HistoryFixture {
    pub routers: Routers,
    pub service: Arc<HistoryService>,
    pub store: Arc<InMemoryHistoryStore>,
    pub locations: Arc<LocationService>,
}

pub fn history_fixture() -> HistoryFixture {
    let locations = Arc::new(LocationService::new(
        Arc::new(InMemoryLocationStore::new()),
        Arc::new(MockHistoryClient::new()),
        CancellationToken::new(),
    ));
    let store = Arc::new(InMemoryHistoryStore::new());
    let service = Arc::new(HistoryService::new(
        store.clone(),
        Arc::new(LocalLocationClient::new(locations.clone())),
        CancellationToken::new(),
    ));
    let state = HistoryState {
        service: service.clone(),
        health: HealthProbe {
            service: "history",
            pool: None,
            remote: None,
        },
    };

    HistoryFixture {
        routers: history_routers(state, REQUEST_TIMEOUT),
        service,
        store,
        locations,
    }
}

/// Generated username matching `^[a-zA-Z0-9]{4,16}$`.
pub fn unique_username() -> String {
    format!("user{}", (100_000..999_999).fake::<u32>())
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn spawn_server(router: Router, shutdown: CancellationToken) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(geotracker_api::server::serve_until(
        "test", listener, router, shutdown,
    ));
    format!("http://{}", addr)
}

/// Poll `check` until it returns true or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Connect to the test database, or `None` when `TEST_DATABASE_URL` is unset.
pub async fn test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}
