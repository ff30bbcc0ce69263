//! Integration tests for the history service endpoints.
//!
//! Run against the in-memory store; usernames resolve through an in-process
//! location service.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, SecondsFormat, Utc};
use common::{get_request, history_fixture, json_request, parse_response_body, HistoryFixture};
use domain::models::location::SetUserLocationRequest;
use serde_json::json;
use shared::geo::GeoPoint;
use tower::ServiceExt;

async fn create_user(fixture: &HistoryFixture, username: &str) -> i64 {
    fixture
        .locations
        .set_user_location(SetUserLocationRequest {
            username: username.to_string(),
            longitude: 0.0,
            latitude: 0.0,
        })
        .await
        .unwrap();
    fixture
        .locations
        .get_user_by_username(username)
        .await
        .unwrap()
        .id
}

fn record_body(user_id: i64, timestamp: chrono::DateTime<Utc>) -> serde_json::Value {
    json!({
        "user_id": user_id,
        "a": { "longitude": 0.0, "latitude": 0.0 },
        "b": { "longitude": 0.0, "latitude": 1.0 },
        "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}

fn one_degree() -> f64 {
    GeoPoint::new(0.0, 0.0).haversine_distance(&GeoPoint::new(0.0, 1.0))
}

// ============================================================================
// Add Record (internal)
// ============================================================================

#[tokio::test]
async fn test_add_record_created() {
    let fixture = history_fixture();

    let response = fixture
        .routers
        .internal
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/internal/v1/records",
            record_body(1, Utc::now()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["user_id"], 1);
    assert_eq!(fixture.store.records().await.len(), 1);
}

#[tokio::test]
async fn test_add_record_invalid_point_names_field() {
    let fixture = history_fixture();
    let mut body = record_body(1, Utc::now());
    body["b"]["latitude"] = json!(91.0);

    let response = fixture
        .routers
        .internal
        .clone()
        .oneshot(json_request(Method::POST, "/internal/v1/records", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "b.latitude");
    assert!(fixture.store.records().await.is_empty());
}

#[tokio::test]
async fn test_add_record_not_served_publicly() {
    let fixture = history_fixture();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/internal/v1/records",
            record_body(1, Utc::now()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Distance
// ============================================================================

#[tokio::test]
async fn test_distance_zero_without_records() {
    let fixture = history_fixture();
    create_user(&fixture, "idle0001").await;

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/api/v1/users/idle0001/distance"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["distance"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn test_distance_sums_records_in_window() {
    let fixture = history_fixture();
    let user_id = create_user(&fixture, "runner01").await;
    let now = Utc::now();

    for timestamp in [
        now - Duration::hours(2),
        now - Duration::hours(1),
        now - Duration::hours(30),
    ] {
        fixture
            .routers
            .internal
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/internal/v1/records",
                record_body(user_id, timestamp),
            ))
            .await
            .unwrap();
    }

    let from = (now - Duration::hours(3)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let to = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/users/runner01/distance?from={}&to={}",
            from, to
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let distance = body["distance"].as_f64().unwrap();
    assert!((distance - 2.0 * one_degree()).abs() < 1e-6);
}

#[tokio::test]
async fn test_distance_unknown_user() {
    let fixture = history_fixture();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/api/v1/users/ghost001/distance"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_distance_inverted_window() {
    let fixture = history_fixture();
    create_user(&fixture, "runner02").await;

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request(
            "/api/v1/users/runner02/distance?from=2024-01-02T00:00:00Z&to=2024-01-01T00:00:00Z",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_distance_malformed_timestamp() {
    let fixture = history_fixture();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/api/v1/users/runner03/distance?from=yesterday"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn test_history_health() {
    let fixture = history_fixture();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/api/health/live"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "alive");
}
