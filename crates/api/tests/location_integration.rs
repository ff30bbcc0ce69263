//! Integration tests for the location service endpoints.
//!
//! Run against the in-memory store; history submissions go to a mock.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    eventually, get_request, json_request, location_fixture, location_fixture_with_mock,
    parse_response_body, unique_username,
};
use domain::clients::MockHistoryClient;
use serde_json::json;
use tower::ServiceExt;

fn put_location(username: &str, longitude: f64, latitude: f64) -> axum::http::Request<axum::body::Body> {
    json_request(
        Method::PUT,
        &format!("/api/v1/users/{}/location", username),
        json!({ "longitude": longitude, "latitude": latitude }),
    )
}

// ============================================================================
// Set User Location
// ============================================================================

#[tokio::test]
async fn test_set_location_creates_user() {
    let (fixture, history) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(put_location("newuser", 1.0, 1.0))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({ "longitude": 1.0, "latitude": 1.0 }));
    assert_eq!(fixture.store.user_count().await, 1);

    // First location: nothing moved.
    tokio::task::yield_now().await;
    assert!(history.requests().await.is_empty());
}

#[tokio::test]
async fn test_second_location_submits_movement() {
    let (fixture, history) = location_fixture_with_mock();
    let app = fixture.routers.public.clone();

    app.clone().oneshot(put_location("walker01", 1.0, 1.0)).await.unwrap();
    let response = app.oneshot(put_location("walker01", 2.0, 2.0)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(fixture.store.user_count().await, 1);

    let mock = &history;
    assert!(eventually(move || async move { mock.requests().await.len() == 1 }).await);
    let requests = history.requests().await;
    let request = &requests[0];
    assert_eq!((request.a.longitude, request.a.latitude), (1.0, 1.0));
    assert_eq!((request.b.longitude, request.b.latitude), (2.0, 2.0));
}

#[tokio::test]
async fn test_set_location_truncates_coordinates() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(put_location(&unique_username(), 12.3456789012, -45.6789012345))
        .await
        .unwrap();

    let body = parse_response_body(response).await;
    assert_eq!(body["longitude"].as_f64().unwrap(), 12.34567890);
    assert_eq!(body["latitude"].as_f64().unwrap(), -45.67890123);
}

#[tokio::test]
async fn test_set_location_accepts_boundaries() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(put_location(&unique_username(), -180.0, 90.0))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_location_out_of_range() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(put_location(&unique_username(), 0.0, 90.5))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "invalid_argument");
    assert_eq!(body["details"][0]["field"], "latitude");
    assert_eq!(fixture.store.user_count().await, 0);
}

#[tokio::test]
async fn test_set_location_invalid_username() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(put_location("ab", 0.0, 0.0))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "username");
}

#[tokio::test]
async fn test_set_location_malformed_body() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/users/walker01/location",
            json!({ "longitude": "east" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn test_failing_history_does_not_change_response() {
    let history = Arc::new(MockHistoryClient::failing());
    let fixture = location_fixture(history.clone());
    let app = fixture.routers.public.clone();

    app.clone().oneshot(put_location("walker02", 1.0, 1.0)).await.unwrap();
    let response = app.oneshot(put_location("walker02", 3.0, 3.0)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body, json!({ "longitude": 3.0, "latitude": 3.0 }));
    let mock = &history;
    assert!(eventually(move || async move { mock.requests().await.len() == 1 }).await);
}

// ============================================================================
// Radius Search
// ============================================================================

#[tokio::test]
async fn test_radius_search_paginates() {
    let (fixture, _) = location_fixture_with_mock();
    let app = fixture.routers.public.clone();

    for (i, username) in ["alpha001", "bravo002", "charlie3"].iter().enumerate() {
        let offset = i as f64 * 0.0001;
        app.clone()
            .oneshot(put_location(username, 10.0 + offset, 20.0))
            .await
            .unwrap();
    }
    // Far away, never matched.
    app.clone().oneshot(put_location("faraway1", -100.0, -20.0)).await.unwrap();

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/v1/users/radius?longitude=10&latitude=20&radius=1000&page_size=2",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = parse_response_body(response).await;
    let users = first["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "alpha001");
    assert_eq!(users[1]["username"], "bravo002");
    let cursor = first["next_page_cursor"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get_request(&format!(
            "/api/v1/users/radius?longitude=10&latitude=20&radius=1000&page_token={}",
            cursor
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = parse_response_body(response).await;
    let users = second["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "charlie3");
    assert!(second.get("next_page_cursor").is_none());
}

#[tokio::test]
async fn test_radius_search_requires_page_selector() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/api/v1/users/radius?longitude=10&latitude=20&radius=1000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_radius_search_rejects_bad_cursor() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request(
            "/api/v1/users/radius?longitude=10&latitude=20&radius=1000&page_token=%21%21%21",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["details"][0]["field"], "page_token");
}

#[tokio::test]
async fn test_radius_search_rejects_negative_radius() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request(
            "/api/v1/users/radius?longitude=10&latitude=20&radius=-1&page_size=10",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Internal Lookup
// ============================================================================

#[tokio::test]
async fn test_internal_get_user() {
    let (fixture, _) = location_fixture_with_mock();
    fixture
        .routers
        .public
        .clone()
        .oneshot(put_location("lookup01", 5.0, 5.0))
        .await
        .unwrap();

    let response = fixture
        .routers
        .internal
        .clone()
        .oneshot(get_request("/internal/v1/users/lookup01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["username"], "lookup01");
    assert!(body["id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_internal_get_unknown_user() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .internal
        .clone()
        .oneshot(get_request("/internal/v1/users/nobody01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_internal_routes_not_public() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/internal/v1/users/lookup01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_request_id() {
    let (fixture, _) = location_fixture_with_mock();

    let response = fixture
        .routers
        .public
        .clone()
        .oneshot(get_request("/api/health"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "location");
}
