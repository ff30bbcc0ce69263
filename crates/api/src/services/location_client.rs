//! HTTP client for the location service's internal API.

use std::time::Duration;

use domain::clients::LocationClient;
use domain::models::User;
use domain::DomainError;
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;

use super::{build_client, decode, join_segments, parse_base_url, send};

/// Looks users up through `GET /internal/v1/users/{username}`.
#[derive(Debug, Clone)]
pub struct HttpLocationClient {
    client: Client,
    base_url: Url,
}

impl HttpLocationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: parse_base_url(base_url)?,
        })
    }
}

#[async_trait::async_trait]
impl LocationClient for HttpLocationClient {
    async fn get_user_by_username(
        &self,
        cancel: &CancellationToken,
        username: &str,
    ) -> Result<User, DomainError> {
        let url = join_segments(&self.base_url, &["internal", "v1", "users", username])?;
        let response = send(cancel, self.client.get(url)).await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use chrono::Utc;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn router() -> Router {
        Router::new().route(
            "/internal/v1/users/:username",
            get(|Path(username): Path<String>| async move {
                if username == "walker01" {
                    let now = Utc::now();
                    Ok(Json(User {
                        id: 3,
                        username,
                        created_at: now,
                        updated_at: now,
                    }))
                } else {
                    Err((
                        StatusCode::NOT_FOUND,
                        Json(serde_json::json!({
                            "error": "not_found",
                            "message": format!("user {} not found", username),
                        })),
                    ))
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_get_user_found() {
        let base = serve(router()).await;
        let client = HttpLocationClient::new(&base, Duration::from_secs(5)).unwrap();

        let user = client
            .get_user_by_username(&CancellationToken::new(), "walker01")
            .await
            .unwrap();

        assert_eq!(user.id, 3);
    }

    #[tokio::test]
    async fn test_get_user_not_found_keeps_message() {
        let base = serve(router()).await;
        let client = HttpLocationClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .get_user_by_username(&CancellationToken::new(), "ghost01")
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::NotFound("user ghost01 not found".to_string()));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_internal() {
        // Port 9 (discard) is not expected to accept connections.
        let client =
            HttpLocationClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();

        let err = client
            .get_user_by_username(&CancellationToken::new(), "walker01")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
    }
}
