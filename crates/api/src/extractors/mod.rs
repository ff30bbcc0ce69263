//! Request extractors that report malformed input in the API error format.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor with [`ApiError`] rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// Query string extractor with [`ApiError`] rejections.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(AppQuery(value))
    }
}

/// Path parameter extractor with [`ApiError`] rejections.
#[derive(Debug, Clone)]
pub struct AppPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(AppPath(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request as HttpRequest};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Point {
        longitude: f64,
    }

    #[tokio::test]
    async fn test_json_extracts_body() {
        let req = HttpRequest::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"longitude": 1.5}"#))
            .unwrap();

        let AppJson(point) = AppJson::<Point>::from_request(req, &()).await.unwrap();
        assert_eq!(point.longitude, 1.5);
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_argument() {
        let req = HttpRequest::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"longitude": "east"}"#))
            .unwrap();

        let err = AppJson::<Point>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_bad_query_is_invalid_argument() {
        let req = HttpRequest::builder()
            .uri("/radius?longitude=abc")
            .body(Body::empty())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let err = AppQuery::<Point>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument { .. }));
    }
}
