use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{DomainError, FieldViolation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        details: Vec<ValidationDetail>,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Request cancelled")]
    Cancelled,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl From<FieldViolation> for ValidationDetail {
    fn from(violation: FieldViolation) -> Self {
        Self {
            field: violation.field,
            message: violation.message,
        }
    }
}

impl From<ValidationDetail> for FieldViolation {
    fn from(detail: ValidationDetail) -> Self {
        FieldViolation::new(detail.field, detail.message)
    }
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::FailedPrecondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) | ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument { .. } => "invalid_argument",
            ApiError::NotFound(_) => "not_found",
            ApiError::AlreadyExists(_) => "already_exists",
            ApiError::FailedPrecondition(_) => "failed_precondition",
            ApiError::Internal(_) => "internal_error",
            ApiError::Unknown(_) => "unknown_error",
            ApiError::Cancelled => "cancelled",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.code().to_string();

        let (message, details) = match self {
            ApiError::InvalidArgument { message, details } => {
                let details = if details.is_empty() {
                    None
                } else {
                    Some(details)
                };
                (message, details)
            }
            ApiError::NotFound(msg)
            | ApiError::AlreadyExists(msg)
            | ApiError::FailedPrecondition(msg) => (msg, None),
            ApiError::Internal(msg) | ApiError::Unknown(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
            ApiError::Cancelled => ("The request was cancelled".to_string(), None),
        };

        let body = ErrorBody {
            error,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidArgument {
                message,
                violations,
            } => ApiError::InvalidArgument {
                message,
                details: violations.into_iter().map(ValidationDetail::from).collect(),
            },
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::AlreadyExists(msg) => ApiError::AlreadyExists(msg),
            DomainError::FailedPrecondition(msg) => ApiError::FailedPrecondition(msg),
            DomainError::Internal(msg) => ApiError::Internal(msg),
            DomainError::Unknown(msg) => ApiError::Unknown(msg),
            DomainError::Cancelled => ApiError::Cancelled,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_argument(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::invalid_argument(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_argument(rejection.body_text())
    }
}
