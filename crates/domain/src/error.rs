//! Domain error taxonomy shared by both services.

use serde::{Deserialize, Serialize};
use shared::resilience::{RemoteFailure, Rejection};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

/// A single invalid field, named by its dotted path (for example `a.latitude`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        violations: Vec<FieldViolation>,
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

    #[error("Cancelled")]
    Cancelled,
}

impl DomainError {
    /// Invalid argument for one field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let violation = FieldViolation::new(field, message);
        DomainError::InvalidArgument {
            message: format!("{}: {}", violation.field, violation.message),
            violations: vec![violation],
        }
    }

    /// Invalid argument without a specific field.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DomainError::InvalidArgument {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Field violations carried by an invalid argument error, empty for other kinds.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            DomainError::InvalidArgument { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Whether the callee rejected the request itself, as opposed to failing to serve it.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidArgument { .. }
                | DomainError::NotFound(_)
                | DomainError::AlreadyExists(_)
                | DomainError::FailedPrecondition(_)
        )
    }
}

impl From<Rejection> for DomainError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Cancelled => DomainError::Cancelled,
            Rejection::CircuitOpen | Rejection::TooManyRequests => {
                DomainError::Internal(rejection.to_string())
            }
        }
    }
}

impl RemoteFailure for DomainError {
    fn trips_breaker(&self) -> bool {
        matches!(self, DomainError::Internal(_) | DomainError::Unknown(_))
    }

    fn is_retryable(&self) -> bool {
        !self.is_caller_error() && !matches!(self, DomainError::Cancelled)
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut violations = Vec::new();
        collect_violations(&errors, "", &mut violations);
        violations.sort_by(|a, b| a.field.cmp(&b.field));

        let message = violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join(", ");

        DomainError::InvalidArgument {
            message,
            violations,
        }
    }
}

fn collect_violations(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        // Struct-level checks are reported under "__all__".
        let field: &str = if *field == "__all__" { "request" } else { field };
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(FieldViolation::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_violations(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_violations(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}
