//! Repository implementations for database operations.
//!
//! Each repository implements a storage port from `domain::repositories` and
//! translates database errors into `DomainError` at this boundary.

pub mod location;
pub mod record;

pub use location::LocationRepository;
pub use record::RecordRepository;

use domain::DomainError;

/// Name of the violated constraint, if the error is a constraint violation.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

/// Fallback translation for errors without a known constraint.
pub(crate) fn internal(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "Database error");
    DomainError::Internal(format!("Database error: {}", err))
}
