//! SQLx error mapping.
//!
//! Storage failures surface as `DomainError::Internal` (detail logged, never
//! sent to clients); the one constraint clients can trip — a uniqueness
//! violation (Postgres error code 23505) — maps to a field-scoped
//! `UniquenessConflict`.

use stockbook_core::DomainError;

const UNIQUE_VIOLATION: &str = "23505";

/// Map a SQLx error to the domain error model.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> DomainError {
    match err {
        sqlx::Error::RowNotFound => DomainError::NotFound,
        sqlx::Error::Database(db_err) => {
            tracing::error!(operation, error = %db_err, "database error");
            DomainError::internal(format!("database error in {operation}"))
        }
        other => {
            tracing::error!(operation, error = %other, "storage error");
            DomainError::internal(format!("storage error in {operation}"))
        }
    }
}

/// Like `map_sqlx_error`, but turns a unique-constraint violation into a
/// field-scoped conflict with the given message.
pub(crate) fn map_unique_violation(
    operation: &str,
    field: &'static str,
    message: &str,
    err: sqlx::Error,
) -> DomainError {
    if is_unique_violation(&err) {
        return DomainError::uniqueness_conflict(field, message);
    }
    map_sqlx_error(operation, err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == UNIQUE_VIOLATION;
        }
    }
    false
}
