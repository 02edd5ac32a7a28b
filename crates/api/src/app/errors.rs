use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockbook_core::DomainError;

/// A `{ "message": ... }` JSON response with the given status.
pub fn json_message(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a domain error to its HTTP response.
///
/// `entity` names the resource for not-found messages ("Product does not
/// exist" etc.). The mapping is exhaustive so new variants cannot silently
/// fall through to a 500.
pub fn domain_error_to_response(err: DomainError, entity: &str) -> axum::response::Response {
    match err {
        DomainError::Validation(message) => json_message(StatusCode::BAD_REQUEST, message),
        DomainError::InvalidId(message) => json_message(StatusCode::BAD_REQUEST, message),
        DomainError::NotFound => {
            json_message(StatusCode::NOT_FOUND, format!("{entity} does not exist"))
        }
        DomainError::InsufficientStock { index } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "message": "Not enough stock",
                "index": index,
            })),
        )
            .into_response(),
        DomainError::InvalidProductReference { index } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "message": "Unknown product in batch",
                "index": index,
            })),
        )
            .into_response(),
        DomainError::UniquenessConflict { field, message } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "field": field,
                "message": message,
            })),
        )
            .into_response(),
        DomainError::Internal(detail) => {
            tracing::error!(%detail, "internal error");
            json_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred",
            )
        }
    }
}
