use axum::{
    Extension, Json,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use cookie::Cookie;
use cookie::time::Duration;

use stockbook_auth::password_matches;

use crate::app::{dto, errors};
use crate::context::SessionContext;
use crate::middleware::{AuthState, SESSION_COOKIE};

/// Exchange the shared password for a session cookie.
pub async fn login(
    Extension(auth): Extension<AuthState>,
    body: Option<Json<dto::LoginRequest>>,
) -> axum::response::Response {
    let password = body.and_then(|Json(body)| body.password.filter(|p| !p.is_empty()));
    let Some(password) = password else {
        return errors::json_message(StatusCode::BAD_REQUEST, "Invalid request");
    };

    if !password_matches(&password, &auth.password) {
        return errors::json_message(StatusCode::UNAUTHORIZED, "Incorrect password");
    }

    let token = match auth.sessions.issue(Utc::now()) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue session token");
            return errors::json_message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred",
            );
        }
    };

    // No expiry: the session lasts until logout clears the cookie.
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .path("/")
        .build();

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
    )
        .into_response()
}

/// Clear the session cookie.
pub async fn logout() -> axum::response::Response {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(Duration::ZERO)
        .build();

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
    )
        .into_response()
}

/// Probe whether the caller holds a valid session. The middleware has
/// already verified the cookie if we got this far.
pub async fn check(Extension(_session): Extension<SessionContext>) -> axum::response::Response {
    (
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
    )
        .into_response()
}
