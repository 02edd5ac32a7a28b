use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

use stockbook_auth::SessionSigner;

use crate::app::errors;
use crate::context::SessionContext;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "token";

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionSigner>,
    pub password: Arc<str>,
}

/// Guard for all session-scoped routes: a valid `token` cookie is exchanged
/// for a `SessionContext` request extension; anything else is a 401 with the
/// fixed "Not authenticated" message.
pub async fn session_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let verified = session_token(req.headers())
        .map(|token| state.sessions.verify(&token))
        .is_some_and(|result| result.is_ok());

    if !verified {
        return errors::json_message(StatusCode::UNAUTHORIZED, "Not authenticated");
    }

    req.extensions_mut().insert(SessionContext::new());
    next.run(req).await
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(header::COOKIE)?.to_str().ok()?;

    Cookie::split_parse(header)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
