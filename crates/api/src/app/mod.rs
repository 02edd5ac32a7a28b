//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get, routing::post};
use tower::ServiceBuilder;

use stockbook_auth::SessionSigner;
use stockbook_store::Store;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `/health`, `/auth/login`, and `/auth/logout` are public; everything else
/// sits behind the session middleware.
pub fn build_app(store: Store, password: &str) -> Router {
    let auth_state = middleware::AuthState {
        sessions: Arc::new(SessionSigner::new(password.as_bytes())),
        password: Arc::from(password),
    };

    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(Extension(store))
                .layer(Extension(auth_state)),
        )
}
