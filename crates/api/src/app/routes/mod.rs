use axum::{Router, routing::get};

pub mod auth;
pub mod manufacturers;
pub mod products;
pub mod suppliers;
pub mod system;
pub mod updates;

/// Router for all session-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/check", get(auth::check))
        .nest("/products", products::router())
        .nest("/manufacturers", manufacturers::router())
        .nest("/suppliers", suppliers::router())
        .nest("/updates", updates::router())
}
