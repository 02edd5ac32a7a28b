//! `stockbook-auth` — shared-password session boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. The whole
//! application is guarded by a single shared password; a successful login is
//! exchanged for a signed session token carried in a cookie.

pub mod session;

pub use session::{AuthError, SessionSigner, password_matches};
