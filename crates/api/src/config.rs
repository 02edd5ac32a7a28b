//! Environment-driven configuration.

use std::env;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub password: String,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// `DATABASE_URL` is required; the port defaults to 8080; the shared
    /// password falls back to an insecure dev default with a warning.
    pub fn load() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set (e.g. postgres://localhost/stockbook)");

        let password = env::var("STOCKBOOK_PASSWORD").unwrap_or_else(|_| {
            tracing::warn!("STOCKBOOK_PASSWORD not set; using insecure dev default");
            "1234".to_string()
        });

        Self {
            port,
            database_url,
            password,
        }
    }
}
