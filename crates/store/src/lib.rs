//! Postgres-backed persistence for stockbook.
//!
//! The `Store` wraps a connection pool and exposes the application's
//! persistence operations, grouped one module per domain area. Handlers
//! receive a `Store` by injection; nothing in this crate is process-global.
//!
//! All multi-statement writes (reconciliation, event deletion, product
//! create/update with connect-or-create parties) run inside a single
//! transaction. The reconciliation path additionally takes `FOR UPDATE` row
//! locks so concurrent overlapping batches serialize instead of both
//! validating against stale quantities.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use stockbook_core::{DomainError, DomainResult};

mod error;
pub mod events;
pub mod parties;
pub mod products;

pub use events::{ExportRow, HistoryEvent, HistoryLine, month_bounds};
pub use parties::PartyWithProducts;
pub use products::ProductHistoryEntry;

pub(crate) use error::{map_sqlx_error, map_unique_violation};

/// Handle to the relational store. Cheap to clone (pool is ref-counted).
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to Postgres and return a ready store.
    pub async fn connect(database_url: &str) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| DomainError::internal(format!("failed to connect to database: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Apply embedded schema migrations.
    pub async fn migrate(&self) -> DomainResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DomainError::internal(format!("migration failed: {e}")))?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
