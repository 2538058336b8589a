//! Database access for the storefront.
//!
//! The storefront reads the `shop` schema owned by the admin service and
//! writes exactly two things: sessions (via `tower-sessions-sqlx-store`) and
//! new offers at checkout.
//!
//! # Migrations
//!
//! The `shop` schema lives in `crates/admin/migrations/`; the session table
//! is created by the session store. Both run via:
//! ```bash
//! cargo run -p apogee-cli -- migrate all
//! ```

pub mod catalog;
pub mod content;
pub mod offers;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use content::ContentRepository;
pub use offers::{OfferRepository, SubmittedOffer};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
