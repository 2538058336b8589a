//! Database migration commands.
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - connection string used by the storefront
//! - `ADMIN_DATABASE_URL` - connection string used by the admin service
//!
//! Both fall back to `DATABASE_URL`; in a single-database deployment they
//! point at the same server.
//!
//! # Migration Files
//!
//! Shop schema migrations: `crates/admin/migrations/`.
//! The storefront's `tower_sessions` table is created by the session store
//! itself.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Read a database URL, falling back to `DATABASE_URL`.
pub fn database_url(key: &'static str) -> Result<SecretString, MigrationError> {
    dotenvy::dotenv().ok();

    std::env::var(key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar(key))
}

/// Create the storefront session table.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing or the store migration fails.
pub async fn storefront() -> Result<(), MigrationError> {
    let database_url = database_url("STOREFRONT_DATABASE_URL")?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating session store...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}

/// Run the shop schema migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing or a migration fails.
pub async fn admin() -> Result<(), MigrationError> {
    let database_url = database_url("ADMIN_DATABASE_URL")?;

    tracing::info!("Connecting to admin database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running shop migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}
