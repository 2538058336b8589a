//! Database operations for the admin service.
//!
//! # Schema: `shop`
//!
//! ## Tables
//!
//! - `category` - Category tree (`parent_id`, `depth` 0..=2)
//! - `product` - Catalog products
//! - `product_label` - Labels shown on product cards
//! - `product_label_assignment` - Product to label links, ordered by `position`
//! - `offer` - Checked-out carts awaiting review
//! - `news_article`, `hero_slide`, `carousel_image` - Home page content
//!
//! Multi-row writes run in a single transaction.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p apogee-cli -- migrate admin
//! ```

pub mod categories;
pub mod content;
pub mod labels;
pub mod offers;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use apogee_core::ordering::{self, OrderingError};

pub use categories::{CategoryDeletion, CategoryRepository};
pub use content::ContentRepository;
pub use labels::LabelRepository;
pub use offers::OfferRepository;
pub use products::ProductRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The write clashes with existing data (duplicate name, decided offer).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The write refers to rows that do not exist or breaks a domain rule
    /// that can only be checked against the database.
    #[error("invalid: {0}")]
    Invalid(String),
}

impl From<OrderingError> for RepositoryError {
    fn from(err: OrderingError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl RepositoryError {
    /// Turn a unique-constraint violation into `Conflict`, pass anything else through.
    pub(crate) fn from_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Conflict(message()),
            _ => Self::Database(err),
        }
    }
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

/// Tables that carry a drag-and-drop `display_order`.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OrderedTable {
    ProductLabel,
    HeroSlide,
    CarouselImage,
}

impl OrderedTable {
    const fn name(self) -> &'static str {
        match self {
            Self::ProductLabel => "shop.product_label",
            Self::HeroSlide => "shop.hero_slide",
            Self::CarouselImage => "shop.carousel_image",
        }
    }
}

/// Rewrite `display_order` so rows follow `requested`, inside the caller's
/// transaction. Only rows whose order changes are written.
///
/// # Errors
///
/// `RepositoryError::Invalid` unless `requested` is a permutation of the
/// stored ids.
pub(crate) async fn apply_order(
    conn: &mut PgConnection,
    table: OrderedTable,
    requested: &[i32],
) -> Result<usize, RepositoryError> {
    let current: Vec<(i32, i32)> = sqlx::query_as(&format!(
        "SELECT id, display_order FROM {} ORDER BY id FOR UPDATE",
        table.name()
    ))
    .fetch_all(&mut *conn)
    .await?;

    let changes = ordering::reorder(&current, requested)?;
    if changes.is_empty() {
        return Ok(0);
    }

    let ids: Vec<i32> = changes.iter().map(|change| change.id).collect();
    let orders: Vec<i32> = changes.iter().map(|change| change.display_order).collect();
    sqlx::query(&format!(
        r"
        UPDATE {} AS t SET display_order = v.display_order
        FROM UNNEST($1::int[], $2::int[]) AS v(id, display_order)
        WHERE t.id = v.id
        ",
        table.name()
    ))
    .bind(&ids)
    .bind(&orders)
    .execute(&mut *conn)
    .await?;

    Ok(changes.len())
}

/// Next free `display_order` at the end of the list.
pub(crate) async fn next_display_order(
    conn: &mut PgConnection,
    table: OrderedTable,
) -> Result<i32, RepositoryError> {
    let (next,): (i32,) = sqlx::query_as(&format!(
        "SELECT COALESCE(MAX(display_order) + 1, 0) FROM {}",
        table.name()
    ))
    .fetch_one(&mut *conn)
    .await?;
    Ok(next)
}
