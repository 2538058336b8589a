//! Catalog reads: published products, the category tree and labels.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use apogee_core::catalog::{CategoryNode, Discount, Product};
use apogee_core::content::ProductLabel;
use apogee_core::{CategoryId, ProductId, ProductLabelId};

use super::RepositoryError;

/// Column list shared by every product query.
macro_rules! product_select {
    () => {
        r"
        SELECT p.id, p.name, p.description, p.price, p.category_id,
               p.images, p.main_image_index, p.stock,
               p.discount_price, p.discount_starts_at, p.discount_ends_at,
               ARRAY(
                   SELECT a.label_id FROM shop.product_label_assignment a
                   WHERE a.product_id = p.id ORDER BY a.position
               ) AS label_ids,
               p.is_published, p.created_at, p.updated_at
        FROM shop.product p
        "
    };
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    category_id: Option<i32>,
    images: Vec<String>,
    main_image_index: i32,
    stock: i32,
    discount_price: Option<Decimal>,
    discount_starts_at: Option<DateTime<Utc>>,
    discount_ends_at: Option<DateTime<Utc>>,
    label_ids: Vec<i32>,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let main_image_index = u32::try_from(row.main_image_index).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "product {} has negative main_image_index",
                row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id.map(CategoryId::new),
            images: row.images,
            main_image_index,
            stock: row.stock,
            discount: row.discount_price.map(|price| Discount {
                price,
                starts_at: row.discount_starts_at,
                ends_at: row.discount_ends_at,
            }),
            label_ids: row.label_ids.into_iter().map(ProductLabelId::new).collect(),
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    parent_id: Option<i32>,
    name: String,
}

impl From<CategoryRow> for CategoryNode {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            parent_id: row.parent_id.map(CategoryId::new),
            name: row.name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LabelRow {
    id: i32,
    name: String,
    color: String,
    display_order: i32,
}

impl From<LabelRow> for ProductLabel {
    fn from(row: LabelRow) -> Self {
        Self {
            id: ProductLabelId::new(row.id),
            name: row.name,
            color: row.color,
            display_order: row.display_order,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only access to the catalog tables.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All published products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for rows that break product rules.
    pub async fn published_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            product_select!(),
            "WHERE p.is_published ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// One published product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn published_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(concat!(
            product_select!(),
            "WHERE p.id = $1 AND p.is_published"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Every category node.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryNode>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, parent_id, name FROM shop.category ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(CategoryNode::from).collect())
    }

    /// Every product label, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn labels(&self) -> Result<Vec<ProductLabel>, RepositoryError> {
        let rows = sqlx::query_as::<_, LabelRow>(
            "SELECT id, name, color, display_order FROM shop.product_label ORDER BY display_order, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductLabel::from).collect())
    }
}
