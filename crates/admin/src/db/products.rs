//! Product CRUD with label assignments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use apogee_core::catalog::{Discount, Product, ProductInput};
use apogee_core::{CategoryId, ProductId, ProductLabelId};

use super::RepositoryError;

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
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    category_id: Option<CategoryId>,
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
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
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

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog product writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every product, published or not, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(concat!(
            product_select!(),
            "ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Insert a validated product and its labels.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the category or a label does
    /// not exist.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let product = insert_product(&mut tx, input).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Replace every field of a product, labels included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for unknown ids and
    /// `RepositoryError::Invalid` for unknown categories or labels.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        check_references(&mut tx, input).await?;

        let updated = sqlx::query(
            r"
            UPDATE shop.product
            SET name = $2, description = $3, price = $4, category_id = $5,
                images = $6, main_image_index = $7, stock = $8,
                discount_price = $9, discount_starts_at = $10, discount_ends_at = $11,
                is_published = $12, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.category_id)
        .bind(&input.images)
        .bind(main_image_index(input)?)
        .bind(input.stock)
        .bind(input.discount.as_ref().map(|d| d.price))
        .bind(input.discount.as_ref().and_then(|d| d.starts_at))
        .bind(input.discount.as_ref().and_then(|d| d.ends_at))
        .bind(input.is_published)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("product {id}")));
        }

        sqlx::query("DELETE FROM shop.product_label_assignment WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        assign_labels(&mut tx, id, &input.label_ids).await?;

        let product = fetch(&mut tx, id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Delete a product. Label assignments go with it.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Insert a validated product inside the caller's transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Invalid` if the category or a label does not
/// exist.
pub async fn insert_product(
    conn: &mut PgConnection,
    input: &ProductInput,
) -> Result<Product, RepositoryError> {
    check_references(conn, input).await?;

    let (id,): (ProductId,) = sqlx::query_as(
        r"
        INSERT INTO shop.product (
            name, description, price, category_id, images, main_image_index,
            stock, discount_price, discount_starts_at, discount_ends_at, is_published
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id
        ",
    )
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.category_id)
    .bind(&input.images)
    .bind(main_image_index(input)?)
    .bind(input.stock)
    .bind(input.discount.as_ref().map(|d| d.price))
    .bind(input.discount.as_ref().and_then(|d| d.starts_at))
    .bind(input.discount.as_ref().and_then(|d| d.ends_at))
    .bind(input.is_published)
    .fetch_one(&mut *conn)
    .await?;

    assign_labels(conn, id, &input.label_ids).await?;
    fetch(conn, id)
        .await?
        .ok_or_else(|| RepositoryError::DataCorruption(format!("product {id} vanished")))
}

async fn fetch(conn: &mut PgConnection, id: ProductId) -> Result<Option<Product>, RepositoryError> {
    let row = sqlx::query_as::<_, ProductRow>(concat!(product_select!(), "WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(Product::try_from).transpose()
}

fn main_image_index(input: &ProductInput) -> Result<i32, RepositoryError> {
    i32::try_from(input.main_image_index)
        .map_err(|_| RepositoryError::Invalid("main image index is too large".to_string()))
}

/// The category and every label must exist before the product points at them.
async fn check_references(
    conn: &mut PgConnection,
    input: &ProductInput,
) -> Result<(), RepositoryError> {
    if let Some(category_id) = input.category_id {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM shop.category WHERE id = $1)")
                .bind(category_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(RepositoryError::Invalid(format!(
                "category {category_id} does not exist"
            )));
        }
    }

    if input.label_ids.is_empty() {
        return Ok(());
    }

    let wanted: Vec<i32> = input.label_ids.iter().map(ProductLabelId::as_i32).collect();
    let found: Vec<(i32,)> =
        sqlx::query_as("SELECT id FROM shop.product_label WHERE id = ANY($1)")
            .bind(&wanted)
            .fetch_all(&mut *conn)
            .await?;

    if let Some(missing) = wanted
        .iter()
        .find(|id| !found.iter().any(|(found_id,)| found_id == *id))
    {
        return Err(RepositoryError::Invalid(format!(
            "label {missing} does not exist"
        )));
    }

    Ok(())
}

async fn assign_labels(
    conn: &mut PgConnection,
    product_id: ProductId,
    label_ids: &[ProductLabelId],
) -> Result<(), RepositoryError> {
    if label_ids.is_empty() {
        return Ok(());
    }

    let ids: Vec<i32> = label_ids.iter().map(ProductLabelId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO shop.product_label_assignment (product_id, label_id, position)
        SELECT $1, label_id, (position - 1)::int
        FROM UNNEST($2::int[]) WITH ORDINALITY AS l(label_id, position)
        ",
    )
    .bind(product_id)
    .bind(&ids)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
