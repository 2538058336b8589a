//! Product label CRUD and ordering.

use sqlx::PgPool;

use apogee_core::ProductLabelId;
use apogee_core::content::{ProductLabel, ProductLabelInput};

use super::{OrderedTable, RepositoryError, apply_order, next_display_order};

#[derive(Debug, sqlx::FromRow)]
struct LabelRow {
    id: ProductLabelId,
    name: String,
    color: String,
    display_order: i32,
}

impl From<LabelRow> for ProductLabel {
    fn from(row: LabelRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            color: row.color,
            display_order: row.display_order,
        }
    }
}

/// Repository for product labels.
pub struct LabelRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> LabelRepository<'a> {
    /// Create a new label repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All labels in display order.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn list(&self) -> Result<Vec<ProductLabel>, RepositoryError> {
        let rows = sqlx::query_as::<_, LabelRow>(
            "SELECT id, name, color, display_order FROM shop.product_label ORDER BY display_order, id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductLabel::from).collect())
    }

    /// Append a label at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn create(&self, input: &ProductLabelInput) -> Result<ProductLabel, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let display_order = next_display_order(&mut tx, OrderedTable::ProductLabel).await?;

        let row = sqlx::query_as::<_, LabelRow>(
            r"
            INSERT INTO shop.product_label (name, color, display_order)
            VALUES ($1, $2, $3)
            RETURNING id, name, color, display_order
            ",
        )
        .bind(&input.name)
        .bind(&input.color)
        .bind(display_order)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Change a label's name and color.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub async fn update(
        &self,
        id: ProductLabelId,
        input: &ProductLabelInput,
    ) -> Result<ProductLabel, RepositoryError> {
        let row = sqlx::query_as::<_, LabelRow>(
            r"
            UPDATE shop.product_label SET name = $2, color = $3
            WHERE id = $1
            RETURNING id, name, color, display_order
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.color)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("label {id}")))?;

        Ok(row.into())
    }

    /// Delete a label; products lose it.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn delete(&self, id: ProductLabelId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product_label WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Put labels in the given order and return the reordered list.
    ///
    /// # Errors
    ///
    /// `Invalid` unless `ids` names every label exactly once.
    pub async fn reorder(&self, ids: &[ProductLabelId]) -> Result<Vec<ProductLabel>, RepositoryError> {
        let requested: Vec<i32> = ids.iter().map(ProductLabelId::as_i32).collect();

        let mut tx = self.pool.begin().await?;
        let moved = apply_order(&mut tx, OrderedTable::ProductLabel, &requested).await?;
        tx.commit().await?;

        tracing::debug!(moved, "Labels reordered");
        self.list().await
    }
}
