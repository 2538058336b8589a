//! Category tree writes.
//!
//! Every write locks `shop.category`, reloads the tree, validates the change
//! against it and writes inside the same transaction, so two admins adding
//! the same sibling name cannot both succeed.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use apogee_core::CategoryId;
use apogee_core::catalog::{CategoryError, CategoryNode, CategoryTree};

use super::RepositoryError;

/// How much a subtree delete touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryDeletion {
    /// The node and all its descendants.
    pub categories: u64,
    /// Products whose category was cleared.
    pub products_detached: u64,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    parent_id: Option<CategoryId>,
    name: String,
}

impl From<CategoryRow> for CategoryNode {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            parent_id: row.parent_id,
            name: row.name,
        }
    }
}

fn tree_error(err: CategoryError) -> RepositoryError {
    match err {
        CategoryError::AlreadyExists(_) => RepositoryError::Conflict(err.to_string()),
        CategoryError::NotFound(id) => RepositoryError::NotFound(format!("category {id}")),
        CategoryError::Cycle(_) => RepositoryError::DataCorruption(err.to_string()),
        CategoryError::EmptyName | CategoryError::NameTooLong | CategoryError::TooDeep => {
            RepositoryError::Invalid(err.to_string())
        }
    }
}

/// Repository for the category tree.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories as flat rows, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn list(&self) -> Result<Vec<CategoryNode>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_nodes(&mut conn).await
    }

    /// Add a category under `parent` (or at the top level).
    ///
    /// # Errors
    ///
    /// `Conflict` when a sibling already has the name (any case), `NotFound`
    /// for an unknown parent, `Invalid` for blank names or nesting too deep.
    pub async fn create(
        &self,
        parent: Option<CategoryId>,
        name: &str,
    ) -> Result<CategoryNode, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let tree = lock_tree(&mut tx).await?;
        let new = tree.validate_new(parent, name).map_err(tree_error)?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.category (parent_id, name, depth)
            VALUES ($1, $2, $3)
            RETURNING id, parent_id, name
            ",
        )
        .bind(new.parent_id)
        .bind(&new.name)
        .bind(i16::from(new.depth))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_unique(e, || format!("category \"{}\" already exists here", new.name))
        })?;

        tx.commit().await?;
        tracing::info!(category_id = %row.id, name = %row.name, "Category created");
        Ok(row.into())
    }

    /// Rename a category, keeping its place in the tree.
    ///
    /// # Errors
    ///
    /// Same as [`create`](Self::create); `NotFound` for unknown ids.
    pub async fn rename(&self, id: CategoryId, name: &str) -> Result<CategoryNode, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let tree = lock_tree(&mut tx).await?;
        let name = tree.validate_rename(id, name).map_err(tree_error)?;

        let row = sqlx::query_as::<_, CategoryRow>(
            "UPDATE shop.category SET name = $2 WHERE id = $1 RETURNING id, parent_id, name",
        )
        .bind(id)
        .bind(&name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            RepositoryError::from_unique(e, || format!("category \"{name}\" already exists here"))
        })?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete a category and its whole subtree. Products in any of the
    /// removed categories stay, with no category.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub async fn delete(&self, id: CategoryId) -> Result<CategoryDeletion, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let tree = lock_tree(&mut tx).await?;
        let subtree: Vec<i32> = tree
            .subtree(id)
            .map_err(tree_error)?
            .into_iter()
            .map(i32::from)
            .collect();

        let detached = sqlx::query(
            "UPDATE shop.product SET category_id = NULL, updated_at = now() WHERE category_id = ANY($1)",
        )
        .bind(&subtree)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM shop.category WHERE id = ANY($1)")
            .bind(&subtree)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deletion = CategoryDeletion {
            categories: deleted.rows_affected(),
            products_detached: detached.rows_affected(),
        };
        tracing::info!(
            category_id = %id,
            categories = deletion.categories,
            products_detached = deletion.products_detached,
            "Category subtree deleted"
        );
        Ok(deletion)
    }
}

async fn load_nodes(conn: &mut PgConnection) -> Result<Vec<CategoryNode>, RepositoryError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, parent_id, name FROM shop.category ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(CategoryNode::from).collect())
}

/// Take the table lock and load the tree it protects.
async fn lock_tree(conn: &mut PgConnection) -> Result<CategoryTree, RepositoryError> {
    sqlx::query("LOCK TABLE shop.category IN EXCLUSIVE MODE")
        .execute(&mut *conn)
        .await?;

    let nodes = load_nodes(conn).await?;
    CategoryTree::from_nodes(nodes).map_err(tree_error)
}
