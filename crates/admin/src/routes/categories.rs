//! Category tree route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use apogee_core::CategoryId;
use apogee_core::catalog::{CategoryBranch, CategoryNode, CategoryTree};

use crate::db::{CategoryDeletion, CategoryRepository, RepositoryError};
use crate::error::Result;
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

/// Categories as stored and as a tree.
#[derive(Debug, Serialize)]
pub struct CategoryListing {
    pub categories: Vec<CategoryNode>,
    pub tree: Vec<CategoryBranch>,
}

/// Body of `POST /api/categories`.
#[derive(Debug, Deserialize)]
pub struct NewCategoryBody {
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub name: String,
}

/// Body of `PATCH /api/categories/{id}`.
#[derive(Debug, Deserialize)]
pub struct RenameCategoryBody {
    pub name: String,
}

/// Flat rows plus the nested tree.
#[instrument(skip(state))]
pub async fn list(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
) -> Result<Json<CategoryListing>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    let tree = CategoryTree::from_nodes(categories.iter().cloned())
        .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

    Ok(Json(CategoryListing {
        tree: tree.nested(),
        categories,
    }))
}

/// Add a category.
#[instrument(skip(state))]
pub async fn create(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(body): Json<NewCategoryBody>,
) -> Result<(StatusCode, Json<CategoryNode>)> {
    let node = CategoryRepository::new(state.pool())
        .create(body.parent_id, &body.name)
        .await?;
    Ok((StatusCode::CREATED, Json(node)))
}

/// Rename a category.
#[instrument(skip(state))]
pub async fn rename(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<RenameCategoryBody>,
) -> Result<Json<CategoryNode>> {
    let node = CategoryRepository::new(state.pool())
        .rename(id, &body.name)
        .await?;
    Ok(Json(node))
}

/// Delete a category with its subtree.
#[instrument(skip(state))]
pub async fn delete(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryDeletion>> {
    let deletion = CategoryRepository::new(state.pool()).delete(id).await?;
    Ok(Json(deletion))
}
