//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use apogee_core::catalog::CategoryBranch;
use apogee_core::{CategoryId, ProductId};

use crate::error::{AppError, Result};
use crate::models::ProductView;
use crate::state::AppState;

/// Product list filters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Restrict to this category and everything below it.
    pub category_id: Option<CategoryId>,
}

/// List published products.
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let catalog = state.catalog();
    let products = catalog.products().await?;

    let views = match query.category_id {
        Some(category_id) => {
            let tree = catalog.category_tree().await?;
            let wanted = tree
                .subtree_set(category_id)
                .map_err(|_| AppError::NotFound(format!("category {category_id}")))?;
            let matching = products
                .iter()
                .filter(|p| p.category_id.is_some_and(|id| wanted.contains(&id)));
            catalog.views(matching, Utc::now()).await?
        }
        None => catalog.views(products.iter(), Utc::now()).await?,
    };

    Ok(Json(views))
}

/// Show one published product.
#[instrument(skip(state))]
pub async fn product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let catalog = state.catalog();
    let product = catalog
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    catalog
        .views([&product], Utc::now())
        .await?
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// The category tree as nested branches.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryBranch>>> {
    Ok(Json(state.catalog().category_tree().await?.nested()))
}
