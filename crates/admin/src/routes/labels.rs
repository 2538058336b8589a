//! Product label route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use apogee_core::ProductLabelId;
use apogee_core::content::{ProductLabel, ProductLabelInput};

use super::Reorder;
use crate::db::LabelRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

/// Labels in display order.
#[instrument(skip(state))]
pub async fn list(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductLabel>>> {
    Ok(Json(LabelRepository::new(state.pool()).list().await?))
}

/// Create a label at the end of the list.
#[instrument(skip(state))]
pub async fn create(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(input): Json<ProductLabelInput>,
) -> Result<(StatusCode, Json<ProductLabel>)> {
    let input = input.validate()?;
    let label = LabelRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(label)))
}

/// Rename or recolor a label.
#[instrument(skip(state))]
pub async fn update(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<ProductLabelId>,
    Json(input): Json<ProductLabelInput>,
) -> Result<Json<ProductLabel>> {
    let input = input.validate()?;
    let label = LabelRepository::new(state.pool()).update(id, &input).await?;
    Ok(Json(label))
}

/// Delete a label.
#[instrument(skip(state))]
pub async fn delete(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<ProductLabelId>,
) -> Result<StatusCode> {
    if !LabelRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("label {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder all labels.
#[instrument(skip(state))]
pub async fn reorder(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(body): Json<Reorder<ProductLabelId>>,
) -> Result<Json<Vec<ProductLabel>>> {
    let labels = LabelRepository::new(state.pool()).reorder(&body.into_ids()?).await?;
    Ok(Json(labels))
}
