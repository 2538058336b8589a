//! News article route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use apogee_core::NewsArticleId;
use apogee_core::content::{BulkAction, NewsArticle, NewsArticleInput};

use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

/// Body of `POST /api/news/bulk`.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub action: BulkAction,
    pub ids: Vec<NewsArticleId>,
}

/// Outcome of a bulk action.
#[derive(Debug, Serialize)]
pub struct BulkResult {
    pub action: BulkAction,
    pub affected: u64,
}

/// All articles, drafts included.
#[instrument(skip(state))]
pub async fn list(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<NewsArticle>>> {
    Ok(Json(ContentRepository::new(state.pool()).news().await?))
}

/// Article detail.
#[instrument(skip(state))]
pub async fn show(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<NewsArticleId>,
) -> Result<Json<NewsArticle>> {
    ContentRepository::new(state.pool())
        .article(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("article {id}")))
}

/// Create an article.
#[instrument(skip(state, input))]
pub async fn create(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(input): Json<NewsArticleInput>,
) -> Result<(StatusCode, Json<NewsArticle>)> {
    let input = input.validate()?;
    let article = ContentRepository::new(state.pool())
        .create_article(&input)
        .await?;

    tracing::info!(article_id = %article.id, slug = %article.slug, "Article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// Replace an article.
#[instrument(skip(state, input))]
pub async fn update(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<NewsArticleId>,
    Json(input): Json<NewsArticleInput>,
) -> Result<Json<NewsArticle>> {
    let input = input.validate()?;
    let article = ContentRepository::new(state.pool())
        .update_article(id, &input)
        .await?;
    Ok(Json(article))
}

/// Delete an article.
#[instrument(skip(state))]
pub async fn delete(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<NewsArticleId>,
) -> Result<StatusCode> {
    if !ContentRepository::new(state.pool()).delete_article(id).await? {
        return Err(AppError::NotFound(format!("article {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Publish, unpublish or delete several articles at once.
#[instrument(skip(state))]
pub async fn bulk(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(request): Json<BulkRequest>,
) -> Result<Json<BulkResult>> {
    if request.ids.is_empty() {
        return Err(AppError::BadRequest("no articles selected".to_string()));
    }

    let affected = ContentRepository::new(state.pool())
        .bulk_news(request.action, &request.ids)
        .await?;

    Ok(Json(BulkResult {
        action: request.action,
        affected,
    }))
}
