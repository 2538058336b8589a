//! Published content handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use apogee_core::content::{CarouselImage, HeroSlide, NewsArticle};

use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

const DEFAULT_NEWS_LIMIT: i64 = 20;
const MAX_NEWS_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    pub limit: Option<i64>,
}

/// Published articles, newest first.
#[instrument(skip(state))]
pub async fn news(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<NewsArticle>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NEWS_LIMIT)
        .clamp(1, MAX_NEWS_LIMIT);
    let articles = ContentRepository::new(state.pool())
        .published_news(limit)
        .await?;
    Ok(Json(articles))
}

/// One published article.
#[instrument(skip(state))]
pub async fn article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NewsArticle>> {
    ContentRepository::new(state.pool())
        .published_article(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("article {slug}")))
}

#[instrument(skip(state))]
pub async fn hero_slides(State(state): State<AppState>) -> Result<Json<Vec<HeroSlide>>> {
    Ok(Json(
        ContentRepository::new(state.pool())
            .active_hero_slides()
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn carousel(State(state): State<AppState>) -> Result<Json<Vec<CarouselImage>>> {
    Ok(Json(
        ContentRepository::new(state.pool())
            .carousel_images()
            .await?,
    ))
}
