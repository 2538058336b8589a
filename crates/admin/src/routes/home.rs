//! Home page content: hero slides and the carousel strip.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use apogee_core::content::{CarouselImage, CarouselImageInput, HeroSlide, HeroSlideInput};
use apogee_core::{CarouselImageId, HeroSlideId};

use super::Reorder;
use crate::db::ContentRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

// =============================================================================
// Hero slides
// =============================================================================

/// All slides in display order.
#[instrument(skip(state))]
pub async fn hero_slides(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroSlide>>> {
    Ok(Json(ContentRepository::new(state.pool()).hero_slides().await?))
}

/// Append a slide.
#[instrument(skip(state))]
pub async fn create_hero_slide(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(input): Json<HeroSlideInput>,
) -> Result<(StatusCode, Json<HeroSlide>)> {
    let input = input.validate()?;
    let slide = ContentRepository::new(state.pool())
        .create_hero_slide(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(slide)))
}

/// Update a slide.
#[instrument(skip(state))]
pub async fn update_hero_slide(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<HeroSlideId>,
    Json(input): Json<HeroSlideInput>,
) -> Result<Json<HeroSlide>> {
    let input = input.validate()?;
    let slide = ContentRepository::new(state.pool())
        .update_hero_slide(id, &input)
        .await?;
    Ok(Json(slide))
}

/// Delete a slide.
#[instrument(skip(state))]
pub async fn delete_hero_slide(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<HeroSlideId>,
) -> Result<StatusCode> {
    if !ContentRepository::new(state.pool())
        .delete_hero_slide(id)
        .await?
    {
        return Err(AppError::NotFound(format!("hero slide {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder all slides.
#[instrument(skip(state))]
pub async fn reorder_hero_slides(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(body): Json<Reorder<HeroSlideId>>,
) -> Result<Json<Vec<HeroSlide>>> {
    let slides = ContentRepository::new(state.pool())
        .reorder_hero_slides(&body.into_ids()?)
        .await?;
    Ok(Json(slides))
}

// =============================================================================
// Carousel
// =============================================================================

/// All carousel images in display order.
#[instrument(skip(state))]
pub async fn carousel_images(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<CarouselImage>>> {
    Ok(Json(
        ContentRepository::new(state.pool()).carousel_images().await?,
    ))
}

/// Append a carousel image.
#[instrument(skip(state))]
pub async fn create_carousel_image(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(input): Json<CarouselImageInput>,
) -> Result<(StatusCode, Json<CarouselImage>)> {
    let input = input.validate()?;
    let image = ContentRepository::new(state.pool())
        .create_carousel_image(&input)
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// Update a carousel image.
#[instrument(skip(state))]
pub async fn update_carousel_image(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<CarouselImageId>,
    Json(input): Json<CarouselImageInput>,
) -> Result<Json<CarouselImage>> {
    let input = input.validate()?;
    let image = ContentRepository::new(state.pool())
        .update_carousel_image(id, &input)
        .await?;
    Ok(Json(image))
}

/// Delete a carousel image.
#[instrument(skip(state))]
pub async fn delete_carousel_image(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<CarouselImageId>,
) -> Result<StatusCode> {
    if !ContentRepository::new(state.pool())
        .delete_carousel_image(id)
        .await?
    {
        return Err(AppError::NotFound(format!("carousel image {id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder all carousel images.
#[instrument(skip(state))]
pub async fn reorder_carousel_images(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(body): Json<Reorder<CarouselImageId>>,
) -> Result<Json<Vec<CarouselImage>>> {
    let images = ContentRepository::new(state.pool())
        .reorder_carousel_images(&body.into_ids()?)
        .await?;
    Ok(Json(images))
}
