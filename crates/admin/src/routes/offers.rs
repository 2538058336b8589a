//! Offer review route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use apogee_core::offer::Offer;
use apogee_core::{OfferId, OfferStatus};

use crate::db::OfferRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::state::AppState;

/// Query parameters for the offer list.
#[derive(Debug, Deserialize)]
pub struct OfferFilter {
    pub status: Option<OfferStatus>,
}

/// Body of `PATCH /api/offers/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OfferStatus,
}

/// Offers, newest first.
#[instrument(skip(state))]
pub async fn list(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Query(filter): Query<OfferFilter>,
) -> Result<Json<Vec<Offer>>> {
    let offers = OfferRepository::new(state.pool()).list(filter.status).await?;
    Ok(Json(offers))
}

/// Offer detail.
#[instrument(skip(state))]
pub async fn show(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<OfferId>,
) -> Result<Json<Offer>> {
    OfferRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("offer {id}")))
}

/// Accept or reject a pending offer.
#[instrument(skip(state))]
pub async fn set_status(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<OfferId>,
    Json(body): Json<StatusChange>,
) -> Result<Json<Offer>> {
    let offer = OfferRepository::new(state.pool())
        .set_status(id, body.status)
        .await?;
    Ok(Json(offer))
}

/// Delete an offer.
#[instrument(skip(state))]
pub async fn delete(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<OfferId>,
) -> Result<StatusCode> {
    if !OfferRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound(format!("offer {id}")));
    }

    tracing::info!(offer_id = %id, "Offer deleted");
    Ok(StatusCode::NO_CONTENT)
}
