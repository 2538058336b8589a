//! Checkout: turn the session cart into a pending offer.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use apogee_core::offer::{ContactForm, OfferDraft};
use apogee_core::{OfferId, OfferStatus};

use crate::db::OfferRepository;
use crate::error::Result;
use crate::models::session::{checkout_token, load_cart, save_cart};
use crate::state::AppState;

/// Response of a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub offer_id: OfferId,
    pub status: OfferStatus,
    pub total: Decimal,
    pub total_items: u64,
}

/// Submit the cart as an offer.
///
/// The cart is cleared only once the offer row exists; a failed insert
/// leaves it untouched so the visitor can retry. The insert is keyed by the
/// session's checkout token, so a double click or a retry of the same cart
/// returns the first offer with `200 OK` instead of creating another.
#[instrument(skip(state, session, contact))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Json(contact): Json<ContactForm>,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let mut cart = load_cart(&session).await?;
    let draft = OfferDraft::from_cart(&cart, contact)?;
    let token = checkout_token(&session).await?;

    let offer = OfferRepository::new(state.pool()).submit(&draft, token).await?;

    cart.clear();
    save_cart(&session, &cart).await?;

    let status = if offer.created {
        tracing::info!(
            offer_id = %offer.id,
            total = %draft.total,
            items = draft.items.len(),
            "Offer submitted"
        );
        StatusCode::CREATED
    } else {
        tracing::info!(offer_id = %offer.id, "Repeated checkout, returning existing offer");
        StatusCode::OK
    };

    Ok((
        status,
        Json(CheckoutResponse {
            offer_id: offer.id,
            status: offer.status,
            total: draft.total,
            total_items: draft.total_items(),
        }),
    ))
}
