//! Cart route handlers.
//!
//! The cart is kept in the session. Every handler loads it, applies one
//! change, writes the whole cart back and returns it with fresh totals.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use apogee_core::ProductId;
use apogee_core::cart::{CartItem, QuantityChange};

use crate::error::{AppError, Result};
use crate::models::CartView;
use crate::models::session::{load_cart, save_cart};
use crate::state::AppState;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PATCH /api/cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i64,
}

/// Current cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a published product at its current price.
///
/// The product is read from the database, not the catalog cache.
/// Adding a product that is already in the cart increases its quantity.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .current_product(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", body.product_id)))?;

    let mut cart = load_cart(&session).await?;
    cart.add(CartItem {
        product_id: product.id,
        price: product.effective_price(Utc::now()),
        quantity: body.quantity,
        image: product.main_image().unwrap_or_default().to_string(),
        name: product.name,
        description: product.description,
    })?;
    save_cart(&session, &cart).await?;

    tracing::debug!(product_id = %body.product_id, quantity = body.quantity, "Added to cart");
    Ok(Json(CartView::from(&cart)))
}

/// Replace a line's quantity. Zero or below removes the line.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    match cart.update_quantity(product_id, body.quantity)? {
        QuantityChange::Updated | QuantityChange::Removed => save_cart(&session, &cart).await?,
        QuantityChange::NotInCart if body.quantity > 0 => {
            return Err(AppError::NotFound(format!("product {product_id} in cart")));
        }
        QuantityChange::NotInCart => {}
    }
    Ok(Json(CartView::from(&cart)))
}

/// Remove a product. Removing something that is not in the cart is a no-op.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(product_id) {
        save_cart(&session, &cart).await?;
    }
    Ok(Json(CartView::from(&cart)))
}
