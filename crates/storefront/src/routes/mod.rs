//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/products                 Published products (?category_id= includes subcategories)
//! GET    /api/products/{id}            One published product
//! GET    /api/categories               Nested category tree
//!
//! # Content
//! GET    /api/news                     Published articles, newest first
//! GET    /api/news/{slug}              One published article
//! GET    /api/hero-slides              Active hero slides
//! GET    /api/carousel                 Carousel images
//!
//! # Cart (session)
//! GET    /api/cart                     Cart with totals
//! POST   /api/cart/items               Add a product
//! PATCH  /api/cart/items/{product_id}  Set quantity (0 removes)
//! DELETE /api/cart/items/{product_id}  Remove a product
//!
//! # Checkout and quotes (rate limited)
//! POST   /api/checkout                 Turn the cart into an offer
//! POST   /api/quotes/estimate          3D-print price estimate
//! ```

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod quotes;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{checkout_rate_limiter, quote_rate_limiter};
use crate::state::AppState;

/// Catalog routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/categories", get(catalog::categories))
}

/// Content routes.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(content::news))
        .route("/news/{slug}", get(content::article))
        .route("/hero-slides", get(content::hero_slides))
        .route("/carousel", get(content::carousel))
}

/// Cart routes.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create all routes for the storefront.
///
/// `trust_proxy_headers` decides whether the rate limiters key on proxy
/// headers or only on the peer address.
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .merge(content_routes())
        .nest("/cart", cart_routes())
        .route(
            "/checkout",
            post(checkout::checkout).layer(checkout_rate_limiter(trust_proxy_headers)),
        )
        .route(
            "/quotes/estimate",
            post(quotes::estimate).layer(quote_rate_limiter(trust_proxy_headers)),
        );

    Router::new().nest("/api", api)
}
