//! HTTP route handlers for admin.
//!
//! Every `/api` route requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
//!
//! # Route Structure
//!
//! ```text
//! # Products
//! GET    /api/products                  All products, drafts included
//! POST   /api/products                  Create
//! GET    /api/products/{id}             Detail
//! PUT    /api/products/{id}             Replace fields and labels
//! DELETE /api/products/{id}             Delete
//!
//! # Categories
//! GET    /api/categories                Flat rows and nested tree
//! POST   /api/categories                Add {parent_id?, name}
//! PATCH  /api/categories/{id}           Rename {name}
//! DELETE /api/categories/{id}           Delete with subtree
//!
//! # Labels
//! GET    /api/labels                    In display order
//! POST   /api/labels                    Create {name, color}
//! PUT    /api/labels/order              Reorder {ids}
//! PUT    /api/labels/{id}               Update
//! DELETE /api/labels/{id}               Delete
//!
//! # Offers
//! GET    /api/offers                    Newest first (?status=pending)
//! GET    /api/offers/{id}               Detail
//! PATCH  /api/offers/{id}/status        Accept or reject {status}
//! DELETE /api/offers/{id}               Delete
//!
//! # News
//! GET    /api/news                      All articles
//! POST   /api/news                      Create
//! POST   /api/news/bulk                 {action: publish|unpublish|delete, ids}
//! GET    /api/news/{id}                 Detail
//! PUT    /api/news/{id}                 Replace
//! DELETE /api/news/{id}                 Delete
//!
//! # Home page
//! GET    /api/hero-slides               All slides in order
//! POST   /api/hero-slides               Append
//! PUT    /api/hero-slides/order         Reorder {ids}
//! PUT    /api/hero-slides/{id}          Update
//! DELETE /api/hero-slides/{id}          Delete
//! GET    /api/carousel                  All images in order
//! POST   /api/carousel                  Append
//! PUT    /api/carousel/order            Reorder {ids}
//! PUT    /api/carousel/{id}             Update
//! DELETE /api/carousel/{id}             Delete
//! ```

pub mod categories;
pub mod home;
pub mod labels;
pub mod news;
pub mod offers;
pub mod products;

use axum::{
    Router,
    routing::{get, patch, post, put},
};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

use serde::Deserialize;

use apogee_core::ordering::OrderingError;

use crate::error::AppError;
use crate::state::AppState;

/// Body of every `PUT .../order` request: the full id list in its new order.
#[derive(Debug, Deserialize)]
pub struct Reorder<T> {
    pub ids: Vec<T>,
}

impl<T: Copy + Eq + Hash + Display> Reorder<T> {
    /// The requested ids, rejecting repeats before any row is locked.
    ///
    /// # Errors
    ///
    /// `AppError::BadRequest` naming the first repeated id.
    pub fn into_ids(self) -> Result<Vec<T>, AppError> {
        let mut seen = HashSet::with_capacity(self.ids.len());
        if let Some(repeated) = self.ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::BadRequest(
                OrderingError::Duplicate(repeated.to_string()).to_string(),
            ));
        }
        Ok(self.ids)
    }
}

/// Product routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Category routes.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/{id}",
            patch(categories::rename).delete(categories::delete),
        )
}

/// Label routes.
pub fn label_routes() -> Router<AppState> {
    Router::new()
        .route("/labels", get(labels::list).post(labels::create))
        .route("/labels/order", put(labels::reorder))
        .route("/labels/{id}", put(labels::update).delete(labels::delete))
}

/// Offer routes.
pub fn offer_routes() -> Router<AppState> {
    Router::new()
        .route("/offers", get(offers::list))
        .route("/offers/{id}", get(offers::show).delete(offers::delete))
        .route("/offers/{id}/status", patch(offers::set_status))
}

/// News routes.
pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(news::list).post(news::create))
        .route("/news/bulk", post(news::bulk))
        .route(
            "/news/{id}",
            get(news::show).put(news::update).delete(news::delete),
        )
}

/// Hero slide and carousel routes.
pub fn home_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/hero-slides",
            get(home::hero_slides).post(home::create_hero_slide),
        )
        .route("/hero-slides/order", put(home::reorder_hero_slides))
        .route(
            "/hero-slides/{id}",
            put(home::update_hero_slide).delete(home::delete_hero_slide),
        )
        .route(
            "/carousel",
            get(home::carousel_images).post(home::create_carousel_image),
        )
        .route("/carousel/order", put(home::reorder_carousel_images))
        .route(
            "/carousel/{id}",
            put(home::update_carousel_image).delete(home::delete_carousel_image),
        )
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(product_routes())
        .merge(category_routes())
        .merge(label_routes())
        .merge(offer_routes())
        .merge(news_routes())
        .merge(home_routes());

    Router::new().nest("/api", api)
}
