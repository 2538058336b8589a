//! Apogee Core - domain types and pure storefront logic.
//!
//! This crate is shared by every Apogee component:
//! - `storefront` - Public catalog, cart and checkout API
//! - `admin` - Catalog and content management API
//! - `cli` - Migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Services load state, hand it to these types for validation
//! and computation, and persist the result.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails and statuses
//! - [`cart`] - Cart accumulator with session round-trip
//! - [`catalog`] - Category tree and product rules
//! - [`content`] - News, hero slides, carousel images and labels
//! - [`offer`] - Checkout drafting from a cart
//! - [`ordering`] - Display-order reassignment for drag-and-drop lists
//! - [`quote`] - 3D-print price and duration estimator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod content;
pub mod offer;
pub mod ordering;
pub mod quote;
pub mod types;

pub use types::*;
