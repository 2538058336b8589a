//! HTTP middleware and extractors for admin.
//!
//! # Request path (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. [`RequireAdminToken`] on every `/api` handler

pub mod auth;

pub use auth::RequireAdminToken;
