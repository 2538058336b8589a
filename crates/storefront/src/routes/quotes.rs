//! 3D-print quote estimates.

use axum::Json;
use tracing::instrument;

use apogee_core::quote::{self, QuoteEstimate, QuoteRequest};

use crate::error::Result;

/// Price and print time for an uploaded model's volume.
#[instrument]
pub async fn estimate(Json(request): Json<QuoteRequest>) -> Result<Json<QuoteEstimate>> {
    Ok(Json(quote::estimate(&request)?))
}
