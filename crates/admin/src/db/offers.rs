//! Offer review.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use apogee_core::cart::CartLine;
use apogee_core::offer::{Contact, Offer};
use apogee_core::{Email, OfferId, OfferStatus};

use super::RepositoryError;

const OFFER_COLUMNS: &str = "id, items, total, customer_name, email, phone, company, street, \
                             city, postal_code, country, notes, status::text AS status, \
                             created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct OfferRow {
    id: OfferId,
    items: Json<Vec<CartLine>>,
    total: Decimal,
    customer_name: String,
    email: String,
    phone: Option<String>,
    company: Option<String>,
    street: String,
    city: String,
    postal_code: String,
    country: String,
    notes: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = RepositoryError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("offer {} has invalid email: {e}", row.id))
        })?;
        let status = row
            .status
            .parse::<OfferStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: row.id,
            items: row.items.0,
            total: row.total,
            contact: Contact {
                customer_name: row.customer_name,
                email,
                phone: row.phone,
                company: row.company,
                street: row.street,
                city: row.city,
                postal_code: row.postal_code,
                country: row.country,
                notes: row.notes,
            },
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for submitted offers.
pub struct OfferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferRepository<'a> {
    /// Create a new offer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Offers newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn list(&self, status: Option<OfferStatus>) -> Result<Vec<Offer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            SELECT {OFFER_COLUMNS}
            FROM shop.offer
            WHERE $1::text IS NULL OR status = $1::shop.offer_status
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status.map(OfferStatus::as_str))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Offer::try_from).collect()
    }

    /// Get an offer by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn get(&self, id: OfferId) -> Result<Option<Offer>, RepositoryError> {
        let row = sqlx::query_as::<_, OfferRow>(&format!(
            "SELECT {OFFER_COLUMNS} FROM shop.offer WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Offer::try_from).transpose()
    }

    /// Accept or reject a pending offer.
    ///
    /// The write only happens while the offer is still pending, so of two
    /// concurrent reviews exactly one wins.
    ///
    /// # Errors
    ///
    /// `Conflict` when `next` is not a decision or the offer was already
    /// decided, `NotFound` for unknown ids.
    pub async fn set_status(&self, id: OfferId, next: OfferStatus) -> Result<Offer, RepositoryError> {
        OfferStatus::Pending
            .transition_to(next)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let row = sqlx::query_as::<_, OfferRow>(&format!(
            r"
            UPDATE shop.offer
            SET status = $2::shop.offer_status, updated_at = now()
            WHERE id = $1 AND status = 'pending'
            RETURNING {OFFER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next.as_str())
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = row {
            tracing::info!(offer_id = %id, status = %next, "Offer reviewed");
            return Offer::try_from(row);
        }

        match self.get(id).await? {
            Some(current) => Err(RepositoryError::Conflict(
                current
                    .status
                    .transition_to(next)
                    .map_or_else(|e| e.to_string(), |_| format!("offer {id} changed concurrently")),
            )),
            None => Err(RepositoryError::NotFound(format!("offer {id}"))),
        }
    }

    /// Delete an offer.
    ///
    /// # Errors
    ///
    /// Returns error if the database query fails.
    pub async fn delete(&self, id: OfferId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.offer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
