//! Offer inserts from checkout.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use apogee_core::offer::OfferDraft;
use apogee_core::{OfferId, OfferStatus};

use super::RepositoryError;

/// Result of a checkout insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedOffer {
    pub id: OfferId,
    pub status: OfferStatus,
    /// `false` when the token was already used and the earlier offer is returned.
    pub created: bool,
}

/// Write access to `shop.offer`.
pub struct OfferRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OfferRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a draft as a pending offer, once per checkout token.
    ///
    /// A second submit with the same token, concurrent or later, inserts
    /// nothing and returns the offer the first one created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` if a stored status is unknown.
    pub async fn submit(
        &self,
        draft: &OfferDraft,
        checkout_token: Uuid,
    ) -> Result<SubmittedOffer, RepositoryError> {
        let contact = &draft.contact;
        let inserted: Option<(i32,)> = sqlx::query_as(
            r"
            INSERT INTO shop.offer (
                items, total, customer_name, email, phone, company,
                street, city, postal_code, country, notes, checkout_token
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (checkout_token) DO NOTHING
            RETURNING id
            ",
        )
        .bind(Json(&draft.items))
        .bind(draft.total)
        .bind(&contact.customer_name)
        .bind(contact.email.as_str())
        .bind(contact.phone.as_deref())
        .bind(contact.company.as_deref())
        .bind(&contact.street)
        .bind(&contact.city)
        .bind(&contact.postal_code)
        .bind(&contact.country)
        .bind(contact.notes.as_deref())
        .bind(checkout_token)
        .fetch_optional(self.pool)
        .await?;

        if let Some((id,)) = inserted {
            return Ok(SubmittedOffer {
                id: OfferId::new(id),
                status: OfferStatus::Pending,
                created: true,
            });
        }

        // Separate statement: the conflicting row may have been committed
        // after the insert's snapshot was taken.
        let (id, status): (i32, String) = sqlx::query_as(
            "SELECT id, status::text FROM shop.offer WHERE checkout_token = $1",
        )
        .bind(checkout_token)
        .fetch_one(self.pool)
        .await?;

        Ok(SubmittedOffer {
            id: OfferId::new(id),
            status: status
                .parse()
                .map_err(|_| RepositoryError::DataCorruption(format!("offer {id} has status {status}")))?,
            created: false,
        })
    }
}
