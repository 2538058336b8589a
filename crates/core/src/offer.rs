//! Offers: cart snapshots submitted for review.
//!
//! Checkout does not take payment. The customer's cart and contact details
//! are frozen into an [`OfferDraft`], stored as a pending [`Offer`], and an
//! admin later accepts or rejects it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{Cart, CartLine};
use crate::types::{Email, EmailError, OfferId, OfferStatus, round_money};

/// Longest accepted value for any single contact field.
pub const MAX_FIELD_LENGTH: usize = 200;

/// Longest accepted free-text note.
pub const MAX_NOTES_LENGTH: usize = 4000;

/// Reasons a checkout is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfferError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} is too long")]
    FieldTooLong(&'static str),
    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Contact details as typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub customer_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub notes: String,
}

/// Validated contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub customer_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub notes: Option<String>,
}

impl TryFrom<ContactForm> for Contact {
    type Error = OfferError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        Ok(Self {
            customer_name: required(&form.customer_name, "customer_name")?,
            email: Email::parse(&form.email)?,
            phone: optional(&form.phone, "phone", MAX_FIELD_LENGTH)?,
            company: optional(&form.company, "company", MAX_FIELD_LENGTH)?,
            street: required(&form.street, "street")?,
            city: required(&form.city, "city")?,
            postal_code: required(&form.postal_code, "postal_code")?,
            country: required(&form.country, "country")?,
            notes: optional(&form.notes, "notes", MAX_NOTES_LENGTH)?,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, OfferError> {
    optional(value, field, MAX_FIELD_LENGTH)?.ok_or(OfferError::MissingField(field))
}

fn optional(value: &str, field: &'static str, max: usize) -> Result<Option<String>, OfferError> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        return Err(OfferError::FieldTooLong(field));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// An offer ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferDraft {
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub contact: Contact,
}

impl OfferDraft {
    /// Snapshot `cart` together with validated contact details.
    ///
    /// The cart itself is left alone; the caller clears it once the offer is
    /// stored.
    ///
    /// # Errors
    ///
    /// [`OfferError::EmptyCart`] for an empty cart, otherwise the first
    /// contact field that fails validation.
    pub fn from_cart(cart: &Cart, contact: ContactForm) -> Result<Self, OfferError> {
        if cart.is_empty() {
            return Err(OfferError::EmptyCart);
        }
        let contact = Contact::try_from(contact)?;
        Ok(Self {
            items: cart.items().to_vec(),
            total: round_money(cart.total_price()),
            contact,
        })
    }

    /// Sum of quantities across the snapshot.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// A stored offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub items: Vec<CartLine>,
    pub total: Decimal,
    pub contact: Contact,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::CartItem;
    use crate::types::ProductId;

    fn form() -> ContactForm {
        ContactForm {
            customer_name: " Ada Lovelace ".to_string(),
            email: "ada@Example.org".to_string(),
            phone: String::new(),
            company: "  ".to_string(),
            street: "1 Launch Rd".to_string(),
            city: "Kiruna".to_string(),
            postal_code: "981 92".to_string(),
            country: "SE".to_string(),
            notes: "Please ship together".to_string(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem {
            product_id: ProductId::new(1),
            name: "Fin can".to_string(),
            price: Decimal::new(1999, 2),
            quantity: 2,
            image: String::new(),
            description: String::new(),
        })
        .unwrap();
        cart
    }

    #[test]
    fn test_draft_snapshots_cart() {
        let draft = OfferDraft::from_cart(&cart(), form()).unwrap();
        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.total, Decimal::new(3998, 2));
        assert_eq!(draft.total_items(), 2);
        assert_eq!(draft.contact.customer_name, "Ada Lovelace");
        assert_eq!(draft.contact.email.as_str(), "ada@example.org");
        assert_eq!(draft.contact.phone, None);
        assert_eq!(draft.contact.company, None);
        assert_eq!(draft.contact.notes.as_deref(), Some("Please ship together"));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        assert_eq!(
            OfferDraft::from_cart(&Cart::new(), form()),
            Err(OfferError::EmptyCart)
        );
    }

    #[test]
    fn test_required_fields() {
        let mut missing = form();
        missing.city = "   ".to_string();
        assert_eq!(
            OfferDraft::from_cart(&cart(), missing),
            Err(OfferError::MissingField("city"))
        );

        let mut bad_email = form();
        bad_email.email = "not-an-email".to_string();
        assert_eq!(
            OfferDraft::from_cart(&cart(), bad_email),
            Err(OfferError::Email(EmailError::AtSymbol))
        );

        let mut long = form();
        long.street = "x".repeat(MAX_FIELD_LENGTH + 1);
        assert_eq!(
            OfferDraft::from_cart(&cart(), long),
            Err(OfferError::FieldTooLong("street"))
        );
    }
}
