//! Product records and the rules every write must satisfy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProductId, ProductLabelId};

/// Longest accepted product name, in characters.
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;

/// Most images a product can carry.
pub const MAX_IMAGES: usize = 20;

/// Validation failures for product writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("product name must be at most {MAX_PRODUCT_NAME_LENGTH} characters")]
    NameTooLong,
    #[error("price cannot be negative")]
    NegativePrice,
    #[error("stock cannot be negative")]
    NegativeStock,
    #[error("a product can have at most {MAX_IMAGES} images")]
    TooManyImages,
    #[error("main image index {index} is out of range for {count} images")]
    MainImageOutOfRange { index: u32, count: usize },
    #[error("discount price must be below the regular price")]
    DiscountNotLower,
    #[error("discount price cannot be negative")]
    NegativeDiscount,
    #[error("discount must start before it ends")]
    DiscountWindowInverted,
}

/// A reduced price valid inside an optional time window.
///
/// Open bounds are unbounded: no start means "already running", no end means
/// "until removed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub price: Decimal,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// Whether `now` lies inside the window (start inclusive, end exclusive).
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|start| start <= now) && self.ends_at.is_none_or(|end| now < end)
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Rich text, stored as submitted.
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub images: Vec<String>,
    pub main_image_index: u32,
    pub stock: i32,
    pub discount: Option<Discount>,
    pub label_ids: Vec<ProductLabelId>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Price a customer pays at `now`.
    #[must_use]
    pub fn effective_price(&self, now: DateTime<Utc>) -> Decimal {
        match &self.discount {
            Some(discount) if discount.is_active(now) => discount.price,
            _ => self.price,
        }
    }

    /// The selected main image, falling back to the first one.
    #[must_use]
    pub fn main_image(&self) -> Option<&str> {
        usize::try_from(self.main_image_index)
            .ok()
            .and_then(|index| self.images.get(index))
            .or_else(|| self.images.first())
            .map(String::as_str)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Fields accepted when creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub main_image_index: u32,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub label_ids: Vec<ProductLabelId>,
    #[serde(default)]
    pub is_published: bool,
}

impl ProductInput {
    /// Normalize and check the input.
    ///
    /// Trims the name, drops blank image URLs, and de-duplicates label ids
    /// while keeping their order. Whether the category and labels exist is
    /// checked by the caller against the database.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductError`] the input violates.
    pub fn validate(mut self) -> Result<Self, ProductError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        if self.name.chars().count() > MAX_PRODUCT_NAME_LENGTH {
            return Err(ProductError::NameTooLong);
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(ProductError::NegativePrice);
        }
        if self.stock < 0 {
            return Err(ProductError::NegativeStock);
        }

        self.images = self
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        if self.images.len() > MAX_IMAGES {
            return Err(ProductError::TooManyImages);
        }
        let in_range = usize::try_from(self.main_image_index)
            .is_ok_and(|index| index < self.images.len());
        if self.images.is_empty() {
            self.main_image_index = 0;
        } else if !in_range {
            return Err(ProductError::MainImageOutOfRange {
                index: self.main_image_index,
                count: self.images.len(),
            });
        }

        if let Some(discount) = &self.discount {
            if discount.price.is_sign_negative() && !discount.price.is_zero() {
                return Err(ProductError::NegativeDiscount);
            }
            if discount.price >= self.price {
                return Err(ProductError::DiscountNotLower);
            }
            if let (Some(start), Some(end)) = (discount.starts_at, discount.ends_at)
                && start >= end
            {
                return Err(ProductError::DiscountWindowInverted);
            }
        }

        let mut seen = std::collections::HashSet::new();
        self.label_ids.retain(|id| seen.insert(*id));

        Ok(self)
    }
}
