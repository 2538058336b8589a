//! Cart accumulator.
//!
//! A cart is an ordered list of lines, at most one per product. The storefront
//! keeps the whole cart in the visitor's session and writes it back after
//! every mutation, so the type must survive a JSON round trip unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, ProductId};

/// Upper bound for the quantity of a single line.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// Adding zero items.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The line would exceed [`MAX_LINE_QUANTITY`].
    #[error("quantity for a single product cannot exceed {MAX_LINE_QUANTITY}")]
    QuantityTooLarge,
    /// Negative unit price.
    #[error("price cannot be negative")]
    NegativePrice,
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub description: String,
}

impl CartLine {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An item about to be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image: String,
    pub description: String,
}

/// Outcome of [`Cart::update_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Updated,
    Removed,
    NotInCart,
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    items: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    /// Add an item.
    ///
    /// If the product is already in the cart its quantity grows by the
    /// incoming quantity and the stored name, price and image are left as
    /// they were. Otherwise a new line with a fresh id is appended.
    ///
    /// # Errors
    ///
    /// Rejects zero quantities, negative prices, and lines that would exceed
    /// [`MAX_LINE_QUANTITY`]. The cart is unchanged on error.
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if item.price.is_sign_negative() {
            return Err(CartError::NegativePrice);
        }

        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            line.quantity = line
                .quantity
                .checked_add(item.quantity)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or(CartError::QuantityTooLarge)?;
            return Ok(());
        }

        if item.quantity > MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge);
        }

        self.items.push(CartLine {
            id: CartLineId::generate(),
            product_id: item.product_id,
            name: item.name,
            price: item.price,
            quantity: item.quantity,
            image: item.image,
            description: item.description,
        });
        Ok(())
    }

    /// Remove a product. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.product_id != product_id);
        self.items.len() != before
    }

    /// Replace a line's quantity; zero or below removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityTooLarge`] above [`MAX_LINE_QUANTITY`].
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<QuantityChange, CartError> {
        if quantity <= 0 {
            return Ok(if self.remove(product_id) {
                QuantityChange::Removed
            } else {
                QuantityChange::NotInCart
            });
        }

        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= MAX_LINE_QUANTITY)
            .ok_or(CartError::QuantityTooLarge)?;

        match self
            .items
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => {
                line.quantity = quantity;
                Ok(QuantityChange::Updated)
            }
            None => Ok(QuantityChange::NotInCart),
        }
    }

    /// Sum of all quantities.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(product: i32, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(product),
            name: format!("Part {product}"),
            price: Decimal::new(price, 0),
            quantity,
            image: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_adding_same_product_merges_quantities() {
        let mut cart = Cart::new();
        cart.add(item(7, 10, 2)).unwrap();
        let first_id = cart.items()[0].id;
        cart.add(item(7, 10, 3)).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.items()[0].id, first_id);
    }

    #[test]
    fn test_new_products_append_with_fresh_ids() {
        let mut cart = Cart::new();
        cart.add(item(1, 10, 1)).unwrap();
        cart.add(item(2, 10, 1)).unwrap();
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].product_id, ProductId::new(1));
        assert_ne!(cart.items()[0].id, cart.items()[1].id);
    }

    #[test]
    fn test_removing_absent_product_is_noop() {
        let mut cart = Cart::new();
        cart.add(item(1, 10, 1)).unwrap();
        let before = cart.clone();
        assert!(!cart.remove(ProductId::new(99)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = Cart::new();
        cart.add(item(1, 10, 4)).unwrap();
        assert_eq!(
            cart.update_quantity(ProductId::new(1), 0).unwrap(),
            QuantityChange::Removed
        );
        assert!(cart.is_empty());
        assert_eq!(
            cart.update_quantity(ProductId::new(1), -3).unwrap(),
            QuantityChange::NotInCart
        );
    }

    #[test]
    fn test_update_quantity_replaces() {
        let mut cart = Cart::new();
        cart.add(item(1, 10, 4)).unwrap();
        cart.update_quantity(ProductId::new(1), 9).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 9);
        assert_eq!(
            cart.update_quantity(ProductId::new(1), i64::from(MAX_LINE_QUANTITY) + 1),
            Err(CartError::QuantityTooLarge)
        );
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.add(item(1, 10, 2)).unwrap();
        cart.add(item(2, 5, 3)).unwrap();
        assert_eq!(cart.total_price(), Decimal::new(35, 0));
        assert_eq!(cart.total_items(), 5);
    }

    #[test]
    fn test_rejects_zero_quantity_and_overflow() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(item(1, 10, 0)).unwrap_err(), CartError::ZeroQuantity);
        cart.add(item(1, 10, MAX_LINE_QUANTITY)).unwrap();
        assert_eq!(
            cart.add(item(1, 10, 1)).unwrap_err(),
            CartError::QuantityTooLarge
        );
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_merge_only_touches_the_matching_line() {
        let mut cart = Cart::new();
        cart.add(item(1, 10, 1)).unwrap();
        cart.add(item(2, 10, 1)).unwrap();
        cart.add(item(3, 10, 1)).unwrap();
        cart.add(item(2, 10, 4)).unwrap();

        let quantities: Vec<u32> = cart.items().iter().map(|line| line.quantity).collect();
        assert_eq!(quantities, [1, 5, 1]);
        assert_eq!(cart.get(ProductId::new(3)).unwrap().quantity, 1);
    }

    #[test]
    fn test_session_round_trip_preserves_lines() {
        let mut cart = Cart::new();
        let mut nozzle = item(3, 42, 1);
        nozzle.image = "https://cdn.example/nozzle.jpg".to_string();
        nozzle.description = "Graphite nozzle, 29mm".to_string();
        cart.add(nozzle).unwrap();
        cart.add(item(4, 7, 2)).unwrap();

        let stored = serde_json::to_value(&cart).unwrap();
        let reloaded: Cart = serde_json::from_value(stored).unwrap();
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_missing_image_and_description_default_to_empty() {
        let raw = serde_json::json!({
            "items": [{
                "id": "6f1c1f5e-2f55-4c8e-9d0e-3f9a1f1b2c3d",
                "product_id": 5,
                "name": "Shock cord",
                "price": "12.50",
                "quantity": 1
            }]
        });
        let cart: Cart = serde_json::from_value(raw).unwrap();
        assert_eq!(cart.items()[0].image, "");
        assert_eq!(cart.items()[0].description, "");
        assert_eq!(cart.total_price(), Decimal::new(1250, 2));
    }
}
