//! Response models for the storefront API.

pub mod session;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use apogee_core::cart::{Cart, CartLine};
use apogee_core::catalog::Product;
use apogee_core::content::ProductLabel;

pub use session::session_keys;

/// A product as shown to visitors.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Price after any discount running right now.
    pub effective_price: Decimal,
    pub on_sale: bool,
    pub main_image: Option<String>,
    /// Category names from the root down to the product's category.
    pub category_path: Vec<String>,
    pub labels: Vec<ProductLabel>,
}

impl ProductView {
    #[must_use]
    pub fn new(
        product: Product,
        category_path: Vec<String>,
        labels: Vec<ProductLabel>,
        now: DateTime<Utc>,
    ) -> Self {
        let effective_price = product.effective_price(now);
        Self {
            on_sale: effective_price < product.price,
            main_image: product.main_image().map(str::to_string),
            effective_price,
            product,
            category_path,
            labels,
        }
    }
}

/// The session cart with computed totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_items: u64,
    pub total_price: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total_items: cart.total_items(),
            total_price: cart.total_price(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use apogee_core::ProductId;
    use apogee_core::cart::CartItem;
    use apogee_core::catalog::Discount;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_product_view_applies_discount() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let product = Product {
            id: ProductId::new(4),
            name: "Motor retainer 38mm".to_string(),
            description: String::new(),
            price: Decimal::new(2400, 2),
            category_id: None,
            images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            main_image_index: 1,
            stock: 2,
            discount: Some(Discount {
                price: Decimal::new(1900, 2),
                starts_at: None,
                ends_at: None,
            }),
            label_ids: Vec::new(),
            is_published: true,
            created_at: now,
            updated_at: now,
        };

        let view = ProductView::new(product, vec!["Motors".to_string()], Vec::new(), now);
        assert!(view.on_sale);
        assert_eq!(view.effective_price, Decimal::new(1900, 2));
        assert_eq!(view.main_image.as_deref(), Some("b.jpg"));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["name"], "Motor retainer 38mm");
        assert_eq!(json["effective_price"], "19.00");
        assert_eq!(json["category_path"][0], "Motors");
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = Cart::new();
        cart.add(CartItem {
            product_id: ProductId::new(1),
            name: "Launch lug".to_string(),
            price: Decimal::new(250, 2),
            quantity: 4,
            image: String::new(),
            description: String::new(),
        })
        .unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.total_items, 4);
        assert_eq!(view.total_price, Decimal::new(10, 0));
    }
}
