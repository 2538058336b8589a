//! Core flows that span several modules: browsing, cart, offer drafting.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use apogee_core::cart::{Cart, CartItem, QuantityChange};
use apogee_core::catalog::{CategoryNode, CategoryTree, Discount, Product};
use apogee_core::offer::{ContactForm, OfferDraft, OfferError};
use apogee_core::ordering::{move_item, reorder};
use apogee_core::{CategoryId, HeroSlideId, OfferStatus, ProductId};

fn product(id: i32, price: Decimal, discount: Option<Discount>) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(id),
        name: format!("Part {id}"),
        description: String::new(),
        price,
        category_id: None,
        images: vec![format!("https://cdn.example/{id}.jpg")],
        main_image_index: 0,
        stock: 5,
        discount,
        label_ids: Vec::new(),
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

fn add(cart: &mut Cart, product: &Product, quantity: u32) {
    cart.add(CartItem {
        product_id: product.id,
        name: product.name.clone(),
        price: product.effective_price(Utc::now()),
        quantity,
        image: product.main_image().unwrap_or_default().to_string(),
        description: product.description.clone(),
    })
    .unwrap();
}

fn contact() -> ContactForm {
    ContactForm {
        customer_name: "Ada Pilot".to_string(),
        email: "Ada@Launch.Example".to_string(),
        phone: String::new(),
        company: String::new(),
        street: "1 Orbit Way".to_string(),
        city: "Kourou".to_string(),
        postal_code: "97310".to_string(),
        country: "GF".to_string(),
        notes: String::new(),
    }
}

#[test]
fn test_cart_to_offer() {
    let running_sale = Discount {
        price: Decimal::new(800, 2),
        starts_at: Some(Utc::now() - Duration::days(1)),
        ends_at: None,
    };
    let motor = product(1, Decimal::new(1250, 2), Some(running_sale));
    let frame = product(2, Decimal::new(4990, 2), None);

    let mut cart = Cart::new();
    add(&mut cart, &motor, 2);
    add(&mut cart, &frame, 1);
    add(&mut cart, &motor, 2);

    assert_eq!(cart.items().len(), 2);
    assert_eq!(cart.get(motor.id).unwrap().quantity, 4);
    // 4 * 8.00 + 49.90
    assert_eq!(cart.total_price(), Decimal::new(8190, 2));

    let draft = OfferDraft::from_cart(&cart, contact()).unwrap();
    assert_eq!(draft.total, Decimal::new(8190, 2));
    assert_eq!(draft.total_items(), 5);
    assert_eq!(draft.items, cart.items());
    assert_eq!(draft.contact.email.as_str(), "Ada@launch.example");
    assert_eq!(draft.contact.phone, None);

    // The draft is a snapshot: later cart edits do not touch it.
    cart.clear();
    assert_eq!(draft.items.len(), 2);
}

#[test]
fn test_quantity_edits_before_checkout() {
    let frame = product(2, Decimal::new(4990, 2), None);
    let mut cart = Cart::new();
    add(&mut cart, &frame, 1);

    assert_eq!(cart.update_quantity(frame.id, 3).unwrap(), QuantityChange::Updated);
    assert_eq!(cart.total_items(), 3);
    assert_eq!(cart.update_quantity(frame.id, 0).unwrap(), QuantityChange::Removed);
    assert_eq!(
        OfferDraft::from_cart(&cart, contact()),
        Err(OfferError::EmptyCart)
    );
}

#[test]
fn test_offer_review_is_one_way() {
    let status = OfferStatus::default();
    assert_eq!(status, OfferStatus::Pending);
    assert!(status.can_transition_to(OfferStatus::Accepted));
    assert!(!OfferStatus::Accepted.can_transition_to(OfferStatus::Rejected));
    assert!(OfferStatus::Rejected.is_terminal());
}

#[test]
fn test_category_filter_covers_subcategories() {
    let node = |id: i32, parent: Option<i32>, name: &str| CategoryNode {
        id: CategoryId::new(id),
        parent_id: parent.map(CategoryId::new),
        name: name.to_string(),
    };
    let tree = CategoryTree::from_nodes([
        node(1, None, "Drones"),
        node(2, Some(1), "Frames"),
        node(3, Some(2), "5 inch"),
        node(4, None, "Printers"),
    ])
    .unwrap();

    let drones = tree.subtree_set(CategoryId::new(1)).unwrap();
    assert_eq!(drones.len(), 3);
    assert!(drones.contains(&CategoryId::new(3)));
    assert!(!drones.contains(&CategoryId::new(4)));

    assert_eq!(
        tree.path(CategoryId::new(3)).unwrap(),
        ["Drones", "Frames", "5 inch"]
    );
    assert!(tree.validate_new(Some(CategoryId::new(3)), "Arms").is_err());
    assert!(tree.validate_new(Some(CategoryId::new(2)), "FRAMES").is_ok());
    assert!(tree.validate_new(None, "drones").is_err());
}

#[test]
fn test_drag_and_drop_reorder() {
    let stored: Vec<(HeroSlideId, i32)> = (1..=4).map(|id| (HeroSlideId::new(id), id - 1)).collect();
    let ids: Vec<HeroSlideId> = stored.iter().map(|(id, _)| *id).collect();

    // Drag the last slide to the front.
    let requested = move_item(&ids, 3, 0).unwrap();
    let changes = reorder(&stored, &requested).unwrap();

    assert_eq!(changes.len(), 4);
    assert_eq!(changes[0].id, HeroSlideId::new(4));
    assert_eq!(changes[0].display_order, 0);
    assert_eq!(changes[3].id, HeroSlideId::new(3));
    assert_eq!(changes[3].display_order, 3);

    // Dropping it where it already was changes nothing.
    assert!(reorder(&stored, &ids).unwrap().is_empty());
}
