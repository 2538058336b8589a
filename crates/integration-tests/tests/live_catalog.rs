//! End-to-end catalog and checkout against running servers.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`apogee-cli migrate all`)
//! - The storefront and admin servers running
//! - `ADMIN_API_TOKEN` set to the admin's token
//!
//! Run with: cargo test -p apogee-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

use apogee_integration_tests::LiveContext;

/// Unique-enough suffix so reruns do not collide on names.
fn suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{nanos}")
}

async fn json(resp: reqwest::Response) -> Value {
    resp.json().await.expect("Failed to read JSON body")
}

#[tokio::test]
#[ignore = "Requires running storefront, admin and database"]
async fn test_published_product_can_be_ordered() {
    let ctx = LiveContext::from_env();
    let run = suffix();

    let category = ctx
        .admin(Method::POST, "/categories")
        .json(&json!({ "name": format!("Live {run}") }))
        .send()
        .await
        .unwrap();
    assert_eq!(category.status(), StatusCode::CREATED);
    let category_id = json(category).await["id"].as_i64().unwrap();

    let product = ctx
        .admin(Method::POST, "/products")
        .json(&json!({
            "name": format!("Live part {run}"),
            "price": "12.50",
            "category_id": category_id,
            "stock": 3,
            "is_published": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(product.status(), StatusCode::CREATED);
    let product_id = json(product).await["id"].as_i64().unwrap();

    let shown = ctx
        .storefront(Method::GET, &format!("/products/{product_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(shown.status(), StatusCode::OK);

    let cart = ctx
        .storefront(Method::POST, "/cart/items")
        .json(&json!({ "product_id": product_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(cart.status(), StatusCode::OK);
    assert_eq!(json(cart).await["total_price"], "25.00");

    let checkout = ctx
        .storefront(Method::POST, "/checkout")
        .json(&json!({
            "customer_name": "Live Test",
            "email": "live@launch.example",
            "street": "1 Orbit Way",
            "city": "Kourou",
            "postal_code": "97310",
            "country": "GF",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(checkout.status(), StatusCode::CREATED);
    let offer_id = json(checkout).await["offer_id"].as_i64().unwrap();

    let empty = ctx.storefront(Method::GET, "/cart").send().await.unwrap();
    assert_eq!(json(empty).await["total_items"], 0);

    let accepted = ctx
        .admin(Method::PATCH, &format!("/offers/{offer_id}/status"))
        .json(&json!({ "status": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);
    assert_eq!(json(accepted).await["status"], "accepted");

    let again = ctx
        .admin(Method::PATCH, &format!("/offers/{offer_id}/status"))
        .json(&json!({ "status": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);

    let deleted = ctx
        .admin(Method::DELETE, &format!("/categories/{category_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(json(deleted).await["products_detached"], 1);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_sibling_names_are_unique() {
    let ctx = LiveContext::from_env();
    let name = format!("Sibling {}", suffix());

    let first = ctx
        .admin(Method::POST, "/categories")
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let id = json(first).await["id"].as_i64().unwrap();

    let second = ctx
        .admin(Method::POST, "/categories")
        .json(&json!({ "name": name.to_uppercase() }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    ctx.admin(Method::DELETE, &format!("/categories/{id}"))
        .send()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires running storefront, admin and database"]
async fn test_double_submitted_checkout_creates_one_offer() {
    let ctx = LiveContext::from_env();
    let run = suffix();

    let product = ctx
        .admin(Method::POST, "/products")
        .json(&json!({
            "name": format!("Double click {run}"),
            "price": "4.00",
            "stock": 10,
            "is_published": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(product.status(), StatusCode::CREATED);
    let product_id = json(product).await["id"].as_i64().unwrap();

    let added = ctx
        .storefront(Method::POST, "/cart/items")
        .json(&json!({ "product_id": product_id, "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(added.status(), StatusCode::OK);

    let contact = json!({
        "customer_name": "Live Test",
        "email": "live@launch.example",
        "street": "1 Orbit Way",
        "city": "Kourou",
        "postal_code": "97310",
        "country": "GF",
    });
    let submit = || ctx.storefront(Method::POST, "/checkout").json(&contact).send();
    let (first, second) = tokio::join!(submit(), submit());

    // Whichever request loses the race either sees the emptied cart or
    // gets the same offer back.
    let mut offer_ids = Vec::new();
    let mut created = 0;
    for response in [first.unwrap(), second.unwrap()] {
        match response.status() {
            StatusCode::CREATED => {
                created += 1;
                offer_ids.push(json(response).await["offer_id"].as_i64().unwrap());
            }
            StatusCode::OK => offer_ids.push(json(response).await["offer_id"].as_i64().unwrap()),
            StatusCode::BAD_REQUEST => assert_eq!(json(response).await["error"], "cart is empty"),
            other => panic!("unexpected checkout status {other}"),
        }
    }
    assert_eq!(created, 1);
    offer_ids.dedup();
    assert_eq!(offer_ids.len(), 1);

    ctx.admin(Method::DELETE, &format!("/offers/{}", offer_ids[0]))
        .send()
        .await
        .unwrap();
    ctx.admin(Method::DELETE, &format!("/products/{product_id}"))
        .send()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires running storefront, admin and database"]
async fn test_cart_uses_current_price_despite_cached_listing() {
    let ctx = LiveContext::from_env();
    let name = format!("Repriced {}", suffix());

    let product = ctx
        .admin(Method::POST, "/products")
        .json(&json!({ "name": name, "price": "10.00", "is_published": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(product.status(), StatusCode::CREATED);
    let product_id = json(product).await["id"].as_i64().unwrap();

    // Warm the storefront's product cache with the old price.
    let listing = ctx.storefront(Method::GET, "/products").send().await.unwrap();
    assert_eq!(listing.status(), StatusCode::OK);

    let repriced = ctx
        .admin(Method::PUT, &format!("/products/{product_id}"))
        .json(&json!({ "name": name, "price": "7.00", "is_published": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(repriced.status(), StatusCode::OK);

    let cart = ctx
        .storefront(Method::POST, "/cart/items")
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(cart.status(), StatusCode::OK);
    assert_eq!(json(cart).await["total_price"], "7.00");

    let hidden = ctx
        .admin(Method::PUT, &format!("/products/{product_id}"))
        .json(&json!({ "name": name, "price": "7.00", "is_published": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(hidden.status(), StatusCode::OK);

    let refused = ctx
        .storefront(Method::POST, "/cart/items")
        .json(&json!({ "product_id": product_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::NOT_FOUND);

    ctx.admin(Method::DELETE, &format!("/products/{product_id}"))
        .send()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_repeated_title_gets_a_numbered_slug() {
    let ctx = LiveContext::from_env();
    let run = suffix();
    let title = format!("Static fire {run}");

    let mut ids = Vec::new();
    let mut slugs = Vec::new();
    for _ in 0..2 {
        let created = ctx
            .admin(Method::POST, "/news")
            .json(&json!({ "title": title, "body": "Motor test on pad B." }))
            .send()
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let body = json(created).await;
        ids.push(body["id"].as_i64().unwrap());
        slugs.push(body["slug"].as_str().unwrap().to_string());
    }
    assert_eq!(slugs[0], format!("static-fire-{run}"));
    assert_eq!(slugs[1], format!("static-fire-{run}-2"));

    // A slug chosen by hand is not renamed.
    let explicit = ctx
        .admin(Method::POST, "/news")
        .json(&json!({ "title": "Other", "slug": slugs[0], "body": "Duplicate." }))
        .send()
        .await
        .unwrap();
    assert_eq!(explicit.status(), StatusCode::CONFLICT);

    for id in ids {
        ctx.admin(Method::DELETE, &format!("/news/{id}"))
            .send()
            .await
            .unwrap();
    }
}
