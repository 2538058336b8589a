//! Storefront API tests driven through the router in-process.
//!
//! Only paths that stop before the database are exercised here; see
//! `live_catalog.rs` for the full flow against running servers.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::json;
use tower::ServiceExt;

use apogee_integration_tests::{body_json, empty_request, from_peer, json_request, storefront_app};

fn decimal(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = storefront_app()
        .oneshot(empty_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn test_new_visitor_has_empty_cart() {
    let response = storefront_app()
        .oneshot(empty_request("GET", "/api/cart", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["total_items"], 0);
    assert_eq!(decimal(&body["total_price"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_removing_absent_product_is_a_no_op() {
    let response = storefront_app()
        .oneshot(empty_request("DELETE", "/api/cart/items/42", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["items"], json!([]));
}

#[tokio::test]
async fn test_setting_quantity_of_absent_product() {
    let response = storefront_app()
        .oneshot(json_request(
            "PATCH",
            "/api/cart/items/42",
            &json!({ "quantity": 2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "product 42 in cart not found");

    // Zero on an absent line just returns the cart.
    let response = storefront_app()
        .oneshot(json_request(
            "PATCH",
            "/api/cart/items/42",
            &json!({ "quantity": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_checkout_with_empty_cart() {
    let contact = json!({
        "customer_name": "Ada Pilot",
        "email": "ada@launch.example",
        "street": "1 Orbit Way",
        "city": "Kourou",
        "postal_code": "97310",
        "country": "GF",
    });
    let response = storefront_app()
        .oneshot(json_request("POST", "/api/checkout", &contact))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "cart is empty");
}

#[tokio::test]
async fn test_quote_estimate() {
    let request = json!({
        "volume_mm3": 100_000.0,
        "material": "pla",
        "layer_height": "0.2",
        "infill": 20,
    });
    let response = storefront_app()
        .oneshot(json_request("POST", "/api/quotes/estimate", &request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(decimal(&body["price"]), Decimal::new(100, 0));
    assert_eq!(decimal(&body["volume_cm3"]), Decimal::new(100, 0));
    assert_eq!(body["minimum_applied"], false);
    assert_eq!(body["duration_minutes"], 600);
}

#[tokio::test]
async fn test_quote_rejects_bad_volume() {
    let request = json!({
        "volume_mm3": 0.0,
        "material": "petg",
        "layer_height": "0.1",
        "infill": 50,
    });
    let response = storefront_app()
        .oneshot(json_request("POST", "/api/quotes/estimate", &request))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "model volume must be a positive number"
    );
}

#[tokio::test]
async fn test_checkout_is_limited_by_peer_address() {
    let app = storefront_app();
    let contact = json!({
        "customer_name": "Ada Pilot",
        "email": "ada@launch.example",
        "street": "1 Orbit Way",
        "city": "Kourou",
        "postal_code": "97310",
        "country": "GF",
    });

    // A fresh forwarded-for value on every request does not buy a new bucket.
    let mut statuses = Vec::new();
    for n in 1..=4 {
        let mut request = json_request("POST", "/api/checkout", &contact);
        request
            .headers_mut()
            .insert("x-forwarded-for", format!("198.51.100.{n}").parse().unwrap());
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }
    assert_eq!(
        statuses,
        [
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );

    // Another client still has its own allowance.
    let request = from_peer(
        axum::http::Request::builder()
            .method("POST")
            .uri("/api/checkout")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(contact.to_string()))
            .unwrap(),
        "192.0.2.10:40000",
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
