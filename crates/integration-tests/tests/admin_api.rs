//! Admin API tests driven through the router in-process.
//!
//! Every request here is turned away before it reaches the database.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use tower::ServiceExt;

use apogee_integration_tests::{ADMIN_TOKEN, admin_app, body_json};

fn authorized(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_every_api_route_needs_the_token() {
    for (method, uri) in [
        ("GET", "/api/products"),
        ("POST", "/api/categories"),
        ("PUT", "/api/labels/order"),
        ("PATCH", "/api/offers/1/status"),
        ("POST", "/api/news/bulk"),
        ("PUT", "/api/carousel/order"),
        ("DELETE", "/api/hero-slides/3"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = admin_app().oneshot(request).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should be protected"
        );
    }
}

#[tokio::test]
async fn test_basic_auth_is_not_accepted() {
    let request = Request::builder()
        .uri("/api/offers")
        .header(header::AUTHORIZATION, format!("Basic {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = admin_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "missing bearer token");
}

#[tokio::test]
async fn test_product_validation_runs_before_storage() {
    let response = admin_app()
        .oneshot(authorized(
            "POST",
            "/api/products",
            &json!({
                "name": "Carbon frame",
                "price": "20.00",
                "discount": { "price": "25.00" },
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "discount price must be below the regular price"
    );
}

#[tokio::test]
async fn test_news_needs_a_title() {
    let response = admin_app()
        .oneshot(authorized(
            "POST",
            "/api/news",
            &json!({ "title": "   ", "body": "Launch window opens Friday." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reorder_rejects_duplicates_before_storage() {
    let response = admin_app()
        .oneshot(authorized("PUT", "/api/hero-slides/order", &json!({ "ids": [2, 1, 2] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "id 2 appears more than once");
}

#[tokio::test]
async fn test_unknown_offer_status_is_unprocessable() {
    let response = admin_app()
        .oneshot(authorized(
            "PATCH",
            "/api/offers/1/status",
            &json!({ "status": "shipped" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
