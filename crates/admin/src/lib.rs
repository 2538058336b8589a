//! Apogee Admin library.
//!
//! The admin JSON API: catalog, category tree, labels, news, home page
//! content and offer review. It owns the `shop` schema migrations.
//!
//! # Security
//!
//! Every `/api` route requires the shared `ADMIN_API_TOKEN`. Deploy behind
//! a private network; the token is the only gate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// The admin router with health checks and the authenticated API.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::AdminConfig;

    const TOKEN: &str = "Zx8Qm2Rv7Tn4Wp9Ks3Hd6Jb1Lf5Gc0Ya";

    /// A router whose pool never connects; only paths that stop before the
    /// database are exercised.
    fn test_app() -> Router {
        let config = AdminConfig {
            database_url: SecretString::from("postgres://apogee@localhost:1/apogee"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            api_token: SecretString::from(TOKEN),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://apogee@localhost:1/apogee")
            .unwrap();
        app(AppState::new(config, pool))
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn error_message(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let response = test_app()
            .oneshot(request("GET", "/health", None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let response = test_app()
            .oneshot(request("GET", "/api/offers", None, ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "missing bearer token");
    }

    #[tokio::test]
    async fn test_wrong_token_is_rejected() {
        let response = test_app()
            .oneshot(request(
                "GET",
                "/api/products",
                Some("Zx8Qm2Rv7Tn4Wp9Ks3Hd6Jb1Lf5Gc0Yb"),
                "",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(response).await, "invalid token");
    }

    #[tokio::test]
    async fn test_empty_bulk_selection_is_rejected() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/news/bulk",
                Some(TOKEN),
                r#"{"action": "publish", "ids": []}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "no articles selected");
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected_before_the_database() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/products",
                Some(TOKEN),
                r#"{"name": "   ", "price": "12.50"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "product name cannot be empty");
    }

    #[tokio::test]
    async fn test_invalid_label_color_is_rejected() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/labels",
                Some(TOKEN),
                r#"{"name": "Sale", "color": "red"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_bulk_action_is_unprocessable() {
        let response = test_app()
            .oneshot(request(
                "POST",
                "/api/news/bulk",
                Some(TOKEN),
                r#"{"action": "archive", "ids": [1]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
