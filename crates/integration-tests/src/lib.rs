//! Integration tests for Apogee Parts.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p apogee-integration-tests
//!
//! # Live tests against running servers and a migrated database
//! apogee-cli migrate all
//! cargo run -p apogee-storefront &
//! cargo run -p apogee-admin &
//! cargo test -p apogee-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - Storefront router, driven in-process
//! - `admin_api` - Admin router, driven in-process
//! - `checkout_flow` - Core flows across cart, offer and quote
//! - `live_catalog` - Admin writes seen by the storefront (ignored by default)

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower_sessions::{MemoryStore, SessionManagerLayer};

/// Database URL nothing listens on. Tests using it must not reach the pool.
pub const UNREACHABLE_DATABASE: &str = "postgres://apogee@localhost:1/apogee";

/// Admin token accepted by [`admin_app`].
pub const ADMIN_TOKEN: &str = "Zx8Qm2Rv7Tn4Wp9Ks3Hd6Jb1Lf5Gc0Ya";

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(UNREACHABLE_DATABASE)
        .expect("lazy pool from a well-formed URL")
}

/// Storefront router with an in-memory session store.
#[must_use]
pub fn storefront_app() -> Router {
    let config = apogee_storefront::config::StorefrontConfig {
        database_url: SecretString::from(UNREACHABLE_DATABASE),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("Qw3Er5Ty7Ui9Op2As4Df6Gh8Jk1Lz3Xc"),
        catalog_cache_ttl: Duration::from_secs(60),
        trust_proxy_headers: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = apogee_storefront::state::AppState::new(config, lazy_pool());
    apogee_storefront::app(state)
        .layer(SessionManagerLayer::new(MemoryStore::default()).with_secure(false))
}

/// Admin router accepting [`ADMIN_TOKEN`].
#[must_use]
pub fn admin_app() -> Router {
    let config = apogee_admin::config::AdminConfig {
        database_url: SecretString::from(UNREACHABLE_DATABASE),
        host: "127.0.0.1".parse().unwrap(),
        port: 3001,
        api_token: SecretString::from(ADMIN_TOKEN),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    apogee_admin::app(apogee_admin::state::AppState::new(config, lazy_pool()))
}

/// Peer address given to in-process requests.
pub const CLIENT_ADDR: &str = "203.0.113.7:51234";

/// Attach a peer address, as `into_make_service_with_connect_info` does
/// for a real connection.
#[must_use]
pub fn from_peer(mut request: Request<Body>, addr: &str) -> Request<Body> {
    let addr: SocketAddr = addr.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// JSON request from [`CLIENT_ADDR`].
#[must_use]
pub fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    from_peer(request, CLIENT_ADDR)
}

/// Body-less request, optionally carrying a session cookie.
#[must_use]
pub fn empty_request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Base URLs and token for the live tests.
pub struct LiveContext {
    pub client: reqwest::Client,
    pub storefront_url: String,
    pub admin_url: String,
    pub admin_token: String,
}

impl LiveContext {
    /// Read `STOREFRONT_BASE_URL`, `ADMIN_BASE_URL` and `ADMIN_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create HTTP client"),
            storefront_url: std::env::var("STOREFRONT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_url: std::env::var("ADMIN_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
            admin_token: std::env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN not set"),
        }
    }

    /// Authorized request to the admin API.
    #[must_use]
    pub fn admin(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/api{path}", self.admin_url))
            .bearer_auth(&self.admin_token)
    }

    /// Request to the storefront API, sharing the client's cookie jar.
    #[must_use]
    pub fn storefront(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/api{path}", self.storefront_url))
    }
}
