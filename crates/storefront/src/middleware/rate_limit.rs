//! Rate limiting using governor and `tower_governor`.
//!
//! Only the endpoints that write offers or burn CPU are limited:
//! - `checkout_rate_limiter`: ~6 offers per minute per IP
//! - `quote_rate_limiter`: ~60 estimates per minute per IP
//!
//! The server must be started with
//! `into_make_service_with_connect_info::<SocketAddr>()` so the peer
//! address is available.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers that carry the client IP, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip", "fly-client-ip"];

/// Keys requests by client IP.
///
/// With `trust_proxy_headers` set (deployments behind Cloudflare or Fly.io)
/// the proxy headers are read first; for `x-forwarded-for` only the first
/// address in the chain is used. Otherwise the headers are ignored, since
/// any client can set them. Either way the peer address is the fallback.
#[derive(Debug, Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self { trust_proxy_headers }
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let from_headers = self
            .trust_proxy_headers
            .then(|| {
                let headers = req.headers();
                CLIENT_IP_HEADERS
                    .iter()
                    .filter_map(|name| headers.get(*name))
                    .filter_map(|value| value.to_str().ok())
                    .find_map(|value| value.split(',').next()?.trim().parse::<IpAddr>().ok())
            })
            .flatten();

        from_headers
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Checkout: one token every 10 seconds, burst of 3.
///
/// # Panics
///
/// Never: both settings are non-zero constants.
#[must_use]
pub fn checkout_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(10)
        .burst_size(3)
        .finish()
        .expect("rate limiter config with per_second(10) and burst_size(3) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Quote estimates: one token per second, burst of 20.
///
/// # Panics
///
/// Never: both settings are non-zero constants.
#[must_use]
pub fn quote_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(1)
        .burst_size(20)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(20) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    const BEHIND_PROXY: ClientIpKeyExtractor = ClientIpKeyExtractor::new(true);
    const DIRECT: ClientIpKeyExtractor = ClientIpKeyExtractor::new(false);

    fn request(headers: &[(&str, &str)], peer: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(peer) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        }
        req
    }

    fn ip(value: &str) -> IpAddr {
        value.parse().unwrap()
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let req = request(
            &[
                ("x-forwarded-for", "10.0.0.1"),
                ("cf-connecting-ip", "203.0.113.7"),
            ],
            Some("10.0.0.2:41000"),
        );
        assert_eq!(BEHIND_PROXY.extract(&req).unwrap(), ip("203.0.113.7"));
    }

    #[test]
    fn test_first_forwarded_address_is_used() {
        let req = request(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")], None);
        assert_eq!(BEHIND_PROXY.extract(&req).unwrap(), ip("198.51.100.2"));
    }

    #[test]
    fn test_garbage_falls_through_to_next_header() {
        let req = request(
            &[("cf-connecting-ip", "not-an-ip"), ("fly-client-ip", "192.0.2.9")],
            None,
        );
        assert_eq!(BEHIND_PROXY.extract(&req).unwrap(), ip("192.0.2.9"));
    }

    #[test]
    fn test_peer_address_is_the_fallback() {
        let req = request(&[], Some("192.0.2.44:52311"));
        assert_eq!(BEHIND_PROXY.extract(&req).unwrap(), ip("192.0.2.44"));
        assert_eq!(DIRECT.extract(&req).unwrap(), ip("192.0.2.44"));
        assert!(DIRECT.extract(&request(&[], None)).is_err());
    }

    #[test]
    fn test_direct_mode_ignores_spoofed_headers() {
        let req = request(
            &[("x-forwarded-for", "198.51.100.2"), ("cf-connecting-ip", "203.0.113.7")],
            Some("192.0.2.44:52311"),
        );
        assert_eq!(DIRECT.extract(&req).unwrap(), ip("192.0.2.44"));
    }
}
