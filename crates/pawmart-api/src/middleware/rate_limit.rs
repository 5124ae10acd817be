//! Gate middleware for the contact-submission endpoint.
//!
//! Applied as a `route_layer` on `POST /contact` only; every other route
//! bypasses it entirely.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::envelope::MessageResponse;
use crate::rate_limiter::{RateLimitError, RateLimiter};

pub const REJECTION_MESSAGE: &str = "Too many messages sent. Please try again later.";

#[derive(Clone)]
pub struct GateState {
    pub limiter: Arc<RateLimiter>,
    /// When set, forwarded-for headers from the reverse proxy identify the
    /// client; otherwise only the socket peer address is used.
    pub trust_proxy: bool,
}

pub async fn rate_limit_middleware(
    State(gate): State<GateState>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = extract_identifier(&request, gate.trust_proxy);

    match gate.limiter.check_and_increment(&identifier) {
        Ok(quota) => {
            debug!("Rate limit check passed for identifier: {}", identifier);

            let mut response = next.run(request).await;
            add_rate_limit_headers(
                &mut response,
                quota.used,
                quota.reset_after_seconds,
                &gate.limiter,
            );
            response
        }
        Err(RateLimitError::LimitExceeded {
            requests,
            limit,
            retry_after_seconds,
        }) => {
            warn!(
                "Rate limit exceeded for identifier '{}': {}/{} requests",
                identifier, requests, limit
            );

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(MessageResponse::failure(REJECTION_MESSAGE)),
            )
                .into_response();
            add_rate_limit_headers(&mut response, requests, retry_after_seconds, &gate.limiter);
            if let Ok(retry_header) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert("Retry-After", retry_header);
            }
            response
        }
    }
}

/// Resolve the client identity for rate limiting.
///
/// With a trusted proxy: first entry of `x-forwarded-for`, then `x-real-ip`.
/// Otherwise (and as fallback) the socket peer address.
fn extract_identifier(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded_for) = request.headers().get("x-forwarded-for")
            && let Ok(forwarded_str) = forwarded_for.to_str()
            && let Some(first_ip) = forwarded_str.split(',').next()
            && !first_ip.trim().is_empty()
        {
            return first_ip.trim().to_string();
        }

        if let Some(real_ip) = request.headers().get("x-real-ip")
            && let Ok(ip_str) = real_ip.to_str()
        {
            return ip_str.to_string();
        }
    }

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Draft-standard rate limit headers; the legacy `X-RateLimit-*` family is
/// deliberately not emitted.
fn add_rate_limit_headers(
    response: &mut Response,
    used: i64,
    reset_after_seconds: i64,
    rate_limiter: &RateLimiter,
) {
    let headers = response.headers_mut();

    if let Ok(limit_header) = HeaderValue::from_str(&rate_limiter.max_requests().to_string()) {
        headers.insert("RateLimit-Limit", limit_header);
    }

    let remaining = (rate_limiter.max_requests() - used).max(0);
    if let Ok(remaining_header) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("RateLimit-Remaining", remaining_header);
    }

    if let Ok(reset_header) = HeaderValue::from_str(&reset_after_seconds.to_string()) {
        headers.insert("RateLimit-Reset", reset_header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::RateLimitConfig;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn test_extract_identifier_from_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "192.168.1.1, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_identifier(&request, true), "192.168.1.1");
    }

    #[test]
    fn test_forwarded_for_ignored_without_trusted_proxy() {
        let request = Request::builder()
            .header("x-forwarded-for", "192.168.1.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_identifier(&request, false), "unknown");
    }

    #[test]
    fn test_extract_identifier_from_real_ip() {
        let request = Request::builder()
            .header("x-real-ip", "192.168.1.100")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_identifier(&request, true), "192.168.1.100");
    }

    #[test]
    fn test_extract_identifier_from_connect_info() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 51234))));

        assert_eq!(extract_identifier(&request, true), "127.0.0.1");
    }

    #[test]
    fn test_rate_limit_headers_added() {
        let rate_limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            window_seconds: 600,
            cleanup_interval_seconds: 600,
        });

        let mut response = Response::new(Body::empty());
        add_rate_limit_headers(&mut response, 1, 480, &rate_limiter);

        let headers = response.headers();
        assert_eq!(headers.get("RateLimit-Limit").unwrap(), "1");
        assert_eq!(headers.get("RateLimit-Remaining").unwrap(), "0");
        assert_eq!(headers.get("RateLimit-Reset").unwrap(), "480");
        assert!(headers.get("X-RateLimit-Limit").is_none());
    }
}
