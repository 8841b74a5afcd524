//! Per-client rate limiting, applied to every route.
//!
//! Requests are keyed by client IP and checked against the shared
//! [`LimiterRegistry`](storekeep_core::LimiterRegistry) in `AppState`.
//! A denied request is answered with 429 before any handler runs.
//!
//! Configuration: `rate_limit.requests_per_second` (default: 10) and
//! `rate_limit.trust_forwarded_for` in `ServerConfig`.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = client_key(&req, state.config.rate_limit.trust_forwarded_for);

    if !state.limiter.allow(&key) {
        tracing::warn!(client = %key, path = %req.uri().path(), "Rate limit exceeded");
        return AppError::TooManyRequests.into_response();
    }

    next.run(req).await
}

/// The rate-limit key for `req`: the peer IP, or the forwarded client IP
/// when proxy headers are trusted. The port is not part of the key.
pub fn client_key(req: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(ip) = forwarded_ip(req.headers()) {
            return ip.to_string();
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };
    header_ip("x-forwarded-for").or_else(|| header_ip("x-real-ip"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use crate::test_support::{request_from, test_state};

    fn counting_app(state: AppState, hits: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/ping",
                get(move || {
                    let hits = hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        "pong"
                    }
                }),
            )
            .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit))
            .with_state(state)
    }

    #[tokio::test]
    async fn denied_request_never_reaches_handler() {
        let (state, _clock) = test_state(2);
        let hits = Arc::new(AtomicUsize::new(0));
        let app = counting_app(state, hits.clone());

        let mut statuses = Vec::new();
        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(request_from("10.0.0.1:5000", "/ping"))
                .await
                .unwrap();
            statuses.push(response.status());
        }

        assert_eq!(
            statuses,
            vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
        );
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn bucket_refills_with_time() {
        let (state, clock) = test_state(1);
        let app = counting_app(state, Arc::new(AtomicUsize::new(0)));

        let first = app.clone().oneshot(request_from("10.0.0.1:1", "/ping")).await.unwrap();
        let second = app.clone().oneshot(request_from("10.0.0.1:1", "/ping")).await.unwrap();
        clock.advance(Duration::from_secs(1));
        let third = app.oneshot(request_from("10.0.0.1:1", "/ping")).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(third.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn clients_are_limited_independently() {
        let (state, _clock) = test_state(1);
        let app = counting_app(state, Arc::new(AtomicUsize::new(0)));

        let a = app.clone().oneshot(request_from("10.0.0.1:1", "/ping")).await.unwrap();
        let b = app.clone().oneshot(request_from("10.0.0.2:1", "/ping")).await.unwrap();
        let a_again = app.oneshot(request_from("10.0.0.1:1", "/ping")).await.unwrap();

        assert_eq!(a.status(), StatusCode::OK);
        assert_eq!(b.status(), StatusCode::OK);
        assert_eq!(a_again.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn key_ignores_port() {
        let a = request_from("192.168.1.5:1111", "/");
        let b = request_from("192.168.1.5:2222", "/");
        assert_eq!(client_key(&a, false), client_key(&b, false));
        assert_eq!(client_key(&a, false), "192.168.1.5");
    }

    #[test]
    fn missing_connect_info_uses_shared_key() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_key(&req, false), UNKNOWN_CLIENT);
    }

    #[test]
    fn forwarded_header_is_ignored_unless_trusted() {
        let mut req = request_from("10.0.0.9:80", "/");
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());

        assert_eq!(client_key(&req, false), "10.0.0.9");
        assert_eq!(client_key(&req, true), "203.0.113.7");
    }

    #[test]
    fn real_ip_is_used_when_forwarded_for_is_absent_or_bad() {
        let mut req = request_from("10.0.0.9:80", "/");
        req.headers_mut()
            .insert("x-forwarded-for", "not-an-ip".parse().unwrap());
        req.headers_mut()
            .insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_key(&req, true), "198.51.100.2");
    }
}
