//! Shared fixtures for the in-process HTTP tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request};
use axum::response::Response;
use storekeep_core::ManualClock;

use crate::config::ServerConfig;
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret-0123456789abcdef-0123456789";
pub const CLIENT: &str = "10.0.0.1:40000";

/// Isolated state with its own limiter at `rps` and a frozen clock.
pub fn test_state(rps: u32) -> (AppState, ManualClock) {
    let mut config = ServerConfig::default();
    config.rate_limit.requests_per_second = rps;
    config.auth.jwt_secret = TEST_SECRET.to_string();

    let clock = ManualClock::default();
    let state = AppState::new(config, Arc::new(clock.clone()));
    (state, clock)
}

fn builder(method: Method, addr: &str, uri: &str) -> axum::http::request::Builder {
    let addr: SocketAddr = addr.parse().unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(addr))
}

pub fn request_from(addr: &str, uri: &str) -> Request<Body> {
    builder(Method::GET, addr, uri).body(Body::empty()).unwrap()
}

pub fn authed_request_from(addr: &str, uri: &str, authorization: &str) -> Request<Body> {
    builder(Method::GET, addr, uri)
        .header(header::AUTHORIZATION, authorization)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = builder(method, CLIENT, uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn bearer_request(method: Method, uri: &str, token: &str) -> Request<Body> {
    builder(method, CLIENT, uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
