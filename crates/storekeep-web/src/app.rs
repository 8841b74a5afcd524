use axum::http::{header, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::middleware::metrics::track_metrics;
use crate::middleware::rate_limit::rate_limit;
use crate::middleware::security_headers::security_headers;
use crate::state::AppState;

/// Full application router.
///
/// Product routes add the authentication gate after the rate limit, so every
/// request is throttled before its token is looked at.
pub fn build_app(state: AppState) -> Router {
    let v1 = Router::new()
        .nest("/auth", api::auth_router())
        .merge(api::protected_router(state.clone()));

    let routes = Router::new()
        .merge(api::system_router())
        .nest("/api/v1", v1);

    with_service_layers(routes, &state).with_state(state)
}

/// Wraps `router` in the service-wide middleware. Each `layer` call wraps
/// everything before it, so the outermost is tracing, then CORS, timeout,
/// body limit, security headers, metrics and finally the rate limit.
fn with_service_layers(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    router
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .layer(from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_bytes))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
