mod auth_handlers;
mod health;
pub mod products;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::middleware::require_auth;
use crate::state::AppState;

/// `/health` and `/metrics`: rate limited, never authenticated.
pub fn system_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
}

/// Registration and login, mounted under `/api/v1/auth`.
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login))
}

/// Product routes behind the authentication gate.
pub fn protected_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get_by_id)
                .put(products::update)
                .delete(products::delete),
        )
        .route_layer(from_fn_with_state(state, require_auth))
}
