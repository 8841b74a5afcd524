use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use storekeep_core::{bearer_token, VerifiedIdentity};

use crate::error::AppError;
use crate::state::AppState;

/// Authentication gate for protected routes.
///
/// Verifies the bearer token and stores the [`VerifiedIdentity`] in the
/// request extensions; any failure ends the request with 401.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let identity = match bearer_token(header).and_then(|token| state.tokens.verify(token)) {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), reason = ?e, "Rejected unauthenticated request");
            return AppError::from(e).into_response();
        }
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// The caller's identity, as established by [`require_auth`].
pub struct AuthUser(pub VerifiedIdentity);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedIdentity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))
    }
}
