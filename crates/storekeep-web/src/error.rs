use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use storekeep_core::{AuthError, CoreError};

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Auth(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests,
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::TooManyRequests => {
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => AppError::BadRequest(msg),
            CoreError::NotFound("product") => AppError::NotFound("Product not found".to_string()),
            CoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            CoreError::Conflict(msg) => AppError::Conflict(msg),
            CoreError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn rate_limit_renders_429() {
        let (status, body) = body_json(AppError::TooManyRequests).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Too many requests");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let (status, body) = body_json(AppError::Internal("db exploded".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn auth_errors_map_to_401_with_their_message() {
        let (status, body) = body_json(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token expired");
    }

    #[tokio::test]
    async fn core_errors_map_to_status() {
        let (status, body) = body_json(CoreError::NotFound("product").into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Product not found");

        let (status, _) = body_json(CoreError::Conflict("taken".to_string()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = body_json(CoreError::Validation("bad".to_string()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
