use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use storekeep_core::model::validate_registration;

use crate::auth::password;
use crate::dto::*;
use crate::error::AppError;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_registration(&body.username, &body.password)?;

    // Cheap pre-check so taken names don't pay for a hash; the store still
    // enforces uniqueness on insert.
    if state.users.exists(&body.username) {
        return Err(AppError::Conflict("username already exists".to_string()));
    }

    let password = body.password;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = state.users.create(&body.username, hash)?;
    let issued = state.tokens.issue(user.id, &user.username)?;
    tracing::info!(user_id = user.id, "Registered user: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let Some(user) = state.users.find_by_username(&body.username) else {
        tracing::warn!("Failed login attempt for unknown user: {}", body.username);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    };

    let hash = user.password_hash.clone();
    let password = body.password;
    let valid = tokio::task::spawn_blocking(move || password::verify_password(&hash, &password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    if !valid {
        tracing::warn!("Failed login attempt for user: {}", user.username);
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let issued = state.tokens.issue(user.id, &user.username)?;
    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(Json(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}
