use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storekeep_core::{NewProduct, PageRequest, Product, ProductPage, ProductUpdate};

use crate::auth::middleware::AuthUser;
use crate::dto::ListProductsQuery;
use crate::error::AppError;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid product ID".to_string()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let product = state.products.create(json_body(body)?)?;
    tracing::info!(product_id = product.id, user_id = user.user_id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Json<ProductPage> {
    let page = PageRequest::new(query.page(), query.limit());
    Json(state.products.list(page))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = state.products.get(parse_id(&id)?)?;
    Ok(Json(product))
}

pub async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ProductUpdate>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let id = parse_id(&id)?;
    let product = state.products.update(id, &json_body(body)?)?;
    tracing::info!(product_id = id, user_id = user.user_id, "Product updated");
    Ok(Json(product))
}

pub async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    state.products.delete(id)?;
    tracing::info!(product_id = id, user_id = user.user_id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}
