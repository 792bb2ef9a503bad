//! User account administration endpoints.

use super::common::{created_response, success_response};
use crate::{
    auth::CreateUserRequest,
    errors::ApiError,
    handlers::AppState,
};
use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use tracing::info;

/// Create a user account. Accounts created without a password get the
/// configured default password.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    responses(
        (status = 201, description = "User account created"),
        (status = 409, description = "Duplicate email", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let account = state
        .auth
        .create_user(payload)
        .await
        .map_err(ApiError::from)?;

    info!("User account created: {}", account.email);
    Ok(created_response(account))
}

/// List user accounts with their roles
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses((status = 200, description = "All user accounts")),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let accounts = state
        .auth
        .list_users()
        .await
        .map_err(ApiError::from)?;
    Ok(success_response(accounts))
}

/// Creates the router for user administration
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/", get(list_users))
}
