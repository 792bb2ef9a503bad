//! Role and permission administration endpoints.

use super::common::{
    created_response, map_service_error, no_content_response, success_response,
};
use crate::{
    auth::PERMISSION_CATALOG,
    errors::ApiError,
    handlers::AppState,
};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetPermissionsRequest {
    pub permissions: Vec<String>,
}

/// List roles with their permission sets
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses((status = 200, description = "All roles")),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let roles = state
        .services
        .roles
        .list_roles()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(roles))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created"),
        (status = 400, description = "Unknown permission", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate role name", body = crate::errors::ErrorResponse)
    ),
    tag = "roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let role = state
        .services
        .roles
        .create_role(payload.name, payload.description, payload.permissions)
        .await
        .map_err(map_service_error)?;

    info!("Role created: {}", role.name);
    Ok(created_response(role))
}

/// Get a role with its permission set
#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role fetched"),
        (status = 404, description = "Role not found", body = crate::errors::ErrorResponse)
    ),
    tag = "roles"
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let role = state
        .services
        .roles
        .get_role(role_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(role))
}

/// Rename or re-describe a role
#[utoipa::path(
    put,
    path = "/api/v1/roles/{id}",
    request_body = UpdateRoleRequest,
    params(("id" = Uuid, Path, description = "Role ID")),
    responses((status = 200, description = "Role updated")),
    tag = "roles"
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let role = state
        .services
        .roles
        .update_role(role_id, payload.name, payload.description)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(role))
}

/// Delete an unassigned role
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 409, description = "Role still assigned to users", body = crate::errors::ErrorResponse)
    ),
    tag = "roles"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .roles
        .delete_role(role_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Full permission catalog roles can draw from
#[utoipa::path(
    get,
    path = "/api/v1/roles/permissions",
    responses((status = 200, description = "Permission catalog")),
    tag = "roles"
)]
pub async fn list_permission_catalog() -> impl axum::response::IntoResponse {
    success_response(PERMISSION_CATALOG)
}

/// Get a role's permission set
#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}/permissions",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses((status = 200, description = "Permission set")),
    tag = "roles"
)]
pub async fn get_role_permissions(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let permissions = state
        .services
        .roles
        .permissions_for(role_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(permissions))
}

/// Replace a role's permission set
#[utoipa::path(
    put,
    path = "/api/v1/roles/{id}/permissions",
    request_body = SetPermissionsRequest,
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Permission set replaced"),
        (status = 400, description = "Unknown permission", body = crate::errors::ErrorResponse)
    ),
    tag = "roles"
)]
pub async fn set_role_permissions(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<SetPermissionsRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let permissions = state
        .services
        .roles
        .set_permissions(role_id, payload.permissions)
        .await
        .map_err(map_service_error)?;

    info!("Permissions replaced for role {}", role_id);
    Ok(success_response(permissions))
}

/// Creates the router for role administration
pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles))
        .route("/", post(create_role))
        .route("/permissions", get(list_permission_catalog))
        .route("/:id", get(get_role))
        .route("/:id", put(update_role))
        .route("/:id", delete(delete_role))
        .route("/:id/permissions", get(get_role_permissions))
        .route("/:id/permissions", put(set_role_permissions))
}
