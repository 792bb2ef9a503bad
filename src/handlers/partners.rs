//! Customer and supplier directory endpoints.

use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError, handlers::AppState, services::partners::CreatePartnerRequest,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

/// Create a customer
#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreatePartnerRequest,
    responses((status = 201, description = "Customer created")),
    tag = "partners"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartnerRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .customers
        .create(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(created))
}

/// List customers
#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(PaginationParams),
    responses((status = 200, description = "Customers page")),
    tag = "partners"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (customers, total) = state
        .services
        .customers
        .list(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        customers,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get a customer by ID
#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses((status = 200, description = "Customer fetched")),
    tag = "partners"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let found = state
        .services
        .customers
        .get(customer_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(found))
}

/// Delete a customer without sales orders
#[utoipa::path(
    delete,
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 409, description = "Customer has sales orders", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .customers
        .delete(customer_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Create a supplier
#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreatePartnerRequest,
    responses((status = 201, description = "Supplier created")),
    tag = "partners"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartnerRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;
    let created = state
        .services
        .suppliers
        .create(payload)
        .await
        .map_err(map_service_error)?;
    Ok(created_response(created))
}

/// List suppliers
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(PaginationParams),
    responses((status = 200, description = "Suppliers page")),
    tag = "partners"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (suppliers, total) = state
        .services
        .suppliers
        .list(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(PaginatedResponse::new(
        suppliers,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get a supplier by ID
#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses((status = 200, description = "Supplier fetched")),
    tag = "partners"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let found = state
        .services
        .suppliers
        .get(supplier_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(found))
}

/// Delete a supplier without purchase orders
#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 409, description = "Supplier has purchase orders", body = crate::errors::ErrorResponse)
    ),
    tag = "partners"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .suppliers
        .delete(supplier_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Customer directory routes
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_customer))
        .route("/", get(list_customers))
        .route("/:id", get(get_customer))
        .route("/:id", delete(delete_customer))
}

/// Supplier directory routes
pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supplier))
        .route("/", get(list_suppliers))
        .route("/:id", get(get_supplier))
        .route("/:id", delete(delete_supplier))
}
