use super::common::{actor_of, map_service_error, success_response};
use crate::{
    auth::AuthenticatedUser,
    entities::ProductionOrderStatus,
    errors::ApiError,
    handlers::AppState,
    services::production_orders::UpdateProductionOrderRequest,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ProductionOrderListParams {
    pub status: Option<ProductionOrderStatus>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProductionOrderStatusRequest {
    pub status: ProductionOrderStatus,
}

/// List production orders, optionally by status
#[utoipa::path(
    get,
    path = "/api/v1/production-orders",
    params(ProductionOrderListParams),
    responses((status = 200, description = "Production orders page")),
    tag = "production-orders"
)]
pub async fn list_production_orders(
    State(state): State<AppState>,
    Query(params): Query<ProductionOrderListParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (orders, total) = state
        .services
        .production_orders
        .list_orders(params.status, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(
        super::common::PaginatedResponse::new(orders, page, per_page, total),
    ))
}

/// Get a production order by ID
#[utoipa::path(
    get,
    path = "/api/v1/production-orders/{id}",
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production order fetched"),
        (status = 404, description = "Production order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "production-orders"
)]
pub async fn get_production_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .production_orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// List the lots produced by a production order
#[utoipa::path(
    get,
    path = "/api/v1/production-orders/{id}/lots",
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses((status = 200, description = "Finished-good lots")),
    tag = "production-orders"
)]
pub async fn get_production_order_lots(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let lots = state
        .services
        .production_orders
        .get_lots(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lots))
}

/// Update sector, schedule and notes of an open production order
#[utoipa::path(
    put,
    path = "/api/v1/production-orders/{id}",
    request_body = UpdateProductionOrderRequest,
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production order updated"),
        (status = 400, description = "Order is terminal", body = crate::errors::ErrorResponse)
    ),
    tag = "production-orders"
)]
pub async fn update_production_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateProductionOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .production_orders
        .update_details(order_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Move a production order to a new status
#[utoipa::path(
    post,
    path = "/api/v1/production-orders/{id}/status",
    request_body = UpdateProductionOrderStatusRequest,
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Transition applied with its effects"),
        (status = 400, description = "Invalid transition or missing BOM", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "production-orders"
)]
pub async fn update_production_order_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateProductionOrderStatusRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let outcome = state
        .services
        .production_orders
        .transition(order_id, payload.status, actor_of(&user))
        .await
        .map_err(map_service_error)?;

    info!(
        "Production order {} moved to {}",
        outcome.order.order_number, outcome.order.status
    );
    Ok(success_response(outcome))
}

/// Cancel a production order
#[utoipa::path(
    post,
    path = "/api/v1/production-orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Production order ID")),
    responses(
        (status = 200, description = "Production order cancelled"),
        (status = 400, description = "Order already terminal", body = crate::errors::ErrorResponse)
    ),
    tag = "production-orders"
)]
pub async fn cancel_production_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let outcome = state
        .services
        .production_orders
        .cancel(order_id, actor_of(&user))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(outcome))
}

/// Read-only production order routes
pub fn production_order_read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_production_orders))
        .route("/:id", get(get_production_order))
        .route("/:id/lots", get(get_production_order_lots))
}

/// Mutating production order routes
pub fn production_order_write_routes() -> Router<AppState> {
    Router::new()
        .route("/:id", put(update_production_order))
        .route("/:id/status", post(update_production_order_status))
        .route("/:id/cancel", post(cancel_production_order))
}
