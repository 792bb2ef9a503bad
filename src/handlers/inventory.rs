use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::inventory::{AdjustStockRequest, CreateSupplyItemRequest, UpdateSupplyItemRequest},
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use tracing::info;
use uuid::Uuid;

/// Create a supply item
#[utoipa::path(
    post,
    path = "/api/v1/supply-items",
    request_body = CreateSupplyItemRequest,
    responses(
        (status = 201, description = "Supply item created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate SKU", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_supply_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplyItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .inventory
        .create_supply_item(payload)
        .await
        .map_err(map_service_error)?;

    info!("Supply item created: {}", item.sku);
    Ok(created_response(item))
}

/// List supply items
#[utoipa::path(
    get,
    path = "/api/v1/supply-items",
    params(PaginationParams),
    responses((status = 200, description = "Supply items page")),
    tag = "inventory"
)]
pub async fn list_supply_items(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (items, total) = state
        .services
        .inventory
        .list_supply_items(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        items,
        params.page,
        params.per_page,
        total,
    )))
}

/// Supply items at or below their reorder threshold
#[utoipa::path(
    get,
    path = "/api/v1/supply-items/low-stock",
    responses((status = 200, description = "Low-stock supply items")),
    tag = "inventory"
)]
pub async fn get_low_stock_items(
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let items = state
        .services
        .inventory
        .low_stock_items()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(items))
}

/// Get a supply item by ID
#[utoipa::path(
    get,
    path = "/api/v1/supply-items/{id}",
    params(("id" = Uuid, Path, description = "Supply item ID")),
    responses(
        (status = 200, description = "Supply item fetched"),
        (status = 404, description = "Supply item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_supply_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let item = state
        .services
        .inventory
        .get_supply_item(item_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Update a supply item
#[utoipa::path(
    put,
    path = "/api/v1/supply-items/{id}",
    request_body = UpdateSupplyItemRequest,
    params(("id" = Uuid, Path, description = "Supply item ID")),
    responses(
        (status = 200, description = "Supply item updated"),
        (status = 404, description = "Supply item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_supply_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateSupplyItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .inventory
        .update_supply_item(item_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(item))
}

/// Delete a supply item without dependent records
#[utoipa::path(
    delete,
    path = "/api/v1/supply-items/{id}",
    params(("id" = Uuid, Path, description = "Supply item ID")),
    responses(
        (status = 204, description = "Supply item deleted"),
        (status = 409, description = "Item referenced by BOMs or purchase orders", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_supply_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .inventory
        .delete_supply_item(item_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Manually adjust stock with a reason
#[utoipa::path(
    post,
    path = "/api/v1/supply-items/{id}/adjust",
    request_body = AdjustStockRequest,
    params(("id" = Uuid, Path, description = "Supply item ID")),
    responses(
        (status = 200, description = "Stock adjusted"),
        (status = 400, description = "Adjustment would drive stock negative", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let item = state
        .services
        .inventory
        .adjust_stock(item_id, payload)
        .await
        .map_err(map_service_error)?;

    info!("Stock adjusted for {}: now {}", item.sku, item.stock);
    Ok(success_response(item))
}

/// Read-only inventory routes
pub fn inventory_read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_supply_items))
        .route("/low-stock", get(get_low_stock_items))
        .route("/:id", get(get_supply_item))
}

/// Mutating inventory routes
pub fn inventory_write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_supply_item))
        .route("/:id", put(update_supply_item))
        .route("/:id", delete(delete_supply_item))
        .route("/:id/adjust", post(adjust_stock))
}
