use super::common::{
    created_response, map_service_error, success_response, validate_input, PaginatedResponse,
};
use crate::{
    auth::AuthenticatedUser,
    entities::PurchaseOrderStatus,
    errors::ApiError,
    handlers::AppState,
    services::purchase_orders::{
        CreatePurchaseOrderRequest, ReceivePurchaseOrderRequest, UpdateDraftRequest,
    },
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct PurchaseOrderListParams {
    pub status: Option<PurchaseOrderStatus>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

/// Create a draft purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Draft purchase order created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier or supply item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<CreatePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .purchase_orders
        .create_order(payload)
        .await
        .map_err(map_service_error)?;

    info!("Purchase order created: {}", order.order_number);
    Ok(created_response(order))
}

/// List purchase orders, optionally by status
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders",
    params(PurchaseOrderListParams),
    responses((status = 200, description = "Purchase orders page")),
    tag = "purchase-orders"
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    Query(params): Query<PurchaseOrderListParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (orders, total) = state
        .services
        .purchase_orders
        .list_orders(params.status, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        orders, page, per_page, total,
    )))
}

/// Get a purchase order by ID
#[utoipa::path(
    get,
    path = "/api/v1/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order fetched"),
        (status = 404, description = "Purchase order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Update a draft purchase order
#[utoipa::path(
    put,
    path = "/api/v1/purchase-orders/{id}",
    request_body = UpdateDraftRequest,
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Draft updated; on-order quantities reconciled"),
        (status = 400, description = "Order is no longer a draft", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateDraftRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .update_draft(order_id, payload)
        .await
        .map_err(map_service_error)?;

    info!("Purchase order updated: {}", order.order_number);
    Ok(success_response(order))
}

/// Approve a draft purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/approve",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order approved"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .transition(order_id, PurchaseOrderStatus::Approved)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Mark an approved purchase order as sent to the supplier
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/send",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order sent"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn send_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .transition(order_id, PurchaseOrderStatus::SentToSupplier)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Mark a sent purchase order as in transit
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/in-transit",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order in transit"),
        (status = 400, description = "Invalid transition", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn mark_in_transit(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .transition(order_id, PurchaseOrderStatus::InTransit)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Book a full or partial receipt for a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/receive",
    request_body = ReceivePurchaseOrderRequest,
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Receipt booked; stock and on-order updated"),
        (status = 400, description = "Order cannot receive goods", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ReceivePurchaseOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let order = state
        .services
        .purchase_orders
        .receive(order_id, payload)
        .await
        .map_err(map_service_error)?;

    info!(
        "Purchase order received: {} ({}/{})",
        order.order_number, order.quantity_received, order.quantity
    );
    Ok(success_response(order))
}

/// Cancel a purchase order
#[utoipa::path(
    post,
    path = "/api/v1/purchase-orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Purchase order ID")),
    responses(
        (status = 200, description = "Purchase order cancelled"),
        (status = 400, description = "Order already terminal", body = crate::errors::ErrorResponse)
    ),
    tag = "purchase-orders"
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .purchase_orders
        .cancel(order_id)
        .await
        .map_err(map_service_error)?;

    info!("Purchase order cancelled: {}", order.order_number);
    Ok(success_response(order))
}

/// Creates the router for purchase order endpoints
pub fn purchase_order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_purchase_order))
        .route("/", get(list_purchase_orders))
        .route("/:id", get(get_purchase_order))
        .route("/:id", put(update_purchase_order))
        .route("/:id/approve", post(approve_purchase_order))
        .route("/:id/send", post(send_purchase_order))
        .route("/:id/in-transit", post(mark_in_transit))
        .route("/:id/receive", post(receive_purchase_order))
        .route("/:id/cancel", post(cancel_purchase_order))
}
