use super::common::{
    actor_of, created_response, map_service_error, success_response, validate_input,
    PaginatedResponse,
};
use crate::{
    auth::AuthenticatedUser,
    entities::SalesOrderStatus,
    errors::ApiError,
    handlers::AppState,
    services::sales_orders::CreateSalesOrderRequest,
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SalesOrderListParams {
    pub status: Option<SalesOrderStatus>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CancelSalesOrderRequest {
    pub reason: Option<String>,
}

/// Create a new sales order
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders",
    request_body = CreateSalesOrderRequest,
    responses(
        (status = 201, description = "Sales order created with one production order per line"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn create_sales_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateSalesOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let created = state
        .services
        .sales_orders
        .create_order(payload, actor_of(&user))
        .await
        .map_err(map_service_error)?;

    info!(
        "Sales order created: {} with {} production order(s)",
        created.order.order_number,
        created.production_orders.len()
    );

    Ok(created_response(created))
}

/// List sales orders
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders",
    params(SalesOrderListParams),
    responses((status = 200, description = "Sales orders page")),
    tag = "sales-orders"
)]
pub async fn list_sales_orders(
    State(state): State<AppState>,
    Query(params): Query<SalesOrderListParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let page = params.page.unwrap_or(1);
    let per_page = params.per_page.unwrap_or(20);
    let (orders, total) = state
        .services
        .sales_orders
        .list_orders(params.status, page, per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        orders, page, per_page, total,
    )))
}

/// Get a sales order by ID
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Sales order fetched"),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn get_sales_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .sales_orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Get a sales order by its order number
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/by-number/{order_number}",
    params(("order_number" = String, Path, description = "Order number, e.g. OV-0001")),
    responses(
        (status = 200, description = "Sales order fetched"),
        (status = 404, description = "Sales order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn get_sales_order_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .sales_orders
        .get_order_by_number(&order_number)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Get the lines of a sales order
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}/lines",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses((status = 200, description = "Sales order lines")),
    tag = "sales-orders"
)]
pub async fn get_sales_order_lines(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let lines = state
        .services
        .sales_orders
        .get_lines(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lines))
}

/// Get the audit trail of a sales order
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}/history",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses((status = 200, description = "History events, oldest first")),
    tag = "sales-orders"
)]
pub async fn get_sales_order_history(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    // 404 for unknown orders, empty list for orders without history
    state
        .services
        .sales_orders
        .get_order(order_id)
        .await
        .map_err(map_service_error)?;
    let events = state
        .services
        .history
        .for_sales_order(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(events))
}

/// List the finished-good lots produced for a sales order
#[utoipa::path(
    get,
    path = "/api/v1/sales-orders/{id}/lots",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses((status = 200, description = "Finished-good lots")),
    tag = "sales-orders"
)]
pub async fn get_sales_order_lots(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let lots = state
        .services
        .sales_orders
        .get_lots(order_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lots))
}

/// Confirm a pending sales order
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders/{id}/confirm",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Sales order confirmed"),
        (status = 400, description = "Invalid state transition", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn confirm_sales_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .sales_orders
        .confirm(order_id, actor_of(&user))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Request supplies for a confirmed sales order
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders/{id}/request-supplies",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Supplies requested for order and children"),
        (status = 400, description = "Invalid state transition", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn request_supplies(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .sales_orders
        .request_supplies(order_id, actor_of(&user))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(order))
}

/// Cancel a sales order, cascading to its unfinished production orders
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders/{id}/cancel",
    request_body = CancelSalesOrderRequest,
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses(
        (status = 200, description = "Sales order cancelled"),
        (status = 400, description = "Order already settled", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn cancel_sales_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<CancelSalesOrderRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let order = state
        .services
        .sales_orders
        .cancel(order_id, payload.reason, actor_of(&user))
        .await
        .map_err(map_service_error)?;

    info!("Sales order cancelled: {}", order.order_number);
    Ok(success_response(order))
}

/// Ship one finished-good lot
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders/lots/{lot_id}/ship",
    params(("lot_id" = Uuid, Path, description = "Finished-good lot ID")),
    responses(
        (status = 200, description = "Lot marked shipped"),
        (status = 400, description = "Lot already shipped", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn ship_lot(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(lot_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let lot = state
        .services
        .sales_orders
        .ship_lot(lot_id, actor_of(&user))
        .await
        .map_err(map_service_error)?;
    Ok(success_response(lot))
}

/// Issue the invoice for a sales order
#[utoipa::path(
    post,
    path = "/api/v1/sales-orders/{id}/invoice",
    params(("id" = Uuid, Path, description = "Sales order ID")),
    responses(
        (status = 201, description = "Invoice issued"),
        (status = 400, description = "Order not invoiceable", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice already issued", body = crate::errors::ErrorResponse)
    ),
    tag = "sales-orders"
)]
pub async fn issue_invoice(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let issued = state
        .services
        .invoicing
        .issue(order_id, actor_of(&user))
        .await
        .map_err(map_service_error)?;

    info!("Invoice issued: {}", issued.invoice_number);
    Ok(created_response(issued))
}

/// Read-only sales order routes
pub fn sales_order_read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales_orders))
        .route("/:id", get(get_sales_order))
        .route("/by-number/:order_number", get(get_sales_order_by_number))
        .route("/:id/lines", get(get_sales_order_lines))
        .route("/:id/history", get(get_sales_order_history))
        .route("/:id/lots", get(get_sales_order_lots))
}

/// Order creation routes
pub fn sales_order_create_routes() -> Router<AppState> {
    Router::new().route("/", post(create_sales_order))
}

/// Lifecycle action routes
pub fn sales_order_update_routes() -> Router<AppState> {
    Router::new()
        .route("/:id/confirm", post(confirm_sales_order))
        .route("/:id/request-supplies", post(request_supplies))
        .route("/lots/:lot_id/ship", post(ship_lot))
}

/// Cancellation routes, gated separately
pub fn sales_order_cancel_routes() -> Router<AppState> {
    Router::new().route("/:id/cancel", post(cancel_sales_order))
}

/// Invoice issuance routes
pub fn sales_order_invoice_routes() -> Router<AppState> {
    Router::new().route("/:id/invoice", post(issue_invoice))
}
