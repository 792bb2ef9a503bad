use super::common::{map_service_error, success_response, PaginatedResponse, PaginationParams};
use crate::{errors::ApiError, handlers::AppState};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use uuid::Uuid;

/// List issued invoices
#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    params(PaginationParams),
    responses((status = 200, description = "Invoices page")),
    tag = "invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (invoices, total) = state
        .services
        .invoicing
        .list_invoices(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        invoices,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get an invoice by ID
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice fetched"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state
        .services
        .invoicing
        .get_invoice(invoice_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(issued))
}

/// Download the invoice document as plain text
#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}/document",
    params(("id" = Uuid, Path, description = "Invoice ID")),
    responses(
        (status = 200, description = "Invoice document", content_type = "text/plain"),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    tag = "invoices"
)]
pub async fn download_invoice_document(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state
        .services
        .invoicing
        .get_invoice(invoice_id)
        .await
        .map_err(map_service_error)?;
    let document = state
        .services
        .invoicing
        .render_document(invoice_id)
        .await
        .map_err(map_service_error)?;

    let disposition = format!("attachment; filename=\"{}.txt\"", issued.invoice_number);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document,
    ))
}

/// Creates the router for invoice endpoints
pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/document", get(download_invoice_document))
}
