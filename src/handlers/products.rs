use super::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
    PaginatedResponse, PaginationParams,
};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::products::{ComponentRequirementRequest, CreateProductRequest, UpdateProductRequest},
};
use axum::{
    extract::{Json, Path, Query, State},
    routing::{delete, get, post, put},
    Router,
};
use tracing::info;
use uuid::Uuid;

/// Create a finished good
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 409, description = "Duplicate SKU", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(payload)
        .await
        .map_err(map_service_error)?;

    info!("Product created: {}", product.sku);
    Ok(created_response(product))
}

/// List products
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(PaginationParams),
    responses((status = 200, description = "Products page")),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let (products, total) = state
        .services
        .products
        .list_products(params.page, params.per_page)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(PaginatedResponse::new(
        products,
        params.page,
        params.per_page,
        total,
    )))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product fetched"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    request_body = UpdateProductRequest,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .update_product(product_id, payload)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(product))
}

/// Delete a product without dependent records
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 409, description = "Product referenced by orders", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .products
        .delete_product(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(no_content_response())
}

/// Get a product's bill of materials
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/components",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Component requirements")),
    tag = "products"
)]
pub async fn get_components(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let components = state
        .services
        .products
        .get_components(product_id)
        .await
        .map_err(map_service_error)?;
    Ok(success_response(components))
}

/// Replace a product's bill of materials
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}/components",
    request_body = Vec<ComponentRequirementRequest>,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Bill of materials replaced"),
        (status = 400, description = "Invalid component line", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn set_components(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<Vec<ComponentRequirementRequest>>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let components = state
        .services
        .products
        .set_components(product_id, payload)
        .await
        .map_err(map_service_error)?;

    info!(
        "Bill of materials replaced for product {} ({} lines)",
        product_id,
        components.len()
    );
    Ok(success_response(components))
}

/// Read-only product routes
pub fn product_read_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .route("/:id/components", get(get_components))
}

/// Mutating product routes
pub fn product_write_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_product))
        .route("/:id", put(update_product))
        .route("/:id", delete(delete_product))
        .route("/:id/components", put(set_components))
}
