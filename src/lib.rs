//! Luminova API Library
//!
//! This crate provides the core functionality for the Luminova
//! manufacturing ERP backend.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod lifecycle;
pub mod openapi;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<auth::AuthService>,
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::telemetry::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// The full v1 API surface, permission-gated per subrouter.
pub fn api_v1_routes() -> Router<AppState> {
    // Sales order routes with permission gating
    let sales_read =
        handlers::sales_orders::sales_order_read_routes().with_permission(perm::SALES_ORDERS_READ);
    let sales_create = handlers::sales_orders::sales_order_create_routes()
        .with_permission(perm::SALES_ORDERS_CREATE);
    let sales_update = handlers::sales_orders::sales_order_update_routes()
        .with_permission(perm::SALES_ORDERS_UPDATE);
    let sales_cancel = handlers::sales_orders::sales_order_cancel_routes()
        .with_permission(perm::SALES_ORDERS_CANCEL);
    let sales_invoice = handlers::sales_orders::sales_order_invoice_routes()
        .with_permission(perm::INVOICES_ISSUE);

    // Production order routes with permission gating
    let production_read = handlers::production_orders::production_order_read_routes()
        .with_permission(perm::PRODUCTION_ORDERS_READ);
    let production_write = handlers::production_orders::production_order_write_routes()
        .with_permission(perm::PRODUCTION_ORDERS_UPDATE);

    // Procurement
    let purchase_orders = handlers::purchase_orders::purchase_order_routes()
        .with_permission(perm::PURCHASE_ORDERS_MANAGE);

    // Inventory routes with permission gating
    let inventory_read =
        handlers::inventory::inventory_read_routes().with_permission(perm::INVENTORY_READ);
    let inventory_write =
        handlers::inventory::inventory_write_routes().with_permission(perm::INVENTORY_ADJUST);

    // Catalog routes
    let products_read =
        handlers::products::product_read_routes().with_permission(perm::PRODUCTS_READ);
    let products_write =
        handlers::products::product_write_routes().with_permission(perm::PRODUCTS_MANAGE);

    // Invoices
    let invoices = handlers::invoices::invoice_routes().with_permission(perm::INVOICES_READ);

    // Directories
    let customers = handlers::partners::customer_routes().with_permission(perm::CUSTOMERS_MANAGE);
    let suppliers = handlers::partners::supplier_routes().with_permission(perm::SUPPLIERS_MANAGE);

    // Administration
    let roles = handlers::roles::role_routes().with_permission(perm::ROLES_MANAGE);
    let users = handlers::users::user_routes().with_permission(perm::USERS_MANAGE);

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Sales orders API (auth + permissions)
        .nest(
            "/sales-orders",
            Router::new()
                .merge(sales_read)
                .merge(sales_create)
                .merge(sales_update)
                .merge(sales_cancel)
                .merge(sales_invoice),
        )
        // Production orders API (auth + permissions)
        .nest(
            "/production-orders",
            Router::new().merge(production_read).merge(production_write),
        )
        // Procurement
        .nest("/purchase-orders", purchase_orders)
        // Inventory API (auth + permissions)
        .nest(
            "/supply-items",
            Router::new().merge(inventory_read).merge(inventory_write),
        )
        // Finished goods and BOMs
        .nest(
            "/products",
            Router::new().merge(products_read).merge(products_write),
        )
        // Invoices
        .nest("/invoices", invoices)
        // Directories
        .nest("/customers", customers)
        .nest("/suppliers", suppliers)
        // Administration
        .nest("/roles", roles)
        .nest("/users", users)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "service": "luminova-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response = crate::telemetry::scope_request_id(
            crate::telemetry::RequestId::new("meta-123"),
            async { ApiResponse::success("ok") },
        )
        .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_response_includes_request_metadata() {
        let response = crate::telemetry::scope_request_id(
            crate::telemetry::RequestId::new("meta-err"),
            async { ApiResponse::<()>::error("oops".into()) },
        )
        .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-err"));
        assert!(!meta.timestamp.is_empty());
    }
}
