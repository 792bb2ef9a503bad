use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Luminova API",
        version = "1.0.0",
        description = r#"
# Luminova Manufacturing ERP API

Backend for the Luminova plant: sales orders, production orders, purchasing,
supply inventory, finished-good lots and invoicing.

## Authentication

All endpoints require a JWT bearer token obtained from `/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Endpoints are gated by `resource:action` permissions carried in the token;
the `admin` role passes every check.

## Error Handling

Errors use a consistent format with appropriate HTTP status codes:

```json
{
  "error": "Bad Request",
  "message": "Validation error: quantity must be positive",
  "request_id": "req-abc123",
  "timestamp": "2026-03-01T00:00:00Z"
}
```
        "#,
        contact(
            name = "Luminova Team",
            email = "dev@luminova.io"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "sales-orders", description = "Sales order lifecycle"),
        (name = "production-orders", description = "Production order state machine"),
        (name = "purchase-orders", description = "Procurement workflow"),
        (name = "inventory", description = "Supply item stock management"),
        (name = "products", description = "Finished goods and bills of materials"),
        (name = "invoices", description = "Invoice issuance and documents"),
        (name = "partners", description = "Customer and supplier directories"),
        (name = "roles", description = "Role and permission administration"),
        (name = "users", description = "User account administration")
    ),
    paths(
        // Sales orders
        crate::handlers::sales_orders::list_sales_orders,
        crate::handlers::sales_orders::create_sales_order,
        crate::handlers::sales_orders::get_sales_order,
        crate::handlers::sales_orders::get_sales_order_by_number,
        crate::handlers::sales_orders::get_sales_order_lines,
        crate::handlers::sales_orders::get_sales_order_history,
        crate::handlers::sales_orders::get_sales_order_lots,
        crate::handlers::sales_orders::confirm_sales_order,
        crate::handlers::sales_orders::request_supplies,
        crate::handlers::sales_orders::cancel_sales_order,
        crate::handlers::sales_orders::ship_lot,
        crate::handlers::sales_orders::issue_invoice,

        // Production orders
        crate::handlers::production_orders::list_production_orders,
        crate::handlers::production_orders::get_production_order,
        crate::handlers::production_orders::get_production_order_lots,
        crate::handlers::production_orders::update_production_order,
        crate::handlers::production_orders::update_production_order_status,
        crate::handlers::production_orders::cancel_production_order,

        // Purchase orders
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::approve_purchase_order,
        crate::handlers::purchase_orders::send_purchase_order,
        crate::handlers::purchase_orders::mark_in_transit,
        crate::handlers::purchase_orders::receive_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,

        // Inventory
        crate::handlers::inventory::create_supply_item,
        crate::handlers::inventory::list_supply_items,
        crate::handlers::inventory::get_low_stock_items,
        crate::handlers::inventory::get_supply_item,
        crate::handlers::inventory::update_supply_item,
        crate::handlers::inventory::delete_supply_item,
        crate::handlers::inventory::adjust_stock,

        // Products
        crate::handlers::products::create_product,
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::get_components,
        crate::handlers::products::set_components,

        // Invoices
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::download_invoice_document,

        // Directories
        crate::handlers::partners::create_customer,
        crate::handlers::partners::list_customers,
        crate::handlers::partners::get_customer,
        crate::handlers::partners::delete_customer,
        crate::handlers::partners::create_supplier,
        crate::handlers::partners::list_suppliers,
        crate::handlers::partners::get_supplier,
        crate::handlers::partners::delete_supplier,

        // Administration
        crate::handlers::roles::list_roles,
        crate::handlers::roles::create_role,
        crate::handlers::roles::get_role,
        crate::handlers::roles::update_role,
        crate::handlers::roles::delete_role,
        crate::handlers::roles::list_permission_catalog,
        crate::handlers::roles::get_role_permissions,
        crate::handlers::roles::set_role_permissions,
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::ListQuery,

            // Status enums
            crate::entities::SalesOrderStatus,
            crate::entities::ProductionOrderStatus,
            crate::entities::PurchaseOrderStatus,
            crate::entities::HistoryEventType,

            // Request types
            crate::services::sales_orders::CreateSalesOrderRequest,
            crate::services::sales_orders::SalesOrderLineRequest,
            crate::handlers::sales_orders::CancelSalesOrderRequest,
            crate::services::production_orders::UpdateProductionOrderRequest,
            crate::handlers::production_orders::UpdateProductionOrderStatusRequest,
            crate::services::purchase_orders::CreatePurchaseOrderRequest,
            crate::services::purchase_orders::UpdateDraftRequest,
            crate::services::purchase_orders::ReceivePurchaseOrderRequest,
            crate::services::inventory::CreateSupplyItemRequest,
            crate::services::inventory::UpdateSupplyItemRequest,
            crate::services::inventory::AdjustStockRequest,
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::products::ComponentRequirementRequest,
            crate::services::partners::CreatePartnerRequest,
            crate::handlers::roles::CreateRoleRequest,
            crate::handlers::roles::UpdateRoleRequest,
            crate::handlers::roles::SetPermissionsRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
