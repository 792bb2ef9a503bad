//! HTTP-level tests: authentication, permission gating and the invoice
//! document download.

mod common;

use axum::body;
use axum::http::Method;
use common::TestApp;
use luminova_api::auth::{consts as perm, CreateUserRequest};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn requests_without_a_token_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/supply-items", None, None)
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn admin_can_create_and_list_supply_items_over_http() {
    let app = TestApp::new().await;

    let create = app
        .request_authenticated(
            Method::POST,
            "/api/v1/supply-items",
            Some(json!({
                "sku": "HTTP-SUP",
                "name": "HTTP Supply",
                "stock": 12,
                "reorder_threshold": 3,
                "unit_cost": "1.25"
            })),
        )
        .await;
    assert_eq!(create.status(), 201);
    let created = response_json(create).await;
    assert_eq!(created["sku"], "HTTP-SUP");

    let list = app
        .request_authenticated(Method::GET, "/api/v1/supply-items", None)
        .await;
    assert_eq!(list.status(), 200);
    let listed = response_json(list).await;
    assert_eq!(listed["pagination"]["total"], 1);
    assert_eq!(listed["data"][0]["stock"], 12);
}

#[tokio::test]
async fn permissions_gate_each_subrouter() {
    let app = TestApp::new().await;

    // A user who may only read inventory.
    app.state
        .services
        .roles
        .create_role(
            "stock-viewer".to_string(),
            None,
            vec![perm::INVENTORY_READ.to_string()],
        )
        .await
        .unwrap();
    app.auth_service
        .create_user(CreateUserRequest {
            name: "Stock Viewer".to_string(),
            email: "stock@test.local".to_string(),
            password: Some("stock-password-123".to_string()),
            roles: vec!["stock-viewer".to_string()],
        })
        .await
        .unwrap();

    let login = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({
                "email": "stock@test.local",
                "password": "stock-password-123"
            })),
            None,
        )
        .await;
    assert_eq!(login.status(), 200);
    let tokens = response_json(login).await;
    let token = tokens["access_token"].as_str().unwrap().to_string();

    // Allowed: inventory read.
    let read = app
        .request(Method::GET, "/api/v1/supply-items", None, Some(&token))
        .await;
    assert_eq!(read.status(), 200);

    // Denied: inventory write and unrelated resources.
    let write = app
        .request(
            Method::POST,
            "/api/v1/supply-items",
            Some(json!({
                "sku": "DENIED",
                "name": "Denied",
                "stock": 0,
                "reorder_threshold": 0,
                "unit_cost": "1.00"
            })),
            Some(&token),
        )
        .await;
    assert_eq!(write.status(), 403);

    let roles = app
        .request(Method::GET, "/api/v1/roles", None, Some(&token))
        .await;
    assert_eq!(roles.status(), 403);
}

#[tokio::test]
async fn invoice_document_downloads_as_text() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Document Co").await;
    let product = app.seed_product("DOC-1", dec!(30.00)).await;
    let supply = app.seed_supply_item("DOC-SUP", 10).await;
    app.set_bom(product, &[(supply, 1)]).await;

    let created = app.create_sales_order(customer, &[(product, 2)]).await;
    let sales = &app.state.services.sales_orders;
    sales.confirm(created.order.id, None).await.unwrap();
    sales
        .request_supplies(created.order.id, None)
        .await
        .unwrap();
    app.complete_production_order(created.production_orders[0].id)
        .await;

    let issue = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/sales-orders/{}/invoice", created.order.id),
            None,
        )
        .await;
    assert_eq!(issue.status(), 201);
    let invoice = response_json(issue).await;
    let invoice_id = invoice["id"].as_str().unwrap();

    let download = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/invoices/{}/document", invoice_id),
            None,
        )
        .await;
    assert_eq!(download.status(), 200);
    let content_type = download
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let bytes = body::to_bytes(download.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("INVOICE FC-0001"));
    assert!(text.contains("Document Co"));
    assert!(text.contains("TOTAL: 60.00"));
}

#[tokio::test]
async fn insufficient_stock_maps_to_unprocessable_entity() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Short Co").await;
    let product = app.seed_product("SHORT-1", dec!(10.00)).await;
    let supply = app.seed_supply_item("SHORT-SUP", 1).await;
    app.set_bom(product, &[(supply, 5)]).await;

    let created = app.create_sales_order(customer, &[(product, 2)]).await;
    let sales = &app.state.services.sales_orders;
    sales.confirm(created.order.id, None).await.unwrap();
    sales
        .request_supplies(created.order.id, None)
        .await
        .unwrap();

    let response = app
        .request_authenticated(
            Method::POST,
            &format!(
                "/api/v1/production-orders/{}/status",
                created.production_orders[0].id
            ),
            Some(json!({ "status": "supplies_received" })),
        )
        .await;
    assert_eq!(response.status(), 422);
    let payload = response_json(response).await;
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("Insufficient stock"));
}
