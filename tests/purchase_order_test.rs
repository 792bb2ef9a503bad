//! Purchase order workflow: drafts book on-order quantity, draft edits
//! reconcile by the delta, receipts move goods into stock, cancellation
//! releases the unreceived remainder.

mod common;

use common::TestApp;
use luminova_api::entities::PurchaseOrderStatus;
use luminova_api::errors::ServiceError;
use luminova_api::services::purchase_orders::{
    CreatePurchaseOrderRequest, ReceivePurchaseOrderRequest, UpdateDraftRequest,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn draft_order(app: &TestApp, supplier: Uuid, item: Uuid, quantity: i32) -> Uuid {
    app.state
        .services
        .purchase_orders
        .create_order(CreatePurchaseOrderRequest {
            supplier_id: supplier,
            supply_item_id: item,
            quantity,
            unit_price: dec!(2.50),
            notes: None,
        })
        .await
        .expect("create purchase order")
        .id
}

async fn on_order(app: &TestApp, item: Uuid) -> i32 {
    app.state
        .services
        .inventory
        .get_supply_item(item)
        .await
        .unwrap()
        .quantity_on_order
}

#[tokio::test]
async fn creating_a_draft_books_the_quantity_on_order() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let item = app.seed_supply_item("RESIN", 0).await;

    let order_id = draft_order(&app, supplier, item, 40).await;
    let order = app
        .state
        .services
        .purchase_orders
        .get_order(order_id)
        .await
        .unwrap();

    assert_eq!(order.order_number, "OC-0001");
    assert_eq!(order.status, PurchaseOrderStatus::Draft);
    assert_eq!(order.total, dec!(100.00));
    assert_eq!(on_order(&app, item).await, 40);
}

#[tokio::test]
async fn editing_a_draft_quantity_adjusts_on_order_by_the_delta() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let item = app.seed_supply_item("RESIN", 0).await;
    let order_id = draft_order(&app, supplier, item, 40).await;

    // 40 -> 55: delta of +15.
    app.state
        .services
        .purchase_orders
        .update_draft(
            order_id,
            UpdateDraftRequest {
                supplier_id: None,
                supply_item_id: None,
                quantity: Some(55),
                unit_price: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(on_order(&app, item).await, 55);

    // 55 -> 30: delta of -25.
    app.state
        .services
        .purchase_orders
        .update_draft(
            order_id,
            UpdateDraftRequest {
                supplier_id: None,
                supply_item_id: None,
                quantity: Some(30),
                unit_price: None,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(on_order(&app, item).await, 30);
}

#[tokio::test]
async fn switching_the_supply_item_moves_the_booking() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let resin = app.seed_supply_item("RESIN", 0).await;
    let glass = app.seed_supply_item("GLASS", 0).await;
    let order_id = draft_order(&app, supplier, resin, 40).await;

    app.state
        .services
        .purchase_orders
        .update_draft(
            order_id,
            UpdateDraftRequest {
                supplier_id: None,
                supply_item_id: Some(glass),
                quantity: Some(25),
                unit_price: None,
                notes: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(on_order(&app, resin).await, 0);
    assert_eq!(on_order(&app, glass).await, 25);
}

#[tokio::test]
async fn only_drafts_can_be_edited() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let item = app.seed_supply_item("RESIN", 0).await;
    let order_id = draft_order(&app, supplier, item, 40).await;

    app.state
        .services
        .purchase_orders
        .transition(order_id, PurchaseOrderStatus::Approved)
        .await
        .unwrap();

    let edit = app
        .state
        .services
        .purchase_orders
        .update_draft(
            order_id,
            UpdateDraftRequest {
                supplier_id: None,
                supply_item_id: None,
                quantity: Some(10),
                unit_price: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(edit, Err(ServiceError::InvalidOperation(_))));
    assert_eq!(on_order(&app, item).await, 40);
}

#[tokio::test]
async fn receipts_move_goods_from_on_order_into_stock() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let item = app.seed_supply_item("RESIN", 10).await;
    let order_id = draft_order(&app, supplier, item, 40).await;

    let purchasing = &app.state.services.purchase_orders;
    purchasing
        .transition(order_id, PurchaseOrderStatus::Approved)
        .await
        .unwrap();
    purchasing
        .transition(order_id, PurchaseOrderStatus::SentToSupplier)
        .await
        .unwrap();

    // Goods cannot be received before they are on their way.
    let early = purchasing
        .receive(order_id, ReceivePurchaseOrderRequest { quantity: Some(5) })
        .await;
    assert!(matches!(early, Err(ServiceError::InvalidOperation(_))));

    purchasing
        .transition(order_id, PurchaseOrderStatus::InTransit)
        .await
        .unwrap();

    // Partial receipt.
    let order = purchasing
        .receive(order_id, ReceivePurchaseOrderRequest { quantity: Some(15) })
        .await
        .unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::PartiallyReceived);
    assert_eq!(order.quantity_received, 15);
    let item_state = app
        .state
        .services
        .inventory
        .get_supply_item(item)
        .await
        .unwrap();
    assert_eq!(item_state.stock, 25);
    assert_eq!(item_state.quantity_on_order, 25);

    // Over-receiving is rejected.
    let over = purchasing
        .receive(order_id, ReceivePurchaseOrderRequest { quantity: Some(30) })
        .await;
    assert!(matches!(over, Err(ServiceError::ValidationError(_))));

    // Receiving the remainder closes the order.
    let order = purchasing
        .receive(order_id, ReceivePurchaseOrderRequest { quantity: None })
        .await
        .unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Received);
    assert_eq!(order.quantity_received, 40);
    let item_state = app
        .state
        .services
        .inventory
        .get_supply_item(item)
        .await
        .unwrap();
    assert_eq!(item_state.stock, 50);
    assert_eq!(item_state.quantity_on_order, 0);

    // Terminal: no further receipts or cancellation.
    let again = purchasing
        .receive(order_id, ReceivePurchaseOrderRequest { quantity: Some(1) })
        .await;
    assert!(matches!(again, Err(ServiceError::InvalidOperation(_))));
    let cancel = purchasing.cancel(order_id).await;
    assert!(matches!(cancel, Err(ServiceError::ValidationError(_))));
}

#[tokio::test]
async fn cancelling_releases_the_unreceived_remainder() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let item = app.seed_supply_item("RESIN", 0).await;
    let order_id = draft_order(&app, supplier, item, 40).await;

    let purchasing = &app.state.services.purchase_orders;
    purchasing
        .transition(order_id, PurchaseOrderStatus::Approved)
        .await
        .unwrap();
    purchasing
        .transition(order_id, PurchaseOrderStatus::SentToSupplier)
        .await
        .unwrap();
    purchasing
        .transition(order_id, PurchaseOrderStatus::InTransit)
        .await
        .unwrap();
    purchasing
        .receive(order_id, ReceivePurchaseOrderRequest { quantity: Some(10) })
        .await
        .unwrap();

    let order = purchasing.cancel(order_id).await.unwrap();
    assert_eq!(order.status, PurchaseOrderStatus::Cancelled);

    // Received goods stay in stock; the outstanding 30 are released.
    let item_state = app
        .state
        .services
        .inventory
        .get_supply_item(item)
        .await
        .unwrap();
    assert_eq!(item_state.stock, 10);
    assert_eq!(item_state.quantity_on_order, 0);
}

#[tokio::test]
async fn approval_path_rejects_skips() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Supplies").await;
    let item = app.seed_supply_item("RESIN", 0).await;
    let order_id = draft_order(&app, supplier, item, 5).await;

    let purchasing = &app.state.services.purchase_orders;
    let skipped = purchasing
        .transition(order_id, PurchaseOrderStatus::InTransit)
        .await;
    assert!(matches!(skipped, Err(ServiceError::ValidationError(_))));

    let direct_receipt = purchasing
        .transition(order_id, PurchaseOrderStatus::Received)
        .await;
    assert!(matches!(direct_receipt, Err(ServiceError::InvalidOperation(_))));
}
