//! Supply consumption semantics: all-or-nothing BOM deduction, completion
//! gating on the bill of materials, and the terminal-state freeze.

mod common;

use common::TestApp;
use luminova_api::entities::ProductionOrderStatus;
use luminova_api::errors::ServiceError;
use luminova_api::services::production_orders::UpdateProductionOrderRequest;
use rust_decimal_macros::dec;

async fn order_ready_for_supplies(app: &TestApp, bom: &[(uuid::Uuid, i32)], quantity: i32) -> uuid::Uuid {
    let customer = app.seed_customer("Consumer").await;
    let product = app.seed_product("CONS-1", dec!(10.00)).await;
    app.set_bom(product, bom).await;

    let created = app.create_sales_order(customer, &[(product, quantity)]).await;
    let sales = &app.state.services.sales_orders;
    sales.confirm(created.order.id, None).await.unwrap();
    sales.request_supplies(created.order.id, None).await.unwrap();
    created.production_orders[0].id
}

#[tokio::test]
async fn consumption_is_rejected_whole_when_any_line_is_short() {
    let app = TestApp::new().await;
    // Plenty of the first supply, not enough of the second.
    let abundant = app.seed_supply_item("ABUNDANT", 1000).await;
    let scarce = app.seed_supply_item("SCARCE", 5).await;
    let op_id = order_ready_for_supplies(&app, &[(abundant, 3), (scarce, 2)], 4).await;

    // Needs 8 of the scarce item but only 5 exist.
    let result = app
        .state
        .services
        .production_orders
        .transition(op_id, ProductionOrderStatus::SuppliesReceived, None)
        .await;
    assert!(matches!(result, Err(ServiceError::InsufficientStock(_))));

    // No partial deduction: both stocks unchanged.
    let inventory = &app.state.services.inventory;
    assert_eq!(inventory.get_supply_item(abundant).await.unwrap().stock, 1000);
    assert_eq!(inventory.get_supply_item(scarce).await.unwrap().stock, 5);

    // The order did not move either.
    let order = app
        .state
        .services
        .production_orders
        .get_order(op_id)
        .await
        .unwrap();
    assert_eq!(order.status, ProductionOrderStatus::SuppliesRequested);
}

#[tokio::test]
async fn consumption_decrements_every_line_on_success() {
    let app = TestApp::new().await;
    let bolts = app.seed_supply_item("BOLTS", 40).await;
    let sheets = app.seed_supply_item("SHEETS", 12).await;
    let op_id = order_ready_for_supplies(&app, &[(bolts, 10), (sheets, 3)], 4).await;

    let outcome = app
        .state
        .services
        .production_orders
        .transition(op_id, ProductionOrderStatus::SuppliesReceived, None)
        .await
        .unwrap();

    let mut consumed = outcome.consumed.clone();
    consumed.sort_by_key(|(_, qty)| *qty);
    assert_eq!(consumed, vec![(sheets, 12), (bolts, 40)]);

    let inventory = &app.state.services.inventory;
    assert_eq!(inventory.get_supply_item(bolts).await.unwrap().stock, 0);
    assert_eq!(inventory.get_supply_item(sheets).await.unwrap().stock, 0);
}

#[tokio::test]
async fn completion_requires_a_bill_of_materials() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("No BOM").await;
    let product = app.seed_product("NOBOM-1", dec!(10.00)).await;

    let created = app.create_sales_order(customer, &[(product, 2)]).await;
    let sales = &app.state.services.sales_orders;
    sales.confirm(created.order.id, None).await.unwrap();
    sales.request_supplies(created.order.id, None).await.unwrap();
    let op_id = created.production_orders[0].id;

    let production = &app.state.services.production_orders;
    // With no BOM lines there is nothing to consume, so the receipt and
    // start pass; completion is where the missing BOM blocks.
    production
        .transition(op_id, ProductionOrderStatus::SuppliesReceived, None)
        .await
        .unwrap();
    production
        .transition(op_id, ProductionOrderStatus::Started, None)
        .await
        .unwrap();
    let result = production
        .transition(op_id, ProductionOrderStatus::Completed, None)
        .await;
    assert!(matches!(result, Err(ServiceError::ValidationError(_))));

    // No lot was created.
    assert!(production.get_lots(op_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn skipping_states_is_rejected() {
    let app = TestApp::new().await;
    let supply = app.seed_supply_item("SKIP-SUP", 100).await;
    let op_id = order_ready_for_supplies(&app, &[(supply, 1)], 1).await;

    let production = &app.state.services.production_orders;
    for target in [
        ProductionOrderStatus::Started,
        ProductionOrderStatus::InProgress,
        ProductionOrderStatus::Completed,
        ProductionOrderStatus::Paused,
    ] {
        let result = production.transition(op_id, target, None).await;
        assert!(
            matches!(result, Err(ServiceError::ValidationError(_))),
            "{:?} should not be reachable from supplies_requested",
            target
        );
    }
}

#[tokio::test]
async fn terminal_orders_are_frozen() {
    let app = TestApp::new().await;
    let supply = app.seed_supply_item("FREEZE-SUP", 100).await;
    let op_id = order_ready_for_supplies(&app, &[(supply, 1)], 1).await;
    app.complete_production_order(op_id).await;

    let production = &app.state.services.production_orders;

    // No more transitions.
    let transition = production
        .transition(op_id, ProductionOrderStatus::Paused, None)
        .await;
    assert!(matches!(transition, Err(ServiceError::ValidationError(_))));

    // No more detail edits.
    let edit = production
        .update_details(
            op_id,
            UpdateProductionOrderRequest {
                sector: Some("assembly".to_string()),
                planned_start: None,
                planned_end: None,
                notes: None,
            },
        )
        .await;
    assert!(matches!(edit, Err(ServiceError::InvalidOperation(_))));
}

#[tokio::test]
async fn pause_and_resume_does_not_consume_twice() {
    let app = TestApp::new().await;
    let supply = app.seed_supply_item("PAUSE-SUP", 10).await;
    let op_id = order_ready_for_supplies(&app, &[(supply, 2)], 3).await;

    let production = &app.state.services.production_orders;
    production
        .transition(op_id, ProductionOrderStatus::SuppliesReceived, None)
        .await
        .unwrap();
    let inventory = &app.state.services.inventory;
    assert_eq!(inventory.get_supply_item(supply).await.unwrap().stock, 4);

    production
        .transition(op_id, ProductionOrderStatus::Paused, None)
        .await
        .unwrap();
    let outcome = production
        .transition(op_id, ProductionOrderStatus::SuppliesReceived, None)
        .await
        .unwrap();

    // Resuming into supplies_received consumes nothing further.
    assert!(outcome.consumed.is_empty());
    assert_eq!(inventory.get_supply_item(supply).await.unwrap().stock, 4);
}
