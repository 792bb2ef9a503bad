//! End-to-end tests for the sales order lifecycle: creation fans out one
//! production order per line, supply consumption gates production, lot
//! shipment completes the order and invoicing snapshots the total.

mod common;

use common::TestApp;
use luminova_api::entities::{ProductionOrderStatus, SalesOrderStatus};
use rust_decimal_macros::dec;

#[tokio::test]
async fn creating_an_order_spawns_one_production_order_per_line() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Nova Lighting").await;
    let lamp = app.seed_product("LAMP-1", dec!(120.00)).await;
    let panel = app.seed_product("PANEL-1", dec!(89.50)).await;
    let frame = app.seed_product("FRAME-1", dec!(15.00)).await;

    let created = app
        .create_sales_order(customer, &[(lamp, 3), (panel, 2), (frame, 10)])
        .await;

    assert_eq!(created.order.order_number, "OV-0001");
    assert_eq!(created.order.status, SalesOrderStatus::Pending);
    assert_eq!(created.production_orders.len(), 3);

    // Uniquely numbered, one per line, pending.
    let mut numbers: Vec<_> = created
        .production_orders
        .iter()
        .map(|op| op.order_number.clone())
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 3);
    assert!(created
        .production_orders
        .iter()
        .all(|op| op.status == ProductionOrderStatus::Pending));

    // Total equals the sum of snapshotted line subtotals.
    let expected = dec!(120.00) * rust_decimal::Decimal::from(3)
        + dec!(89.50) * rust_decimal::Decimal::from(2)
        + dec!(15.00) * rust_decimal::Decimal::from(10);
    assert_eq!(created.order.total, expected);
}

#[tokio::test]
async fn worked_example_consumes_twenty_units_of_supply() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Example Co").await;
    let product = app.seed_product("P", dec!(10.00)).await;
    let insumo_a = app.seed_supply_item("INSUMO-A", 25).await;
    app.set_bom(product, &[(insumo_a, 2)]).await;

    let created = app.create_sales_order(customer, &[(product, 10)]).await;
    assert_eq!(created.order.order_number, "OV-0001");
    let op = &created.production_orders[0];
    assert_eq!(op.order_number, "OP-00001");

    let sales = &app.state.services.sales_orders;
    sales.confirm(created.order.id, None).await.unwrap();
    sales.request_supplies(created.order.id, None).await.unwrap();

    // 10 units x 2 per unit: stock drops by 20 on supply receipt.
    let outcome = app
        .state
        .services
        .production_orders
        .transition(op.id, ProductionOrderStatus::SuppliesReceived, None)
        .await
        .unwrap();
    assert_eq!(outcome.order.status, ProductionOrderStatus::SuppliesReceived);
    assert_eq!(outcome.consumed, vec![(insumo_a, 20)]);

    let item = app
        .state
        .services
        .inventory
        .get_supply_item(insumo_a)
        .await
        .unwrap();
    assert_eq!(item.stock, 5);
}

#[tokio::test]
async fn full_flow_from_creation_to_completed_and_invoiced() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Full Flow").await;
    let product = app.seed_product("LAMP-2", dec!(50.00)).await;
    let supply = app.seed_supply_item("WIRE", 100).await;
    app.set_bom(product, &[(supply, 1)]).await;

    let created = app
        .create_sales_order(customer, &[(product, 4), (product, 6)])
        .await;
    let order_id = created.order.id;
    let sales = &app.state.services.sales_orders;

    sales.confirm(order_id, None).await.unwrap();
    sales.request_supplies(order_id, None).await.unwrap();
    assert_eq!(
        app.sales_order_status(order_id).await,
        SalesOrderStatus::SuppliesRequested
    );

    // Completing the first production order is not enough.
    app.complete_production_order(created.production_orders[0].id)
        .await;
    assert_eq!(
        app.sales_order_status(order_id).await,
        SalesOrderStatus::SuppliesRequested
    );

    // Completing the last one derives ReadyForDelivery.
    app.complete_production_order(created.production_orders[1].id)
        .await;
    assert_eq!(
        app.sales_order_status(order_id).await,
        SalesOrderStatus::ReadyForDelivery
    );

    // Each completion produced a lot sized to its order quantity.
    let lots = sales.get_lots(order_id).await.unwrap();
    assert_eq!(lots.len(), 2);
    let mut quantities: Vec<_> = lots.iter().map(|l| l.quantity).collect();
    quantities.sort();
    assert_eq!(quantities, vec![4, 6]);
    assert!(lots.iter().all(|l| !l.shipped));

    // Invoice once invoiceable; the total is snapshotted.
    let invoice = app
        .state
        .services
        .invoicing
        .issue(order_id, None)
        .await
        .unwrap();
    assert_eq!(invoice.invoice_number, "FC-0001");
    assert_eq!(invoice.total, created.order.total);

    // A second invoice for the same order is rejected.
    let duplicate = app.state.services.invoicing.issue(order_id, None).await;
    assert!(matches!(
        duplicate,
        Err(luminova_api::errors::ServiceError::Conflict(_))
    ));

    // Shipping one lot is not completion; shipping all of them is.
    sales.ship_lot(lots[0].id, None).await.unwrap();
    assert_eq!(
        app.sales_order_status(order_id).await,
        SalesOrderStatus::ReadyForDelivery
    );
    sales.ship_lot(lots[1].id, None).await.unwrap();
    assert_eq!(
        app.sales_order_status(order_id).await,
        SalesOrderStatus::Completed
    );

    // Shipping an already-shipped lot is rejected.
    let again = sales.ship_lot(lots[0].id, None).await;
    assert!(matches!(
        again,
        Err(luminova_api::errors::ServiceError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn history_records_every_step_in_order() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Audit").await;
    let product = app.seed_product("AUD-1", dec!(5.00)).await;
    let supply = app.seed_supply_item("AUD-SUP", 50).await;
    app.set_bom(product, &[(supply, 1)]).await;

    let created = app.create_sales_order(customer, &[(product, 2)]).await;
    let order_id = created.order.id;
    let sales = &app.state.services.sales_orders;

    sales.confirm(order_id, None).await.unwrap();
    sales.request_supplies(order_id, None).await.unwrap();
    app.complete_production_order(created.production_orders[0].id)
        .await;

    let history = app
        .state
        .services
        .history
        .for_sales_order(order_id)
        .await
        .unwrap();

    use luminova_api::entities::HistoryEventType::*;
    let tags: Vec<_> = history.iter().map(|h| h.event_type).collect();
    assert_eq!(
        tags,
        vec![
            Created,
            Confirmed,
            SuppliesRequested,
            ProductionUpdate, // supplies received
            ProductionUpdate, // started
            ProductionUpdate, // completed
            ReadyForDelivery,
        ]
    );
    assert!(history[0].actor.as_deref() == Some("tests"));
}
