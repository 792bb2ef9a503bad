//! Cancellation semantics: cancelling a sales order cascades to its
//! unfinished production orders and leaves completed work untouched.

mod common;

use common::TestApp;
use luminova_api::entities::{ProductionOrderStatus, SalesOrderStatus};
use luminova_api::errors::ServiceError;
use rust_decimal_macros::dec;

#[tokio::test]
async fn cancel_cascades_to_unfinished_children_only() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Cascade").await;
    let product = app.seed_product("CASC-1", dec!(10.00)).await;
    let supply = app.seed_supply_item("CASC-SUP", 100).await;
    app.set_bom(product, &[(supply, 1)]).await;

    let created = app
        .create_sales_order(customer, &[(product, 2), (product, 3), (product, 4)])
        .await;
    let order_id = created.order.id;
    let sales = &app.state.services.sales_orders;
    sales.confirm(order_id, None).await.unwrap();
    sales.request_supplies(order_id, None).await.unwrap();

    // Finish the first production order; leave the others mid-flight.
    app.complete_production_order(created.production_orders[0].id)
        .await;
    app.state
        .services
        .production_orders
        .transition(
            created.production_orders[1].id,
            ProductionOrderStatus::SuppliesReceived,
            None,
        )
        .await
        .unwrap();

    let cancelled = sales.cancel(order_id, Some("customer backed out".into()), None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, SalesOrderStatus::Cancelled);

    let production = &app.state.services.production_orders;
    let completed = production
        .get_order(created.production_orders[0].id)
        .await
        .unwrap();
    let in_flight = production
        .get_order(created.production_orders[1].id)
        .await
        .unwrap();
    let untouched = production
        .get_order(created.production_orders[2].id)
        .await
        .unwrap();

    // Completed stays completed, everything else cancels.
    assert_eq!(completed.status, ProductionOrderStatus::Completed);
    assert_eq!(in_flight.status, ProductionOrderStatus::Cancelled);
    assert_eq!(untouched.status, ProductionOrderStatus::Cancelled);

    // The completed order's lot survives the cancellation.
    let lots = production
        .get_lots(created.production_orders[0].id)
        .await
        .unwrap();
    assert_eq!(lots.len(), 1);

    // Stock already consumed by the cancelled in-flight order stays
    // consumed: 2 + 3 units drawn, 4 never started.
    let item = app
        .state
        .services
        .inventory
        .get_supply_item(supply)
        .await
        .unwrap();
    assert_eq!(item.stock, 95);
}

#[tokio::test]
async fn cancelled_orders_reject_further_actions() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("Settled").await;
    let product = app.seed_product("SETT-1", dec!(10.00)).await;

    let created = app.create_sales_order(customer, &[(product, 1)]).await;
    let order_id = created.order.id;
    let sales = &app.state.services.sales_orders;
    sales.cancel(order_id, None, None).await.unwrap();

    assert!(matches!(
        sales.confirm(order_id, None).await,
        Err(ServiceError::ValidationError(_))
    ));
    assert!(matches!(
        sales.cancel(order_id, None, None).await,
        Err(ServiceError::ValidationError(_))
    ));

    // Cancellation leaves the trail in place: created + cascade + cancel.
    let history = app
        .state
        .services
        .history
        .for_sales_order(order_id)
        .await
        .unwrap();
    assert!(history.len() >= 2);
}

#[tokio::test]
async fn cancelling_all_children_does_not_make_the_order_deliverable() {
    let app = TestApp::new().await;
    let customer = app.seed_customer("All cancelled").await;
    let product = app.seed_product("ALLC-1", dec!(10.00)).await;

    let created = app.create_sales_order(customer, &[(product, 1)]).await;
    let order_id = created.order.id;
    let sales = &app.state.services.sales_orders;
    sales.confirm(order_id, None).await.unwrap();
    sales.request_supplies(order_id, None).await.unwrap();

    // Cancel the only production order directly.
    app.state
        .services
        .production_orders
        .cancel(created.production_orders[0].id, None)
        .await
        .unwrap();

    // With no active children left there is nothing to deliver, so the
    // order must not be promoted.
    assert_eq!(
        app.sales_order_status(order_id).await,
        SalesOrderStatus::SuppliesRequested
    );
}
