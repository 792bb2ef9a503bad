use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_sales_order_tables::{SalesOrderLines, SalesOrders};
use super::m20250301_000003_create_production_tables::{FinishedGoodLots, ProductionOrders};
use super::m20250301_000004_create_purchase_orders_table::PurchaseOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Status filters drive most list views
        manager
            .create_index(
                Index::create()
                    .name("idx_sales_orders_status_created")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::Status)
                    .col((SalesOrders::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sales_order_lines_sales_order_id")
                    .table(SalesOrderLines::Table)
                    .col(SalesOrderLines::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_production_orders_sales_order_id")
                    .table(ProductionOrders::Table)
                    .col(ProductionOrders::SalesOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_production_orders_status")
                    .table(ProductionOrders::Table)
                    .col(ProductionOrders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_finished_good_lots_production_order_id")
                    .table(FinishedGoodLots::Table)
                    .col(FinishedGoodLots::ProductionOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_status")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_orders_supplier_id")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::SupplierId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_sales_orders_status_created",
            "idx_sales_order_lines_sales_order_id",
            "idx_production_orders_sales_order_id",
            "idx_production_orders_status",
            "idx_finished_good_lots_production_order_id",
            "idx_purchase_orders_status",
            "idx_purchase_orders_supplier_id",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}
