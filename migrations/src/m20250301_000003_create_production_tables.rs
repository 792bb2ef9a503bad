use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_catalog_tables::{Products, SupplyItems};
use super::m20250301_000002_create_sales_order_tables::{SalesOrderLines, SalesOrders};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComponentRequirements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComponentRequirements::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComponentRequirements::ProductId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComponentRequirements::SupplyItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ComponentRequirements::QuantityPerUnit)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_component_requirements_product_id")
                            .from(
                                ComponentRequirements::Table,
                                ComponentRequirements::ProductId,
                            )
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_component_requirements_supply_item_id")
                            .from(
                                ComponentRequirements::Table,
                                ComponentRequirements::SupplyItemId,
                            )
                            .to(SupplyItems::Table, SupplyItems::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_component_requirements_product_supply")
                    .table(ComponentRequirements::Table)
                    .col(ComponentRequirements::ProductId)
                    .col(ComponentRequirements::SupplyItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductionOrders::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProductionOrders::SalesOrderId).uuid().null())
                    .col(
                        ColumnDef::new(ProductionOrders::SalesOrderLineId)
                            .uuid()
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProductionOrders::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductionOrders::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ProductionOrders::Sector).string().null())
                    .col(ColumnDef::new(ProductionOrders::PlannedStart).date().null())
                    .col(ColumnDef::new(ProductionOrders::PlannedEnd).date().null())
                    .col(
                        ColumnDef::new(ProductionOrders::ActualStart)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::ActualEnd)
                            .timestamp()
                            .null(),
                    )
                    .col(ColumnDef::new(ProductionOrders::Notes).text().null())
                    .col(
                        ColumnDef::new(ProductionOrders::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProductionOrders::UpdatedAt)
                            .timestamp()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_orders_sales_order_id")
                            .from(ProductionOrders::Table, ProductionOrders::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_orders_sales_order_line_id")
                            .from(ProductionOrders::Table, ProductionOrders::SalesOrderLineId)
                            .to(SalesOrderLines::Table, SalesOrderLines::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_production_orders_product_id")
                            .from(ProductionOrders::Table, ProductionOrders::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FinishedGoodLots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FinishedGoodLots::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinishedGoodLots::ProductionOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinishedGoodLots::ProductId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinishedGoodLots::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FinishedGoodLots::Shipped)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FinishedGoodLots::ShippedAt).timestamp().null())
                    .col(
                        ColumnDef::new(FinishedGoodLots::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_finished_good_lots_production_order_id")
                            .from(FinishedGoodLots::Table, FinishedGoodLots::ProductionOrderId)
                            .to(ProductionOrders::Table, ProductionOrders::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FinishedGoodLots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComponentRequirements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ComponentRequirements {
    Table,
    Id,
    ProductId,
    SupplyItemId,
    QuantityPerUnit,
}

#[derive(DeriveIden)]
pub enum ProductionOrders {
    Table,
    Id,
    OrderNumber,
    SalesOrderId,
    SalesOrderLineId,
    ProductId,
    Quantity,
    Status,
    Sector,
    PlannedStart,
    PlannedEnd,
    ActualStart,
    ActualEnd,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub enum FinishedGoodLots {
    Table,
    Id,
    ProductionOrderId,
    ProductId,
    Quantity,
    Shipped,
    ShippedAt,
    CreatedAt,
}
