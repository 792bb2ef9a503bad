use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_catalog_tables::{Suppliers, SupplyItems};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderNumber)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::SupplierId).uuid().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::SupplyItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::QuantityReceived)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::UnitPrice)
                            .decimal()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Total).decimal().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::Status)
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                    .col(
                        ColumnDef::new(PurchaseOrders::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::UpdatedAt).timestamp().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_supplier_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_supply_item_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplyItemId)
                            .to(SupplyItems::Table, SupplyItems::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PurchaseOrders {
    Table,
    Id,
    OrderNumber,
    SupplierId,
    SupplyItemId,
    Quantity,
    QuantityReceived,
    UnitPrice,
    Total,
    Status,
    Notes,
    CreatedAt,
    UpdatedAt,
}
