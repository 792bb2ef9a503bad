use sea_orm_migration::prelude::*;

use super::m20250301_000002_create_sales_order_tables::SalesOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HistoryEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HistoryEvents::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HistoryEvents::SalesOrderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HistoryEvents::EventType).string().not_null())
                    .col(
                        ColumnDef::new(HistoryEvents::Description)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(HistoryEvents::Actor).string().null())
                    .col(
                        ColumnDef::new(HistoryEvents::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_history_events_sales_order_id")
                            .from(HistoryEvents::Table, HistoryEvents::SalesOrderId)
                            .to(SalesOrders::Table, SalesOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_history_events_sales_order_created")
                    .table(HistoryEvents::Table)
                    .col(HistoryEvents::SalesOrderId)
                    .col(HistoryEvents::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HistoryEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum HistoryEvents {
    Table,
    Id,
    SalesOrderId,
    EventType,
    Description,
    Actor,
    CreatedAt,
}
