pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_catalog_tables;
mod m20250301_000002_create_sales_order_tables;
mod m20250301_000003_create_production_tables;
mod m20250301_000004_create_purchase_orders_table;
mod m20250301_000005_create_invoices_table;
mod m20250301_000006_create_history_events_table;
mod m20250301_000007_create_auth_tables;
mod m20250301_000008_add_order_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_catalog_tables::Migration),
            Box::new(m20250301_000002_create_sales_order_tables::Migration),
            Box::new(m20250301_000003_create_production_tables::Migration),
            Box::new(m20250301_000004_create_purchase_orders_table::Migration),
            Box::new(m20250301_000005_create_invoices_table::Migration),
            Box::new(m20250301_000006_create_history_events_table::Migration),
            Box::new(m20250301_000007_create_auth_tables::Migration),
            Box::new(m20250301_000008_add_order_indexes::Migration),
        ]
    }
}
