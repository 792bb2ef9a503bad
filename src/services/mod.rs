pub mod history;
pub mod inventory;
pub mod invoicing;
pub mod numbering;
pub mod partners;
pub mod products;
pub mod production_orders;
pub mod purchase_orders;
pub mod sales_orders;
