pub mod component_requirement;
pub mod customer;
pub mod finished_good_lot;
pub mod history_event;
pub mod invoice;
pub mod product;
pub mod production_order;
pub mod purchase_order;
pub mod sales_order;
pub mod sales_order_line;
pub mod supplier;
pub mod supply_item;

pub use history_event::HistoryEventType;
pub use production_order::ProductionOrderStatus;
pub use purchase_order::PurchaseOrderStatus;
pub use sales_order::SalesOrderStatus;
