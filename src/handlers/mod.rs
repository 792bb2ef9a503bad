pub mod common;
pub mod inventory;
pub mod invoices;
pub mod partners;
pub mod products;
pub mod production_orders;
pub mod purchase_orders;
pub mod roles;
pub mod sales_orders;
pub mod users;

use std::sync::Arc;

use crate::auth::RoleService;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::history::HistoryService;
use crate::services::inventory::InventoryService;
use crate::services::invoicing::InvoiceService;
use crate::services::partners::{CustomerService, SupplierService};
use crate::services::products::ProductService;
use crate::services::production_orders::ProductionOrderService;
use crate::services::purchase_orders::PurchaseOrderService;
use crate::services::sales_orders::SalesOrderService;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub sales_orders: Arc<SalesOrderService>,
    pub production_orders: Arc<ProductionOrderService>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub inventory: Arc<InventoryService>,
    pub invoicing: Arc<InvoiceService>,
    pub history: Arc<HistoryService>,
    pub products: Arc<ProductService>,
    pub customers: Arc<CustomerService>,
    pub suppliers: Arc<SupplierService>,
    pub roles: Arc<RoleService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            sales_orders: Arc::new(SalesOrderService::new(db.clone(), event_sender.clone())),
            production_orders: Arc::new(ProductionOrderService::new(
                db.clone(),
                event_sender.clone(),
            )),
            purchase_orders: Arc::new(PurchaseOrderService::new(db.clone(), event_sender.clone())),
            inventory: Arc::new(InventoryService::new(db.clone(), event_sender.clone())),
            invoicing: Arc::new(InvoiceService::new(db.clone(), event_sender)),
            history: Arc::new(HistoryService::new(db.clone())),
            products: Arc::new(ProductService::new(db.clone())),
            customers: Arc::new(CustomerService::new(db.clone())),
            suppliers: Arc::new(SupplierService::new(db.clone())),
            roles: Arc::new(RoleService::new(db)),
        }
    }
}
