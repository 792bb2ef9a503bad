use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    customer, history_event::HistoryEventType, invoice, product, sales_order, sales_order_line,
    SalesOrderStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

use super::history;
use super::numbering;

/// Service for issuing and rendering invoices
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InvoiceService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Issues the invoice for a sales order that has reached an
    /// invoiceable state, snapshotting the order total.
    #[instrument(skip(self))]
    pub async fn issue(
        &self,
        sales_order_id: Uuid,
        actor: Option<String>,
    ) -> Result<invoice::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = sales_order::Entity::find_by_id(sales_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Sales order {} not found", sales_order_id))
            })?;

        if !matches!(
            order.status,
            SalesOrderStatus::ReadyForDelivery | SalesOrderStatus::Completed
        ) {
            return Err(ServiceError::InvalidOperation(format!(
                "sales order {} is {} and cannot be invoiced yet",
                order.order_number, order.status
            )));
        }

        let existing = invoice::Entity::find()
            .filter(invoice::Column::SalesOrderId.eq(sales_order_id))
            .one(&txn)
            .await?;
        if let Some(existing) = existing {
            return Err(ServiceError::Conflict(format!(
                "sales order {} already has invoice {}",
                order.order_number, existing.invoice_number
            )));
        }

        let invoice_number = numbering::next_invoice_number(&txn).await?;
        let issued = invoice::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_number: Set(invoice_number.clone()),
            sales_order_id: Set(sales_order_id),
            total: Set(order.total),
            issued_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        history::record(
            &txn,
            sales_order_id,
            HistoryEventType::InvoiceIssued,
            format!("Invoice {} issued for {}", invoice_number, order.total),
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(invoice_id = %issued.id, invoice_number = %invoice_number, "Invoice issued");
        if let Err(e) = self.event_sender.send(Event::InvoiceIssued(issued.id)).await {
            warn!(error = %e, "Failed to send invoice issued event");
        }

        Ok(issued)
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(&self, invoice_id: Uuid) -> Result<invoice::Model, ServiceError> {
        let db = &*self.db;
        invoice::Entity::find_by_id(invoice_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))
    }

    #[instrument(skip(self))]
    pub async fn for_sales_order(
        &self,
        sales_order_id: Uuid,
    ) -> Result<Option<invoice::Model>, ServiceError> {
        let db = &*self.db;
        let found = invoice::Entity::find()
            .filter(invoice::Column::SalesOrderId.eq(sales_order_id))
            .one(db)
            .await?;
        Ok(found)
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<invoice::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = invoice::Entity::find()
            .order_by_desc(invoice::Column::IssuedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let invoices = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((invoices, total))
    }

    /// Renders the downloadable plain-text invoice document.
    #[instrument(skip(self))]
    pub async fn render_document(&self, invoice_id: Uuid) -> Result<String, ServiceError> {
        let db = &*self.db;
        let issued = self.get_invoice(invoice_id).await?;
        let order = sales_order::Entity::find_by_id(issued.sales_order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Sales order {} not found", issued.sales_order_id))
            })?;
        let buyer = customer::Entity::find_by_id(order.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", order.customer_id))
            })?;
        let lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order.id))
            .all(db)
            .await?;

        let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<Uuid, product::Model> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut doc = String::new();
        doc.push_str(&format!("INVOICE {}\n", issued.invoice_number));
        doc.push_str(&format!(
            "Issued: {}\n",
            issued.issued_at.format("%Y-%m-%d %H:%M UTC")
        ));
        doc.push_str(&format!("Sales order: {}\n", order.order_number));
        doc.push_str(&format!("Customer: {}\n", buyer.name));
        doc.push('\n');
        doc.push_str(&format!(
            "{:<30} {:>8} {:>12} {:>12}\n",
            "Item", "Qty", "Unit price", "Subtotal"
        ));
        for line in &lines {
            let name = products
                .get(&line.product_id)
                .map(|p| p.name.as_str())
                .unwrap_or("(unknown product)");
            doc.push_str(&format!(
                "{:<30} {:>8} {:>12} {:>12}\n",
                name, line.quantity, line.unit_price, line.subtotal
            ));
        }
        doc.push('\n');
        doc.push_str(&format!("TOTAL: {}\n", issued.total));

        Ok(doc)
    }
}
