use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{purchase_order, supplier, supply_item, PurchaseOrderStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::purchase;

use super::numbering;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreatePurchaseOrderRequest {
    pub supplier_id: Uuid,
    pub supply_item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateDraftRequest {
    pub supplier_id: Option<Uuid>,
    pub supply_item_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct ReceivePurchaseOrderRequest {
    /// Units received in this delivery; omitted means the full outstanding
    /// quantity.
    pub quantity: Option<i32>,
}

/// Service for managing purchase orders
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a draft order and books its quantity onto the supply
    /// item's on-order counter in the same transaction.
    #[instrument(skip(self, request), fields(supplier_id = %request.supplier_id))]
    pub async fn create_order(
        &self,
        request: CreatePurchaseOrderRequest,
    ) -> Result<purchase_order::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let txn = db.begin().await?;

        supplier::Entity::find_by_id(request.supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", request.supplier_id))
            })?;
        let item = supply_item::Entity::find_by_id(request.supply_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply item {} not found", request.supply_item_id))
            })?;

        let now = Utc::now();
        let order_number = numbering::next_purchase_order_number(&txn).await?;
        let total = request.unit_price * Decimal::from(request.quantity);
        let order = purchase_order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.clone()),
            supplier_id: Set(request.supplier_id),
            supply_item_id: Set(request.supply_item_id),
            quantity: Set(request.quantity),
            quantity_received: Set(0),
            unit_price: Set(request.unit_price),
            total: Set(total),
            status: Set(PurchaseOrderStatus::Draft),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        adjust_on_order(&txn, item, request.quantity).await?;
        txn.commit().await?;

        info!(order_id = %order.id, order_number = %order_number, "Purchase order created");
        self.emit(Event::PurchaseOrderCreated(order.id)).await;

        Ok(order)
    }

    /// Edits a draft. Changing the quantity or the supply item reconciles
    /// the affected items' on-order counters by the delta, atomically.
    #[instrument(skip(self, request))]
    pub async fn update_draft(
        &self,
        order_id: Uuid,
        request: UpdateDraftRequest,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = purchase_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        if !purchase::is_editable(order.status) {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order {} is {} and can no longer be edited",
                order.order_number, order.status
            )));
        }

        let new_quantity = request.quantity.unwrap_or(order.quantity);
        if new_quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".into(),
            ));
        }
        let new_item_id = request.supply_item_id.unwrap_or(order.supply_item_id);
        let new_unit_price = request.unit_price.unwrap_or(order.unit_price);

        if let Some(supplier_id) = request.supplier_id {
            supplier::Entity::find_by_id(supplier_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Supplier {} not found", supplier_id))
                })?;
        }

        // Reconcile on-order counters: remove the old booking, add the new.
        let old_item = supply_item::Entity::find_by_id(order.supply_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply item {} not found", order.supply_item_id))
            })?;
        if new_item_id == order.supply_item_id {
            adjust_on_order(&txn, old_item, new_quantity - order.quantity).await?;
        } else {
            let new_item = supply_item::Entity::find_by_id(new_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Supply item {} not found", new_item_id))
                })?;
            adjust_on_order(&txn, old_item, -order.quantity).await?;
            adjust_on_order(&txn, new_item, new_quantity).await?;
        }

        let mut active: purchase_order::ActiveModel = order.into();
        if let Some(supplier_id) = request.supplier_id {
            active.supplier_id = Set(supplier_id);
        }
        active.supply_item_id = Set(new_item_id);
        active.quantity = Set(new_quantity);
        active.unit_price = Set(new_unit_price);
        active.total = Set(new_unit_price * Decimal::from(new_quantity));
        if request.notes.is_some() {
            active.notes = Set(request.notes);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id = %order_id, "Purchase order draft updated");
        Ok(updated)
    }

    /// Plain status moves along the approval/shipping path. Receipts and
    /// cancellation have their own operations.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: Uuid,
        target: PurchaseOrderStatus,
    ) -> Result<purchase_order::Model, ServiceError> {
        if matches!(
            target,
            PurchaseOrderStatus::PartiallyReceived | PurchaseOrderStatus::Received
        ) {
            return Err(ServiceError::InvalidOperation(
                "receipt statuses are set by booking a receipt".into(),
            ));
        }
        if target == PurchaseOrderStatus::Cancelled {
            return self.cancel(order_id).await;
        }

        let db = &*self.db;
        let txn = db.begin().await?;
        let order = purchase_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let old_status = order.status;
        purchase::plan_transition(old_status, target)?;

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(target);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id = %order_id, from = %old_status, to = %target, "Purchase order transitioned");
        self.emit(Event::PurchaseOrderStatusChanged {
            purchase_order_id: order_id,
            old_status,
            new_status: target,
        })
        .await;

        Ok(updated)
    }

    /// Books a delivery: moves the received units from on-order into
    /// stock and closes the order once everything has arrived.
    #[instrument(skip(self, request))]
    pub async fn receive(
        &self,
        order_id: Uuid,
        request: ReceivePurchaseOrderRequest,
    ) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = purchase_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        if !purchase::can_receive(order.status) {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order {} is {} and cannot receive goods",
                order.order_number, order.status
            )));
        }

        let outstanding = order.outstanding_quantity();
        let received_now = request.quantity.unwrap_or(outstanding);
        if received_now <= 0 {
            return Err(ServiceError::ValidationError(
                "received quantity must be positive".into(),
            ));
        }
        if received_now > outstanding {
            return Err(ServiceError::ValidationError(format!(
                "received quantity {} exceeds outstanding {}",
                received_now, outstanding
            )));
        }

        let item = supply_item::Entity::find_by_id(order.supply_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supply item {} not found", order.supply_item_id))
            })?;
        let new_stock = item.stock + received_now;
        let new_on_order = (item.quantity_on_order - received_now).max(0);
        let mut item_active: supply_item::ActiveModel = item.into();
        item_active.stock = Set(new_stock);
        item_active.quantity_on_order = Set(new_on_order);
        item_active.updated_at = Set(Some(Utc::now()));
        item_active.update(&txn).await?;

        let old_status = order.status;
        let received_total = order.quantity_received + received_now;
        let new_status = purchase::status_after_receipt(order.quantity, received_total);
        let mut active: purchase_order::ActiveModel = order.into();
        active.quantity_received = Set(received_total);
        active.status = Set(new_status);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            order_id = %order_id,
            received_now,
            received_total,
            "Purchase order receipt booked"
        );
        self.emit(Event::PurchaseOrderReceived {
            purchase_order_id: order_id,
            quantity: received_now,
        })
        .await;
        if new_status != old_status {
            self.emit(Event::PurchaseOrderStatusChanged {
                purchase_order_id: order_id,
                old_status,
                new_status,
            })
            .await;
        }

        Ok(updated)
    }

    /// Cancels an open order and releases its unreceived remainder from
    /// the supply item's on-order counter.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = purchase_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Purchase order {} not found", order_id))
            })?;

        let old_status = order.status;
        purchase::plan_transition(old_status, PurchaseOrderStatus::Cancelled)?;

        let outstanding = order.outstanding_quantity();
        if outstanding > 0 {
            let item = supply_item::Entity::find_by_id(order.supply_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Supply item {} not found",
                        order.supply_item_id
                    ))
                })?;
            adjust_on_order(&txn, item, -outstanding).await?;
        }

        let mut active: purchase_order::ActiveModel = order.into();
        active.status = Set(PurchaseOrderStatus::Cancelled);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(order_id = %order_id, "Purchase order cancelled");
        self.emit(Event::PurchaseOrderStatusChanged {
            purchase_order_id: order_id,
            old_status,
            new_status: PurchaseOrderStatus::Cancelled,
        })
        .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<purchase_order::Model, ServiceError> {
        let db = &*self.db;
        purchase_order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {} not found", order_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<PurchaseOrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut query = purchase_order::Entity::find();
        if let Some(status) = status {
            query = query.filter(purchase_order::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(purchase_order::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send domain event");
        }
    }
}

/// Applies a signed delta to a supply item's on-order counter, clamped at
/// zero.
async fn adjust_on_order<C: ConnectionTrait>(
    conn: &C,
    item: supply_item::Model,
    delta: i32,
) -> Result<(), ServiceError> {
    let new_on_order = (item.quantity_on_order + delta).max(0);
    let mut active: supply_item::ActiveModel = item.into();
    active.quantity_on_order = Set(new_on_order);
    active.updated_at = Set(Some(Utc::now()));
    active.update(conn).await?;
    Ok(())
}
