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

use crate::entities::{
    finished_good_lot, history_event::HistoryEventType, product, production_order, sales_order,
    sales_order_line, ProductionOrderStatus, SalesOrderStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::sales::{self, SalesAction};

use super::history;
use super::numbering;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SalesOrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSalesOrderRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1, message = "At least one line is required"))]
    pub lines: Vec<SalesOrderLineRequest>,
    pub notes: Option<String>,
}

/// Result of creating a sales order: the order plus the production order
/// spawned for each line.
#[derive(Debug, Serialize)]
pub struct CreatedSalesOrder {
    pub order: sales_order::Model,
    pub production_orders: Vec<production_order::Model>,
}

/// Recomputes a sales order's derived status from its children inside the
/// caller's transaction. Returns the change applied, if any.
pub(crate) async fn refresh_derived_status<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<Option<(SalesOrderStatus, SalesOrderStatus)>, ServiceError> {
    let order = sales_order::Entity::find_by_id(sales_order_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Sales order {} not found", sales_order_id))
        })?;

    let children = production_order::Entity::find()
        .filter(production_order::Column::SalesOrderId.eq(sales_order_id))
        .all(conn)
        .await?;
    let statuses: Vec<ProductionOrderStatus> = children.iter().map(|c| c.status).collect();

    let Some(new_status) = sales::derive_from_children(order.status, &statuses) else {
        return Ok(None);
    };

    let old_status = order.status;
    apply_status(conn, order, new_status).await?;
    history::record(
        conn,
        sales_order_id,
        HistoryEventType::ReadyForDelivery,
        "All production orders completed; order is ready for delivery",
        None,
    )
    .await?;

    Ok(Some((old_status, new_status)))
}

/// Promotes a ready-for-delivery order to completed once every lot is
/// shipped. Same transaction-scoped contract as `refresh_derived_status`.
pub(crate) async fn refresh_completion<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<Option<(SalesOrderStatus, SalesOrderStatus)>, ServiceError> {
    let order = sales_order::Entity::find_by_id(sales_order_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Sales order {} not found", sales_order_id))
        })?;

    let lots = lots_for_order(conn, sales_order_id).await?;
    let shipped_flags: Vec<bool> = lots.iter().map(|l| l.shipped).collect();

    let Some(new_status) = sales::derive_from_lots(order.status, &shipped_flags) else {
        return Ok(None);
    };

    let old_status = order.status;
    apply_status(conn, order, new_status).await?;
    history::record(
        conn,
        sales_order_id,
        HistoryEventType::Completed,
        "Every lot shipped; order completed",
        None,
    )
    .await?;

    Ok(Some((old_status, new_status)))
}

async fn apply_status<C: ConnectionTrait>(
    conn: &C,
    order: sales_order::Model,
    new_status: SalesOrderStatus,
) -> Result<sales_order::Model, ServiceError> {
    let version = order.version;
    let mut active: sales_order::ActiveModel = order.into();
    active.status = Set(new_status);
    active.version = Set(version + 1);
    active.updated_at = Set(Some(Utc::now()));
    Ok(active.update(conn).await?)
}

async fn lots_for_order<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
) -> Result<Vec<finished_good_lot::Model>, ServiceError> {
    let children = production_order::Entity::find()
        .filter(production_order::Column::SalesOrderId.eq(sales_order_id))
        .all(conn)
        .await?;
    let child_ids: Vec<Uuid> = children.iter().map(|c| c.id).collect();
    if child_ids.is_empty() {
        return Ok(Vec::new());
    }
    let lots = finished_good_lot::Entity::find()
        .filter(finished_good_lot::Column::ProductionOrderId.is_in(child_ids))
        .all(conn)
        .await?;
    Ok(lots)
}

/// Service for managing sales orders and their lifecycle
#[derive(Clone)]
pub struct SalesOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SalesOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates a sales order with its lines and one production order per
    /// line, all in one transaction.
    #[instrument(skip(self, request), fields(customer_id = %request.customer_id))]
    pub async fn create_order(
        &self,
        request: CreateSalesOrderRequest,
        actor: Option<String>,
    ) -> Result<CreatedSalesOrder, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let txn = db.begin().await?;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let order_number = numbering::next_sales_order_number(&txn).await?;

        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "line quantity must be positive (got {})",
                    line.quantity
                )));
            }
            let item = product::Entity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;
            let subtotal = item.unit_price * Decimal::from(line.quantity);
            total += subtotal;
            lines.push((item, line.quantity, subtotal));
        }

        let order = sales_order::ActiveModel {
            id: Set(order_id),
            order_number: Set(order_number.clone()),
            customer_id: Set(request.customer_id),
            status: Set(SalesOrderStatus::Pending),
            total: Set(total),
            notes: Set(request.notes),
            version: Set(1),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        let op_number_base = numbering::production_order_number_base(&txn).await?;
        let mut production_orders = Vec::with_capacity(lines.len());
        for (index, (item, quantity, subtotal)) in lines.into_iter().enumerate() {
            let line_id = Uuid::new_v4();
            sales_order_line::ActiveModel {
                id: Set(line_id),
                sales_order_id: Set(order_id),
                product_id: Set(item.id),
                quantity: Set(quantity),
                unit_price: Set(item.unit_price),
                subtotal: Set(subtotal),
            }
            .insert(&txn)
            .await?;

            let op_number = numbering::format_number("OP", op_number_base + index as u64 + 1, 5);
            let op = production_order::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_number: Set(op_number),
                sales_order_id: Set(Some(order_id)),
                sales_order_line_id: Set(Some(line_id)),
                product_id: Set(item.id),
                quantity: Set(quantity),
                status: Set(ProductionOrderStatus::Pending),
                sector: Set(None),
                planned_start: Set(None),
                planned_end: Set(None),
                actual_start: Set(None),
                actual_end: Set(None),
                notes: Set(None),
                created_at: Set(now),
                updated_at: Set(Some(now)),
            }
            .insert(&txn)
            .await?;
            production_orders.push(op);
        }

        history::record(
            &txn,
            order_id,
            HistoryEventType::Created,
            format!(
                "Sales order {} created with {} line(s)",
                order_number,
                production_orders.len()
            ),
            actor,
        )
        .await?;

        txn.commit().await?;
        info!(order_id = %order_id, order_number = %order_number, "Sales order created");

        self.emit(Event::SalesOrderCreated(order_id)).await;
        for op in &production_orders {
            self.emit(Event::ProductionOrderCreated(op.id)).await;
        }

        Ok(CreatedSalesOrder {
            order,
            production_orders,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<sales_order::Model, ServiceError> {
        let db = &*self.db;
        sales_order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<sales_order::Model, ServiceError> {
        let db = &*self.db;
        sales_order::Entity::find()
            .filter(sales_order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Sales order {} not found", order_number))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<SalesOrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sales_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut query = sales_order::Entity::find();
        if let Some(status) = status {
            query = query.filter(sales_order::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(sales_order::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    #[instrument(skip(self))]
    pub async fn get_lines(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<sales_order_line::Model>, ServiceError> {
        let db = &*self.db;
        self.get_order(order_id).await?;
        let lines = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::SalesOrderId.eq(order_id))
            .all(db)
            .await?;
        Ok(lines)
    }

    #[instrument(skip(self))]
    pub async fn get_lots(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<finished_good_lot::Model>, ServiceError> {
        let db = &*self.db;
        self.get_order(order_id).await?;
        lots_for_order(db, order_id).await
    }

    /// Manual confirmation by the sales desk.
    #[instrument(skip(self))]
    pub async fn confirm(
        &self,
        order_id: Uuid,
        actor: Option<String>,
    ) -> Result<sales_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = sales_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))?;

        let old_status = order.status;
        let new_status = sales::plan_action(old_status, SalesAction::Confirm)?;
        let updated = apply_status(&txn, order, new_status).await?;
        history::record(
            &txn,
            order_id,
            HistoryEventType::Confirmed,
            "Order confirmed",
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(order_id = %order_id, "Sales order confirmed");
        self.emit(Event::SalesOrderStatusChanged {
            sales_order_id: order_id,
            old_status,
            new_status,
        })
        .await;

        Ok(updated)
    }

    /// Requests supplies for the whole order: the order and every pending
    /// child production order move to `SuppliesRequested` together.
    #[instrument(skip(self))]
    pub async fn request_supplies(
        &self,
        order_id: Uuid,
        actor: Option<String>,
    ) -> Result<sales_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = sales_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))?;

        let old_status = order.status;
        let new_status = sales::plan_action(old_status, SalesAction::RequestSupplies)?;
        let updated = apply_status(&txn, order, new_status).await?;

        let children = production_order::Entity::find()
            .filter(production_order::Column::SalesOrderId.eq(order_id))
            .filter(production_order::Column::Status.eq(ProductionOrderStatus::Pending))
            .all(&txn)
            .await?;
        let mut moved = Vec::with_capacity(children.len());
        for child in children {
            let child_id = child.id;
            let mut active: production_order::ActiveModel = child.into();
            active.status = Set(ProductionOrderStatus::SuppliesRequested);
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await?;
            moved.push(child_id);
        }

        history::record(
            &txn,
            order_id,
            HistoryEventType::SuppliesRequested,
            format!("Supplies requested for {} production order(s)", moved.len()),
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(order_id = %order_id, children = moved.len(), "Supplies requested");
        self.emit(Event::SalesOrderStatusChanged {
            sales_order_id: order_id,
            old_status,
            new_status,
        })
        .await;
        for child_id in moved {
            self.emit(Event::ProductionOrderStatusChanged {
                production_order_id: child_id,
                old_status: ProductionOrderStatus::Pending,
                new_status: ProductionOrderStatus::SuppliesRequested,
            })
            .await;
        }

        Ok(updated)
    }

    /// Cancels the order and cascades to every child production order that
    /// has not completed. Completed orders and their lots stay untouched.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        order_id: Uuid,
        reason: Option<String>,
        actor: Option<String>,
    ) -> Result<sales_order::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = sales_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sales order {} not found", order_id)))?;

        let old_status = order.status;
        let new_status = sales::plan_action(old_status, SalesAction::Cancel)?;
        let updated = apply_status(&txn, order, new_status).await?;

        let children = production_order::Entity::find()
            .filter(production_order::Column::SalesOrderId.eq(order_id))
            .filter(
                production_order::Column::Status.is_not_in([
                    ProductionOrderStatus::Completed,
                    ProductionOrderStatus::Cancelled,
                ]),
            )
            .all(&txn)
            .await?;
        let mut cancelled = Vec::with_capacity(children.len());
        for child in children {
            let child_id = child.id;
            let child_number = child.order_number.clone();
            let old = child.status;
            let mut active: production_order::ActiveModel = child.into();
            active.status = Set(ProductionOrderStatus::Cancelled);
            active.actual_end = Set(Some(Utc::now()));
            active.updated_at = Set(Some(Utc::now()));
            active.update(&txn).await?;

            history::record(
                &txn,
                order_id,
                HistoryEventType::ProductionUpdate,
                format!("Production order {} cancelled with the sales order", child_number),
                None,
            )
            .await?;
            cancelled.push((child_id, old));
        }

        let description = match &reason {
            Some(reason) => format!("Order cancelled: {}", reason),
            None => "Order cancelled".to_string(),
        };
        history::record(
            &txn,
            order_id,
            HistoryEventType::Cancelled,
            description,
            actor,
        )
        .await?;
        txn.commit().await?;

        info!(order_id = %order_id, cascaded = cancelled.len(), "Sales order cancelled");
        self.emit(Event::SalesOrderCancelled(order_id)).await;
        for (child_id, old) in cancelled {
            self.emit(Event::ProductionOrderStatusChanged {
                production_order_id: child_id,
                old_status: old,
                new_status: ProductionOrderStatus::Cancelled,
            })
            .await;
        }

        Ok(updated)
    }

    /// Marks one finished-good lot as shipped. Shipping the last lot
    /// completes the order.
    #[instrument(skip(self))]
    pub async fn ship_lot(
        &self,
        lot_id: Uuid,
        actor: Option<String>,
    ) -> Result<finished_good_lot::Model, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let lot = finished_good_lot::Entity::find_by_id(lot_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Lot {} not found", lot_id)))?;
        if lot.shipped {
            return Err(ServiceError::InvalidOperation(format!(
                "lot {} has already shipped",
                lot_id
            )));
        }

        let producer = production_order::Entity::find_by_id(lot.production_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Production order {} not found",
                    lot.production_order_id
                ))
            })?;

        let quantity = lot.quantity;
        let mut active: finished_good_lot::ActiveModel = lot.into();
        active.shipped = Set(true);
        active.shipped_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        let mut completion = None;
        if let Some(sales_order_id) = producer.sales_order_id {
            history::record(
                &txn,
                sales_order_id,
                HistoryEventType::Shipment,
                format!(
                    "Lot of {} unit(s) from {} shipped",
                    quantity, producer.order_number
                ),
                actor,
            )
            .await?;
            completion = refresh_completion(&txn, sales_order_id).await?;
        }
        txn.commit().await?;

        info!(lot_id = %lot_id, "Lot shipped");
        self.emit(Event::LotShipped(lot_id)).await;
        if let (Some((old_status, new_status)), Some(sales_order_id)) =
            (completion, producer.sales_order_id)
        {
            self.emit(Event::SalesOrderStatusChanged {
                sales_order_id,
                old_status,
                new_status,
            })
            .await;
            self.emit(Event::SalesOrderCompleted(sales_order_id)).await;
        }

        Ok(updated)
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send domain event");
        }
    }
}
