use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::entities::{
    component_requirement, finished_good_lot, history_event::HistoryEventType, production_order,
    supply_item, ProductionOrderStatus, SalesOrderStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::lifecycle::production;

use super::history;
use super::inventory;
use super::sales_orders;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateProductionOrderRequest {
    pub sector: Option<String>,
    pub planned_start: Option<NaiveDate>,
    pub planned_end: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Outcome of a transition, for handlers that want to report side effects.
#[derive(Debug, Serialize)]
pub struct TransitionOutcome {
    pub order: production_order::Model,
    pub consumed: Vec<(Uuid, i32)>,
    pub lot: Option<finished_good_lot::Model>,
}

/// Service driving the production-order state machine
#[derive(Clone)]
pub struct ProductionOrderService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ProductionOrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn get_order(
        &self,
        order_id: Uuid,
    ) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        production_order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })
    }

    #[instrument(skip(self))]
    pub async fn get_order_by_number(
        &self,
        order_number: &str,
    ) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        production_order::Entity::find()
            .filter(production_order::Column::OrderNumber.eq(order_number))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_number))
            })
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<ProductionOrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<production_order::Model>, u64), ServiceError> {
        let db = &*self.db;
        let mut query = production_order::Entity::find();
        if let Some(status) = status {
            query = query.filter(production_order::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_desc(production_order::Column::CreatedAt)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((orders, total))
    }

    #[instrument(skip(self))]
    pub async fn get_lots(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<finished_good_lot::Model>, ServiceError> {
        let db = &*self.db;
        self.get_order(order_id).await?;
        let lots = finished_good_lot::Entity::find()
            .filter(finished_good_lot::Column::ProductionOrderId.eq(order_id))
            .all(db)
            .await?;
        Ok(lots)
    }

    /// Updates sector, schedule and notes. Rejected once the order has
    /// reached a terminal status.
    #[instrument(skip(self, request))]
    pub async fn update_details(
        &self,
        order_id: Uuid,
        request: UpdateProductionOrderRequest,
    ) -> Result<production_order::Model, ServiceError> {
        let db = &*self.db;
        let order = self.get_order(order_id).await?;

        if !production::is_editable(order.status) {
            return Err(ServiceError::InvalidOperation(format!(
                "production order {} is {} and can no longer be edited",
                order.order_number, order.status
            )));
        }

        let mut active: production_order::ActiveModel = order.into();
        if let Some(sector) = request.sector {
            active.sector = Set(Some(sector));
        }
        if let Some(start) = request.planned_start {
            active.planned_start = Set(Some(start));
        }
        if let Some(end) = request.planned_end {
            active.planned_end = Set(Some(end));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;
        Ok(updated)
    }

    /// Applies one state-machine transition with all its effects: supply
    /// consumption, lot creation, history, and the parent order's derived
    /// status, atomically.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: Uuid,
        target: ProductionOrderStatus,
        actor: Option<String>,
    ) -> Result<TransitionOutcome, ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await?;

        let order = production_order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Production order {} not found", order_id))
            })?;

        let old_status = order.status;
        let plan = production::plan_transition(old_status, target)?;

        let mut consumed = Vec::new();
        if plan.consumes_supplies {
            consumed =
                inventory::consume_for_production(&txn, order.product_id, order.quantity).await?;
        }

        if plan.creates_lot {
            let bom_lines = component_requirement::Entity::find()
                .filter(component_requirement::Column::ProductId.eq(order.product_id))
                .count(&txn)
                .await?;
            if bom_lines == 0 {
                return Err(ServiceError::ValidationError(format!(
                    "production order {} cannot complete: its product has no bill of materials",
                    order.order_number
                )));
            }
        }

        let order_number = order.order_number.clone();
        let sales_order_id = order.sales_order_id;
        let product_id = order.product_id;
        let quantity = order.quantity;
        let had_actual_start = order.actual_start.is_some();

        let now = Utc::now();
        let mut active: production_order::ActiveModel = order.into();
        active.status = Set(plan.target);
        if plan.stamps_actual_start && !had_actual_start {
            active.actual_start = Set(Some(now));
        }
        if plan.stamps_actual_end {
            active.actual_end = Set(Some(now));
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        let mut lot = None;
        if plan.creates_lot {
            let created = finished_good_lot::ActiveModel {
                id: Set(Uuid::new_v4()),
                production_order_id: Set(order_id),
                product_id: Set(product_id),
                quantity: Set(quantity),
                shipped: Set(false),
                shipped_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            lot = Some(created);
        }

        let mut derived = None;
        if let Some(parent_id) = sales_order_id {
            history::record(
                &txn,
                parent_id,
                HistoryEventType::ProductionUpdate,
                format!(
                    "Production order {} moved from {} to {}",
                    order_number, old_status, plan.target
                ),
                actor,
            )
            .await?;
            derived = sales_orders::refresh_derived_status(&txn, parent_id).await?;
        }

        txn.commit().await?;
        info!(
            order_id = %order_id,
            from = %old_status,
            to = %plan.target,
            "Production order transitioned"
        );

        self.emit(Event::ProductionOrderStatusChanged {
            production_order_id: order_id,
            old_status,
            new_status: plan.target,
        })
        .await;
        if !consumed.is_empty() {
            self.emit(Event::SuppliesConsumed {
                production_order_id: order_id,
                lines: consumed.len(),
            })
            .await;
            self.notify_low_stock(&consumed).await;
        }
        if plan.target == ProductionOrderStatus::Completed {
            self.emit(Event::ProductionOrderCompleted(order_id)).await;
        }
        if let (Some(parent_id), Some((old, new))) = (sales_order_id, derived) {
            self.emit(Event::SalesOrderStatusChanged {
                sales_order_id: parent_id,
                old_status: old,
                new_status: new,
            })
            .await;
            if new == SalesOrderStatus::ReadyForDelivery {
                info!(sales_order_id = %parent_id, "Sales order ready for delivery");
            }
        }

        Ok(TransitionOutcome {
            order: updated,
            consumed,
            lot,
        })
    }

    /// Cancels the order; terminal orders reject this like any other
    /// transition.
    #[instrument(skip(self))]
    pub async fn cancel(
        &self,
        order_id: Uuid,
        actor: Option<String>,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.transition(order_id, ProductionOrderStatus::Cancelled, actor)
            .await
    }

    async fn notify_low_stock(&self, consumed: &[(Uuid, i32)]) {
        let db = &*self.db;
        for (item_id, _) in consumed {
            match supply_item::Entity::find_by_id(*item_id).one(db).await {
                Ok(Some(item)) if item.is_low_stock() => {
                    self.emit(Event::LowStockDetected {
                        supply_item_id: item.id,
                        stock: item.stock,
                        reorder_threshold: item.reorder_threshold,
                    })
                    .await;
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to check stock level after consumption"),
            }
        }
    }

    async fn emit(&self, event: Event) {
        if let Err(e) = self.event_sender.send(event).await {
            warn!(error = %e, "Failed to send domain event");
        }
    }
}
