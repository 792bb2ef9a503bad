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
    component_requirement, purchase_order, supply_item, PurchaseOrderStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateSupplyItemRequest {
    #[validate(length(min = 1, max = 50, message = "SKU is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(range(min = 0))]
    pub reorder_threshold: i32,
    pub unit_cost: Decimal,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateSupplyItemRequest {
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub reorder_threshold: Option<i32>,
    pub unit_cost: Option<Decimal>,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct AdjustStockRequest {
    pub delta: i32,
    #[validate(length(min = 1, message = "Adjustment reason is required"))]
    pub reason: String,
}

/// Checks and decrements supply stock for one production order,
/// all-or-nothing: if any BOM line is short, nothing is deducted.
///
/// Runs on the caller's transaction so a failure downstream rolls the
/// decrements back together with the status change.
pub async fn consume_for_production<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    order_quantity: i32,
) -> Result<Vec<(Uuid, i32)>, ServiceError> {
    let requirements = component_requirement::Entity::find()
        .filter(component_requirement::Column::ProductId.eq(product_id))
        .all(conn)
        .await?;

    // First pass: verify every line before touching anything.
    let mut planned: Vec<(supply_item::Model, i32)> = Vec::with_capacity(requirements.len());
    for requirement in &requirements {
        let item = supply_item::Entity::find_by_id(requirement.supply_item_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Supply item {} not found",
                    requirement.supply_item_id
                ))
            })?;
        let needed = requirement.quantity_per_unit * order_quantity;
        if item.stock < needed {
            return Err(ServiceError::InsufficientStock(format!(
                "supply item '{}' has {} in stock but {} are required",
                item.name, item.stock, needed
            )));
        }
        planned.push((item, needed));
    }

    // Second pass: apply the decrements.
    let mut consumed = Vec::with_capacity(planned.len());
    for (item, needed) in planned {
        let item_id = item.id;
        let new_stock = item.stock - needed;
        let mut active: supply_item::ActiveModel = item.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Some(Utc::now()));
        active.update(conn).await?;
        consumed.push((item_id, needed));
    }

    Ok(consumed)
}

/// Service for managing supply items
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_supply_item(
        &self,
        request: CreateSupplyItemRequest,
    ) -> Result<supply_item::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let now = Utc::now();
        let item = supply_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(request.sku),
            name: Set(request.name),
            stock: Set(request.stock),
            quantity_on_order: Set(0),
            reorder_threshold: Set(request.reorder_threshold),
            unit_cost: Set(request.unit_cost),
            image_path: Set(request.image_path),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await?;

        info!(supply_item_id = %item.id, "Supply item created");
        Ok(item)
    }

    #[instrument(skip(self, request))]
    pub async fn update_supply_item(
        &self,
        item_id: Uuid,
        request: UpdateSupplyItemRequest,
    ) -> Result<supply_item::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let item = self.get_supply_item(item_id).await?;
        let mut active: supply_item::ActiveModel = item.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(threshold) = request.reorder_threshold {
            active.reorder_threshold = Set(threshold);
        }
        if let Some(unit_cost) = request.unit_cost {
            active.unit_cost = Set(unit_cost);
        }
        if request.image_path.is_some() {
            active.image_path = Set(request.image_path);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_supply_item(&self, item_id: Uuid) -> Result<supply_item::Model, ServiceError> {
        let db = &*self.db;
        supply_item::Entity::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supply item {} not found", item_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_supply_items(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supply_item::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = supply_item::Entity::find()
            .order_by_asc(supply_item::Column::Sku)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Items at or below their reorder threshold.
    #[instrument(skip(self))]
    pub async fn low_stock_items(&self) -> Result<Vec<supply_item::Model>, ServiceError> {
        let db = &*self.db;
        let items = supply_item::Entity::find().all(db).await?;
        Ok(items.into_iter().filter(|i| i.is_low_stock()).collect())
    }

    /// Deletes an item unless BOM lines or open purchase orders still
    /// reference it.
    #[instrument(skip(self))]
    pub async fn delete_supply_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        self.get_supply_item(item_id).await?;

        let bom_refs = component_requirement::Entity::find()
            .filter(component_requirement::Column::SupplyItemId.eq(item_id))
            .count(db)
            .await?;
        if bom_refs > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "supply item is referenced by {} bill-of-materials line(s)",
                bom_refs
            )));
        }

        let open_pos = purchase_order::Entity::find()
            .filter(purchase_order::Column::SupplyItemId.eq(item_id))
            .filter(
                purchase_order::Column::Status.is_not_in([
                    PurchaseOrderStatus::Received,
                    PurchaseOrderStatus::Cancelled,
                ]),
            )
            .count(db)
            .await?;
        if open_pos > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "supply item is referenced by {} open purchase order(s)",
                open_pos
            )));
        }

        supply_item::Entity::delete_by_id(item_id).exec(db).await?;
        info!(supply_item_id = %item_id, "Supply item deleted");
        Ok(())
    }

    /// Manual stock correction with an audited reason.
    #[instrument(skip(self, request))]
    pub async fn adjust_stock(
        &self,
        item_id: Uuid,
        request: AdjustStockRequest,
    ) -> Result<supply_item::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let txn = db.begin().await?;

        let item = supply_item::Entity::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supply item {} not found", item_id)))?;

        let old_stock = item.stock;
        let new_stock = old_stock + request.delta;
        if new_stock < 0 {
            return Err(ServiceError::ValidationError(format!(
                "adjustment would drive stock negative ({} {:+})",
                old_stock, request.delta
            )));
        }

        let mut active: supply_item::ActiveModel = item.into();
        active.stock = Set(new_stock);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            supply_item_id = %item_id,
            old_stock,
            new_stock,
            reason = %request.reason,
            "Stock adjusted"
        );

        if let Err(e) = self
            .event_sender
            .send(Event::StockAdjusted {
                supply_item_id: item_id,
                old_stock,
                new_stock,
                reason: request.reason,
            })
            .await
        {
            warn!(error = %e, "Failed to send stock adjusted event");
        }
        self.notify_if_low(&updated).await;

        Ok(updated)
    }

    pub(crate) async fn notify_if_low(&self, item: &supply_item::Model) {
        if item.is_low_stock() {
            if let Err(e) = self
                .event_sender
                .send(Event::LowStockDetected {
                    supply_item_id: item.id,
                    stock: item.stock,
                    reorder_threshold: item.reorder_threshold,
                })
                .await
            {
                warn!(error = %e, "Failed to send low stock event");
            }
        }
    }
}
