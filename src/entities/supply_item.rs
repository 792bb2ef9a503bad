use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Raw material (insumo) consumed by production orders.
///
/// `stock` and `quantity_on_order` are only mutated inside the transaction
/// of the operation that moves them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "supply_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 50, message = "SKU must be between 1 and 50 characters"))]
    pub sku: String,

    #[validate(length(min = 1, message = "Supply item name is required"))]
    pub name: String,

    pub stock: i32,
    pub quantity_on_order: i32,
    pub reorder_threshold: i32,
    pub unit_cost: Decimal,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// An item is low on stock once it reaches its reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.reorder_threshold
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::component_requirement::Entity")]
    ComponentRequirements,
    #[sea_orm(has_many = "super::purchase_order::Entity")]
    PurchaseOrders,
}

impl Related<super::component_requirement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComponentRequirements.def()
    }
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
