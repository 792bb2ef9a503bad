use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{component_requirement, product, production_order, sales_order_line, supply_item};
use crate::errors::ServiceError;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 50, message = "SKU is required"))]
    pub sku: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ComponentRequirementRequest {
    pub supply_item_id: Uuid,
    pub quantity_per_unit: i32,
}

/// Service for the finished-goods catalog and bills of materials
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.validate()?;

        let db = &*self.db;
        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(request.sku),
            name: Set(request.name),
            description: Set(request.description),
            unit_price: Set(request.unit_price),
            image_path: Set(request.image_path),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await?;

        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db;
        let found = self.get_product(product_id).await?;
        let mut active: product::ActiveModel = found.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if request.description.is_some() {
            active.description = Set(request.description);
        }
        if let Some(unit_price) = request.unit_price {
            active.unit_price = Set(unit_price);
        }
        if request.image_path.is_some() {
            active.image_path = Set(request.image_path);
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        let db = &*self.db;
        product::Entity::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = product::Entity::find()
            .order_by_asc(product::Column::Sku)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((products, total))
    }

    /// Deletes a product unless order lines or production orders still
    /// reference it. BOM lines are removed with it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        self.get_product(product_id).await?;

        let line_refs = sales_order_line::Entity::find()
            .filter(sales_order_line::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        if line_refs > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "product is referenced by {} sales order line(s)",
                line_refs
            )));
        }
        let op_refs = production_order::Entity::find()
            .filter(production_order::Column::ProductId.eq(product_id))
            .count(db)
            .await?;
        if op_refs > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "product is referenced by {} production order(s)",
                op_refs
            )));
        }

        let txn = db.begin().await?;
        component_requirement::Entity::delete_many()
            .filter(component_requirement::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(product_id).exec(&txn).await?;
        txn.commit().await?;

        info!(product_id = %product_id, "Product deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_components(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<component_requirement::Model>, ServiceError> {
        let db = &*self.db;
        self.get_product(product_id).await?;
        let components = component_requirement::Entity::find()
            .filter(component_requirement::Column::ProductId.eq(product_id))
            .all(db)
            .await?;
        Ok(components)
    }

    /// Replaces a product's bill of materials in one transaction.
    #[instrument(skip(self, components))]
    pub async fn set_components(
        &self,
        product_id: Uuid,
        components: Vec<ComponentRequirementRequest>,
    ) -> Result<Vec<component_requirement::Model>, ServiceError> {
        let db = &*self.db;
        self.get_product(product_id).await?;

        for component in &components {
            if component.quantity_per_unit <= 0 {
                return Err(ServiceError::ValidationError(
                    "quantity per unit must be positive".into(),
                ));
            }
        }

        let txn = db.begin().await?;
        for component in &components {
            supply_item::Entity::find_by_id(component.supply_item_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Supply item {} not found",
                        component.supply_item_id
                    ))
                })?;
        }

        component_requirement::Entity::delete_many()
            .filter(component_requirement::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;

        let mut created = Vec::with_capacity(components.len());
        for component in components {
            let row = component_requirement::ActiveModel {
                id: Set(Uuid::new_v4()),
                product_id: Set(product_id),
                supply_item_id: Set(component.supply_item_id),
                quantity_per_unit: Set(component.quantity_per_unit),
            }
            .insert(&txn)
            .await?;
            created.push(row);
        }
        txn.commit().await?;

        info!(product_id = %product_id, lines = created.len(), "Bill of materials replaced");
        Ok(created)
    }
}
