//! Customer and supplier directories.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{customer, purchase_order, sales_order, supplier};
use crate::errors::ServiceError;

#[derive(Debug, Serialize, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreatePartnerRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreatePartnerRequest,
    ) -> Result<customer::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db;
        let created = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, customer_id: Uuid) -> Result<customer::Model, ServiceError> {
        let db = &*self.db;
        customer::Entity::find_by_id(customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = customer::Entity::find()
            .order_by_asc(customer::Column::Name)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((customers, total))
    }

    /// Customers with sales orders cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, customer_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        self.get(customer_id).await?;
        let orders = sales_order::Entity::find()
            .filter(sales_order::Column::CustomerId.eq(customer_id))
            .count(db)
            .await?;
        if orders > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "customer has {} sales order(s)",
                orders
            )));
        }
        customer::Entity::delete_by_id(customer_id).exec(db).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        request: CreatePartnerRequest,
    ) -> Result<supplier::Model, ServiceError> {
        request.validate()?;
        let db = &*self.db;
        let created = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, supplier_id: Uuid) -> Result<supplier::Model, ServiceError> {
        let db = &*self.db;
        supplier::Entity::find_by_id(supplier_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let db = &*self.db;
        let paginator = supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .paginate(db, per_page);
        let total = paginator.num_items().await?;
        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((suppliers, total))
    }

    /// Suppliers with purchase orders cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        self.get(supplier_id).await?;
        let orders = purchase_order::Entity::find()
            .filter(purchase_order::Column::SupplierId.eq(supplier_id))
            .count(db)
            .await?;
        if orders > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "supplier has {} purchase order(s)",
                orders
            )));
        }
        supplier::Entity::delete_by_id(supplier_id).exec(db).await?;
        Ok(())
    }
}
