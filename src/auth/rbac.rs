use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::ServiceError;

use super::permissions::is_known_permission;
use super::{role, role_permission, user_role};

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

/// Role administration backed by the roles / role_permissions tables.
#[derive(Clone)]
pub struct RoleService {
    db: Arc<DatabaseConnection>,
}

impl RoleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn validate_permissions(permissions: &[String]) -> Result<(), ServiceError> {
        for permission in permissions {
            if !is_known_permission(permission) {
                return Err(ServiceError::ValidationError(format!(
                    "unknown permission '{}'",
                    permission
                )));
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>, ServiceError> {
        let db = &*self.db;
        let roles = role::Entity::find().all(db).await?;

        let mut out = Vec::with_capacity(roles.len());
        for model in roles {
            let permissions = self.permissions_for(model.id).await?;
            out.push(RoleResponse {
                id: model.id,
                name: model.name,
                description: model.description,
                permissions,
            });
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn get_role(&self, role_id: Uuid) -> Result<RoleResponse, ServiceError> {
        let db = &*self.db;
        let model = role::Entity::find_by_id(role_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", role_id)))?;
        let permissions = self.permissions_for(model.id).await?;
        Ok(RoleResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            permissions,
        })
    }

    #[instrument(skip(self))]
    pub async fn create_role(
        &self,
        name: String,
        description: Option<String>,
        permissions: Vec<String>,
    ) -> Result<RoleResponse, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "role name is required".into(),
            ));
        }
        Self::validate_permissions(&permissions)?;

        let db = &*self.db;
        let txn = db.begin().await?;
        let role_id = Uuid::new_v4();

        let model = role::ActiveModel {
            id: Set(role_id),
            name: Set(name),
            description: Set(description),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        for permission in &permissions {
            role_permission::ActiveModel {
                id: Set(Uuid::new_v4()),
                role_id: Set(role_id),
                permission: Set(permission.clone()),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(role_id = %role_id, "Role created");

        Ok(RoleResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            permissions,
        })
    }

    #[instrument(skip(self))]
    pub async fn update_role(
        &self,
        role_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<RoleResponse, ServiceError> {
        let db = &*self.db;
        let model = role::Entity::find_by_id(role_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", role_id)))?;

        let mut active: role::ActiveModel = model.into();
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "role name is required".into(),
                ));
            }
            active.name = Set(name);
        }
        if description.is_some() {
            active.description = Set(description);
        }
        let updated = active.update(db).await?;
        let permissions = self.permissions_for(role_id).await?;

        Ok(RoleResponse {
            id: updated.id,
            name: updated.name,
            description: updated.description,
            permissions,
        })
    }

    /// Deletion is blocked while any user still holds the role.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        role::Entity::find_by_id(role_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", role_id)))?;

        let assigned = user_role::Entity::find()
            .filter(user_role::Column::RoleId.eq(role_id))
            .count(db)
            .await?;
        if assigned > 0 {
            return Err(ServiceError::ProtectedReference(format!(
                "role is assigned to {} user(s)",
                assigned
            )));
        }

        let txn = db.begin().await?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        role::Entity::delete_by_id(role_id).exec(&txn).await?;
        txn.commit().await?;

        info!(role_id = %role_id, "Role deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn permissions_for(&self, role_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let db = &*self.db;
        let rows = role_permission::Entity::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|r| r.permission).collect())
    }

    /// Replaces a role's permission set in one transaction.
    #[instrument(skip(self, permissions))]
    pub async fn set_permissions(
        &self,
        role_id: Uuid,
        permissions: Vec<String>,
    ) -> Result<Vec<String>, ServiceError> {
        Self::validate_permissions(&permissions)?;

        let db = &*self.db;
        role::Entity::find_by_id(role_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", role_id)))?;

        let txn = db.begin().await?;
        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;
        for permission in &permissions {
            role_permission::ActiveModel {
                id: Set(Uuid::new_v4()),
                role_id: Set(role_id),
                permission: Set(permission.clone()),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!(role_id = %role_id, count = permissions.len(), "Role permissions replaced");
        Ok(permissions)
    }

    /// Grants a role to a user, ignoring a grant that already exists.
    #[instrument(skip(self))]
    pub async fn assign_role(&self, user_id: Uuid, role_name: &str) -> Result<(), ServiceError> {
        let db = &*self.db;
        let role = role::Entity::find()
            .filter(role::Column::Name.eq(role_name))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role '{}' not found", role_name)))?;

        let existing = user_role::Entity::find()
            .filter(user_role::Column::UserId.eq(user_id))
            .filter(user_role::Column::RoleId.eq(role.id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        user_role::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            role_id: Set(role.id),
        }
        .insert(db)
        .await?;
        Ok(())
    }
}
