use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::history_event::{self, HistoryEventType};
use crate::errors::ServiceError;

/// Appends one history entry to a sales order's trail. Runs on whatever
/// connection the caller holds so the entry commits (or rolls back) with
/// the transition it describes.
pub async fn record<C: ConnectionTrait>(
    conn: &C,
    sales_order_id: Uuid,
    event_type: HistoryEventType,
    description: impl Into<String>,
    actor: Option<String>,
) -> Result<(), ServiceError> {
    history_event::ActiveModel {
        id: Set(Uuid::new_v4()),
        sales_order_id: Set(sales_order_id),
        event_type: Set(event_type),
        description: Set(description.into()),
        actor: Set(actor),
        created_at: Set(Utc::now()),
    }
    .insert(conn)
    .await?;
    Ok(())
}

/// Read access to the audit trail.
#[derive(Clone)]
pub struct HistoryService {
    db: Arc<DatabaseConnection>,
}

impl HistoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn for_sales_order(
        &self,
        sales_order_id: Uuid,
    ) -> Result<Vec<history_event::Model>, ServiceError> {
        let db = &*self.db;
        let events = history_event::Entity::find()
            .filter(history_event::Column::SalesOrderId.eq(sales_order_id))
            .order_by_asc(history_event::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(events)
    }
}
