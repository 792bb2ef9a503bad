use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::entities::{ProductionOrderStatus, PurchaseOrderStatus, SalesOrderStatus};

/// Domain events emitted after committed state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Sales order events
    SalesOrderCreated(Uuid),
    SalesOrderStatusChanged {
        sales_order_id: Uuid,
        old_status: SalesOrderStatus,
        new_status: SalesOrderStatus,
    },
    SalesOrderCancelled(Uuid),
    SalesOrderCompleted(Uuid),

    // Production order events
    ProductionOrderCreated(Uuid),
    ProductionOrderStatusChanged {
        production_order_id: Uuid,
        old_status: ProductionOrderStatus,
        new_status: ProductionOrderStatus,
    },
    ProductionOrderCompleted(Uuid),
    SuppliesConsumed {
        production_order_id: Uuid,
        lines: usize,
    },

    // Purchase order events
    PurchaseOrderCreated(Uuid),
    PurchaseOrderStatusChanged {
        purchase_order_id: Uuid,
        old_status: PurchaseOrderStatus,
        new_status: PurchaseOrderStatus,
    },
    PurchaseOrderReceived {
        purchase_order_id: Uuid,
        quantity: i32,
    },

    // Inventory events
    StockAdjusted {
        supply_item_id: Uuid,
        old_stock: i32,
        new_stock: i32,
        reason: String,
    },
    LowStockDetected {
        supply_item_id: Uuid,
        stock: i32,
        reorder_threshold: i32,
    },

    // Fulfillment events
    LotShipped(Uuid),
    InvoiceIssued(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel, logging each event. Runs for the lifetime of
/// the process; exits when all senders are dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStockDetected {
                supply_item_id,
                stock,
                reorder_threshold,
            } => {
                info!(
                    supply_item_id = %supply_item_id,
                    stock,
                    reorder_threshold,
                    "Supply item fell below its reorder threshold"
                );
            }
            other => debug!(event = ?other, "Domain event"),
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::SalesOrderCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::SalesOrderCreated(received)) => assert_eq!(received, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        assert!(sender.send(Event::LotShipped(Uuid::new_v4())).await.is_err());
    }
}
