use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted after a write commits. Consumers are in-process
/// only; a send failure is logged and never fails the originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockReceived {
        product_id: Uuid,
        flavor_id: Uuid,
        quantity: i32,
    },
    StockAdjusted {
        flavor_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
    },
    StockRemoved {
        product_id: Uuid,
        flavor_id: Uuid,
    },
    SaleRecorded {
        sale_id: Uuid,
        total: Decimal,
        custom_priced: bool,
    },
    BalanceChanged {
        old_balance: Decimal,
        new_balance: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating a channel failure
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping domain event: {}", e);
        }
    }
}

/// Drains the event channel, logging each event. Runs for the lifetime of
/// the server task it is spawned on.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::SaleRecorded {
                sale_id,
                total,
                custom_priced,
            } => {
                info!(sale_id = %sale_id, total = %total, custom_priced, "Sale recorded");
            }
            Event::BalanceChanged {
                old_balance,
                new_balance,
            } => {
                info!(old = %old_balance, new = %new_balance, "Cash balance changed");
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_delivers_event_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::SaleRecorded {
                sale_id: Uuid::new_v4(),
                total: dec!(25.00),
                custom_priced: false,
            })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(Event::SaleRecorded { .. })
        ));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender
            .send_or_log(Event::StockRemoved {
                product_id: Uuid::new_v4(),
                flavor_id: Uuid::new_v4(),
            })
            .await;
    }
}
