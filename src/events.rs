use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services.
///
/// Delivery is fire-and-forget: a failed send is logged, never propagated,
/// so event plumbing cannot fail a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    CollectionCreated(Uuid),
    CollectionDeleted(Uuid),
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    ReviewCreated { product_id: Uuid, review_id: Uuid },
    PromotionCreated(Uuid),

    // Cart events
    CartCreated(Uuid),
    CartDeleted(Uuid),
    CartItemAdded { cart_id: Uuid, product_id: Uuid },
    CartItemUpdated { cart_id: Uuid, item_id: Uuid },
    CartItemRemoved { cart_id: Uuid, item_id: Uuid },

    // Order events
    OrderPlaced { order_id: Uuid, cart_id: Uuid },
    OrderPaymentStatusChanged { order_id: Uuid, new_status: String },
    OrderDeleted(Uuid),

    // Customer events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),

    // Tagging events
    TagCreated(Uuid),
    EntityTagged { tag_id: Uuid, entity_id: Uuid },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event, logging rather than propagating a delivery failure
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("event dropped: {}", e);
        }
    }
}

/// Background consumer that drains the event channel.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "processing event");
    }
    info!("event channel closed, processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_does_not_fail_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let sender = EventSender::new(tx);
        // Must not panic or error out
        sender.send_or_log(Event::CartCreated(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let cart_id = Uuid::new_v4();
        sender.send(Event::CartCreated(cart_id)).await.unwrap();

        match rx.recv().await {
            Some(Event::CartCreated(id)) => assert_eq!(id, cart_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
