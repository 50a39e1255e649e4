use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Domain events emitted by the cart and checkout subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartItemAdded {
        session_id: String,
        product_id: String,
        quantity: u32,
    },
    CartItemRemoved {
        session_id: String,
        product_id: String,
    },
    CartQuantityUpdated {
        session_id: String,
        product_id: String,
        quantity: u32,
    },
    CartCleared {
        session_id: String,
    },
    CheckoutSessionCreated {
        item_count: usize,
    },
    PaymentSucceeded {
        reference: String,
    },
    PaymentFailed {
        reference: String,
    },
}

/// Cloneable handle for publishing [`Event`]s onto the process-wide channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, surfacing channel failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery is best-effort; cart operations never fail because a
    /// subscriber went away.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event channel error: {}", e);
        }
    }
}

/// Creates a bounded event channel and its sender handle.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "Processing event");
    }
    info!("Event channel closed; event processor exiting");
}
