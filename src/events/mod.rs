use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Domain events emitted by the services after a successful mutation.
/// Consumers are fire-and-forget; event delivery never fails a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    CustomerCreated(i64),
    OrderOpened(i64),
    CartItemAdded {
        order_id: i64,
        product_id: i64,
        quantity: i32,
    },
    CartItemRemoved {
        order_id: i64,
        product_id: i64,
    },
    OrderCompleted(i64),
    CheckoutSessionOpened {
        order_id: i64,
        session_id: String,
    },
    ReviewCreated(i64),
    FavoriteToggled {
        user_id: i64,
        product_id: i64,
        favored: bool,
    },
    SubscriberAdded(i64),
}

/// Cloneable handle for publishing events onto the processing channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), mpsc::error::SendError<Event>> {
        self.sender.send(event).await
    }

    /// Publish an event, logging instead of propagating channel failures.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            error!("Failed to publish event: {}", e);
        }
    }
}

/// Drains the event channel. Currently events are only traced; this is
/// the seam where webhook fan-out or a broadcast mailer would hook in.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        debug!(?event, "processing event");
    }
    debug!("event channel closed, processor shutting down");
}
