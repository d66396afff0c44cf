//! Broadcast Hub - Order Update Fan-out
//!
//! Implements the `UpdatePublisher` port with a single
//! `tokio::sync::broadcast` channel:
//! - `publish` never blocks; with no observers the update is dropped
//! - Each observer has its own bounded buffer; a slow observer lags
//!   and loses its oldest updates without affecting anyone else
//! - One FIFO channel, so every observer sees updates in publish order
//! - Observers only receive updates published after they subscribed

use tokio::sync::broadcast;
use tracing::trace;

use crate::domain::order::OrderUpdate;
use crate::ports::publisher::UpdatePublisher;

/// Fan-out hub for order status updates.
#[derive(Debug)]
pub struct BroadcastHub {
    tx: broadcast::Sender<OrderUpdate>,
}

impl BroadcastHub {
    /// Create a hub buffering up to `capacity` updates per observer.
    ///
    /// # Panics
    /// Panics if `capacity` is zero (rejected by config validation).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderUpdate> {
        self.tx.subscribe()
    }

    /// Number of currently connected observers.
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl UpdatePublisher for BroadcastHub {
    fn publish(&self, update: OrderUpdate) -> usize {
        let order_id = update.order_id;
        let status = update.status;
        let delivered = self.tx.send(update).unwrap_or(0);
        trace!(order_id = %order_id, status = %status, delivered, "Update broadcast");
        delivered
    }
}
