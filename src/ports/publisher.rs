//! Update Publisher Port - Order Status Fan-out Interface
//!
//! The execution pipeline reports every state change through this trait.
//! Publishing is fire-and-forget: it must never block or fail the caller.

use crate::domain::order::OrderUpdate;

/// Sink for order status snapshots.
pub trait UpdatePublisher: Send + Sync + 'static {
  /// Deliver `update` to every currently-connected observer.
  ///
  /// Returns the number of observers the update was handed to
  /// (0 when nobody is listening).
  fn publish(&self, update: OrderUpdate) -> usize;
}
