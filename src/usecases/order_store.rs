//! Order Store - In-memory Order Registry
//!
//! Owns every order accepted by the engine, keyed by id, and remembers
//! arrival order. Shared (`Arc`) between the admission queue, which
//! inserts, and the execution pipeline, which is the only writer of
//! execution state through [`OrderStore::apply`].
//!
//! Orders are kept until explicitly evicted; see
//! [`OrderStore::evict_terminal`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use super::error::ExecutionError;
use crate::domain::order::{Order, OrderEvent, OrderId, OrderStatus};

struct StoredOrder {
  /// Arrival sequence number.
  seq: u64,
  order: Order,
}

#[derive(Default)]
struct StoreInner {
  orders: HashMap<OrderId, StoredOrder>,
  next_seq: u64,
}

/// Thread-safe order registry.
///
/// The lock is never held across an `.await`; callers get cloned
/// snapshots.
#[derive(Default)]
pub struct OrderStore {
  inner: RwLock<StoreInner>,
}

impl OrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a newly submitted order. Returns its id.
  pub fn insert(&self, order: Order) -> OrderId {
    let id = order.id;
    let mut inner = self.write();
    let seq = inner.next_seq;
    inner.next_seq += 1;
    inner.orders.insert(id, StoredOrder { seq, order });
    id
  }

  /// Snapshot of a single order.
  pub fn get(&self, id: &OrderId) -> Option<Order> {
    self.read().orders.get(id).map(|s| s.order.clone())
  }

  pub fn status(&self, id: &OrderId) -> Option<OrderStatus> {
    self.read().orders.get(id).map(|s| s.order.status())
  }

  /// Apply a state machine event and return the resulting snapshot.
  ///
  /// # Errors
  /// `UnknownOrder` if the id is not stored, `Transition` if the event is
  /// illegal for the order's current status (the order is unchanged).
  pub fn apply(&self, id: &OrderId, event: OrderEvent) -> Result<Order, ExecutionError> {
    let mut inner = self.write();
    let stored = inner
      .orders
      .get_mut(id)
      .ok_or(ExecutionError::UnknownOrder(*id))?;
    stored.order.apply(event)?;
    Ok(stored.order.clone())
  }

  /// All orders in arrival order.
  pub fn list(&self) -> Vec<Order> {
    let inner = self.read();
    let mut stored: Vec<&StoredOrder> = inner.orders.values().collect();
    stored.sort_by_key(|s| s.seq);
    stored.into_iter().map(|s| s.order.clone()).collect()
  }

  /// Number of orders whose status satisfies `pred`.
  pub fn count_where(&self, pred: impl Fn(OrderStatus) -> bool) -> usize {
    self
      .read()
      .orders
      .values()
      .filter(|s| pred(s.order.status()))
      .count()
  }

  /// Orders currently in routing, building or submitted.
  pub fn active_count(&self) -> usize {
    self.count_where(OrderStatus::is_active)
  }

  pub fn len(&self) -> usize {
    self.read().orders.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Remove terminal orders last updated before `cutoff`.
  ///
  /// Returns the number of evicted orders. Non-terminal orders are
  /// never evicted.
  pub fn evict_terminal(&self, cutoff: DateTime<Utc>) -> usize {
    let mut inner = self.write();
    let before = inner.orders.len();
    inner
      .orders
      .retain(|_, s| !(s.order.status().is_terminal() && s.order.updated_at() < cutoff));
    before - inner.orders.len()
  }

  fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
    self.inner.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
    self.inner.write().unwrap_or_else(PoisonError::into_inner)
  }
}
