//! Admission Queue - Bounded-concurrency Order Scheduling
//!
//! Accepts orders as `pending`, keeps a FIFO ready queue, and admits
//! orders into the execution pipeline while fewer than
//! `max_concurrent` are in flight:
//! - FIFO by submission order, no priorities
//! - An order moves to `routing` in the same critical section that
//!   gives it a slot, so no slot is ever held by a `pending` order
//! - A slot is released when the pipeline returns (confirmed or failed)
//!   and the next pending order is admitted immediately

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use super::order_store::OrderStore;
use super::pipeline::ExecutionPipeline;
use crate::domain::order::{Order, OrderId, OrderStatus, OrderTicket};

#[derive(Default)]
struct Slots {
  /// Pending order ids in submission order.
  ready: VecDeque<OrderId>,
  /// Ids currently owned by a pipeline task.
  processing: HashSet<OrderId>,
}

/// Admission-controlled front of the execution pipeline.
pub struct AdmissionQueue {
  store: Arc<OrderStore>,
  pipeline: Arc<ExecutionPipeline>,
  slots: Mutex<Slots>,
  max_concurrent: usize,
}

impl AdmissionQueue {
  /// Create a queue admitting at most `max_concurrent` orders at a time.
  ///
  /// Scheduling spawns pipeline tasks that keep a handle to the queue,
  /// hence the `Arc` return.
  pub fn new(
    store: Arc<OrderStore>,
    pipeline: Arc<ExecutionPipeline>,
    max_concurrent: usize,
  ) -> Arc<Self> {
    Arc::new(Self {
      store,
      pipeline,
      slots: Mutex::new(Slots::default()),
      max_concurrent,
    })
  }

  /// Store a new pending order and try to schedule it.
  ///
  /// Must be called from within a tokio runtime. Returns the order as
  /// stored (status `pending`).
  pub fn submit(self: &Arc<Self>, ticket: OrderTicket) -> Order {
    let order = Order::new(ticket);
    let snapshot = order.clone();
    let id = self.store.insert(order);
    self.lock().ready.push_back(id);

    debug!(order_id = %id, pair = %snapshot.pair, amount = %snapshot.amount, "Order queued");
    self.schedule_next();
    snapshot
  }

  /// Admit pending orders while capacity remains.
  ///
  /// Safe to call any number of times; a no-op at capacity or when
  /// nothing is pending.
  pub fn schedule_next(self: &Arc<Self>) {
    let admitted = {
      let mut slots = self.lock();
      let mut admitted = Vec::new();
      while slots.processing.len() < self.max_concurrent {
        let Some(id) = slots.ready.pop_front() else {
          break;
        };
        // Stale entries: evicted or no longer pending.
        if slots.processing.contains(&id) || self.store.status(&id) != Some(OrderStatus::Pending) {
          continue;
        }
        // Leave `pending` and take the slot under the same lock.
        if let Err(e) = self.pipeline.admit(id) {
          warn!(order_id = %id, error = %e, "Order could not be admitted");
          continue;
        }
        slots.processing.insert(id);
        admitted.push(id);
      }
      admitted
    };

    for id in admitted {
      self.dispatch(id);
    }
  }

  fn dispatch(self: &Arc<Self>, order_id: OrderId) {
    let queue = Arc::clone(self);
    tokio::spawn(async move {
      let outcome = queue.pipeline.process(order_id).await;
      queue.release(order_id, outcome);
      queue.schedule_next();
    });
  }

  fn release(&self, order_id: OrderId, outcome: OrderStatus) {
    let in_flight = {
      let mut slots = self.lock();
      slots.processing.remove(&order_id);
      slots.processing.len()
    };
    debug!(order_id = %order_id, outcome = %outcome, in_flight, "Slot released");
  }

  /// Orders currently holding a slot.
  pub fn in_flight(&self) -> usize {
    self.lock().processing.len()
  }

  /// Orders waiting for a slot.
  pub fn pending(&self) -> usize {
    self.lock().ready.len()
  }

  pub fn max_concurrent(&self) -> usize {
    self.max_concurrent
  }

  pub fn store(&self) -> &Arc<OrderStore> {
    &self.store
  }

  fn lock(&self) -> MutexGuard<'_, Slots> {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
