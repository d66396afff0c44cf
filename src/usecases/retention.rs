//! Retention Sweeper - Eviction of Completed Orders
//!
//! Periodically evicts confirmed/failed orders whose last update is
//! older than the configured TTL. Only runs when a TTL is configured;
//! otherwise the store keeps every order for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use super::order_store::OrderStore;

/// Evicts terminal orders older than `ttl` every `interval`.
pub struct RetentionSweeper {
  store: Arc<OrderStore>,
  ttl: Duration,
  interval: Duration,
}

impl RetentionSweeper {
  pub fn new(store: Arc<OrderStore>, ttl: Duration, interval: Duration) -> Self {
    Self {
      store,
      ttl,
      interval,
    }
  }

  /// One eviction pass. Returns the number of evicted orders.
  pub fn sweep(&self) -> usize {
    let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
    let cutoff = Utc::now()
      .checked_sub_signed(ttl)
      .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);
    self.store.evict_terminal(cutoff)
  }

  /// Run the sweep loop until shutdown.
  #[instrument(skip(self, shutdown_rx), fields(ttl_secs = self.ttl.as_secs()))]
  pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
    info!("Retention sweeper started");
    loop {
      tokio::select! {
        biased;
        _ = shutdown_rx.recv() => {
          info!("Retention sweeper shutting down");
          return;
        }
        () = tokio::time::sleep(self.interval) => {
          let evicted = self.sweep();
          if evicted > 0 {
            info!(evicted, remaining = self.store.len(), "Completed orders evicted");
          } else {
            debug!("Retention sweep found nothing to evict");
          }
        }
      }
    }
  }
}
