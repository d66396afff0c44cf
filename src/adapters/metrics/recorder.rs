//! Metrics Recorder - Hub Observer Feeding Prometheus
//!
//! Subscribes to the broadcast hub like any status stream observer and
//! turns the update flow into outcome counters, a latency histogram and
//! queue occupancy gauges.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::prometheus::MetricsRegistry;
use crate::adapters::broadcast::BroadcastHub;
use crate::domain::order::{OrderId, OrderStatus, OrderUpdate};
use crate::usecases::admission_queue::AdmissionQueue;

/// Venue label used when an order failed before a venue was selected.
const NO_VENUE: &str = "none";

pub struct MetricsRecorder {
    metrics: Arc<MetricsRegistry>,
    queue: Arc<AdmissionQueue>,
    hub: Arc<BroadcastHub>,
    /// Admission instant of every order currently in the pipeline.
    started: HashMap<OrderId, Instant>,
}

impl MetricsRecorder {
    pub fn new(metrics: Arc<MetricsRegistry>, queue: Arc<AdmissionQueue>, hub: Arc<BroadcastHub>) -> Self {
        Self {
            metrics,
            queue,
            hub,
            started: HashMap::new(),
        }
    }

    /// Fold one update into the metrics.
    pub fn record(&mut self, update: &OrderUpdate) {
        match update.status {
            OrderStatus::Routing => {
                self.started.insert(update.order_id, Instant::now());
            }
            status if status.is_terminal() => {
                let venue = update.selected_venue.as_deref().unwrap_or(NO_VENUE);
                self.metrics
                    .order_outcomes
                    .with_label_values(&[status.as_str(), venue])
                    .inc();
                if let Some(started) = self.started.remove(&update.order_id) {
                    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                    self.metrics
                        .execution_latency_ms
                        .with_label_values(&[status.as_str()])
                        .observe(elapsed_ms);
                }
            }
            _ => {}
        }
        self.refresh_gauges();
    }

    /// Forget orders that finished while updates were being dropped.
    ///
    /// Their latency samples are lost. Returns the number forgotten.
    pub fn prune_finished(&mut self) -> usize {
        let store = self.queue.store();
        let before = self.started.len();
        self.started
            .retain(|id, _| store.status(id).is_some_and(|status| !status.is_terminal()));
        before - self.started.len()
    }

    fn refresh_gauges(&self) {
        self.metrics
            .orders_in_flight
            .set(i64::try_from(self.queue.in_flight()).unwrap_or(i64::MAX));
        self.metrics
            .orders_pending
            .set(i64::try_from(self.queue.pending()).unwrap_or(i64::MAX));
        // The recorder's own subscription is not an observer.
        let observers = self.hub.observer_count().saturating_sub(1);
        self.metrics
            .observers
            .set(i64::try_from(observers).unwrap_or(i64::MAX));
    }

    /// Record every update until shutdown.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut updates = self.hub.subscribe();
        info!("Metrics recorder started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                update = updates.recv() => match update {
                    Ok(update) => self.record(&update),
                    Err(RecvError::Lagged(skipped)) => {
                        let pruned = self.prune_finished();
                        warn!(skipped, pruned, "Metrics recorder lagging, updates dropped");
                        self.refresh_gauges();
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        info!("Metrics recorder stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::Engine;
    use crate::config::{AppConfig, VenueConfig};
    use crate::domain::order::{Order, OrderEvent, OrderTicket, OrderType};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn ticket() -> OrderTicket {
        OrderTicket::new("SOL", "USDC", dec!(1), OrderType::Market).unwrap()
    }

    fn recorder() -> (MetricsRecorder, Arc<MetricsRegistry>) {
        let mut config = AppConfig::default();
        config.venues = vec![VenueConfig::fixed("raydium", 100.0, 0.003)];
        let engine = Engine::build(&config);
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        (
            MetricsRecorder::new(Arc::clone(&metrics), engine.queue, engine.hub),
            metrics,
        )
    }

    fn update(order_id: Uuid, status: OrderStatus, venue: Option<&str>) -> OrderUpdate {
        OrderUpdate {
            order_id,
            status,
            tx_hash: None,
            executed_price: None,
            error: None,
            selected_venue: venue.map(str::to_string),
        }
    }

    #[test]
    fn test_terminal_updates_count_outcomes() {
        let (mut recorder, metrics) = recorder();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        recorder.record(&update(a, OrderStatus::Routing, None));
        recorder.record(&update(a, OrderStatus::Building, Some("raydium")));
        recorder.record(&update(a, OrderStatus::Confirmed, Some("raydium")));
        recorder.record(&update(b, OrderStatus::Routing, None));
        recorder.record(&update(b, OrderStatus::Failed, None));

        let confirmed = metrics
            .order_outcomes
            .with_label_values(&["confirmed", "raydium"])
            .get();
        let failed = metrics.order_outcomes.with_label_values(&["failed", NO_VENUE]).get();
        assert_eq!(confirmed, 1);
        assert_eq!(failed, 1);
        assert_eq!(
            metrics
                .execution_latency_ms
                .with_label_values(&["confirmed"])
                .get_sample_count(),
            1
        );
        assert!(recorder.started.is_empty());
    }

    #[test]
    fn test_prune_forgets_finished_and_unknown_orders() {
        let (mut recorder, _metrics) = recorder();
        let store = Arc::clone(recorder.queue.store());
        let running = store.insert(Order::new(ticket()));
        let finished = store.insert(Order::new(ticket()));
        store.apply(&running, OrderEvent::Admitted).unwrap();
        store.apply(&finished, OrderEvent::Admitted).unwrap();
        store
            .apply(&finished, OrderEvent::Failed("venue down".into()))
            .unwrap();

        // Routing seen for all three; the terminal updates were dropped.
        let evicted = Uuid::new_v4();
        for id in [running, finished, evicted] {
            recorder.record(&update(id, OrderStatus::Routing, None));
        }

        assert_eq!(recorder.prune_finished(), 2);
        assert_eq!(recorder.started.len(), 1);
        assert!(recorder.started.contains_key(&running));
    }
}
