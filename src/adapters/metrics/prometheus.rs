//! Prometheus Metrics Registry - Engine Observability
//!
//! Registers and exposes Prometheus metrics on the metrics bind address
//! (default :9090). Covers submissions, rejections, terminal outcomes per
//! venue, queue occupancy and end-to-end execution latency.

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

/// Centralized Prometheus metrics for the engine.
///
/// All metrics follow the naming convention `dex_engine_*`.
pub struct MetricsRegistry {
    /// Prometheus registry.
    registry: Registry,
    /// Accepted submissions.
    pub orders_submitted: IntCounterVec,
    /// Submissions rejected before an order was created.
    pub submissions_rejected: IntCounterVec,
    /// Terminal outcomes by status and selected venue.
    pub order_outcomes: IntCounterVec,
    /// Orders holding a concurrency slot.
    pub orders_in_flight: IntGauge,
    /// Orders waiting for a slot.
    pub orders_pending: IntGauge,
    /// Connected status stream observers.
    pub observers: IntGauge,
    /// Admission-to-terminal latency (milliseconds).
    pub execution_latency_ms: HistogramVec,
}

impl MetricsRegistry {
    /// Create and register all Prometheus metrics.
    ///
    /// # Errors
    /// Returns error if a metric definition is invalid or registered twice.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_submitted = IntCounterVec::new(
            Opts::new("dex_engine_orders_submitted_total", "Total orders accepted"),
            &["order_type"],
        )?;

        let submissions_rejected = IntCounterVec::new(
            Opts::new(
                "dex_engine_submissions_rejected_total",
                "Total submissions rejected by validation",
            ),
            &["reason"],
        )?;

        let order_outcomes = IntCounterVec::new(
            Opts::new(
                "dex_engine_order_outcomes_total",
                "Orders reaching a terminal status",
            ),
            &["status", "venue"],
        )?;

        let orders_in_flight = IntGauge::new(
            "dex_engine_orders_in_flight",
            "Orders currently holding a concurrency slot",
        )?;

        let orders_pending = IntGauge::new(
            "dex_engine_orders_pending",
            "Orders waiting for a concurrency slot",
        )?;

        let observers = IntGauge::new(
            "dex_engine_status_observers",
            "Connected status stream observers",
        )?;

        let execution_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "dex_engine_execution_latency_ms",
                "Time from admission to terminal status in milliseconds",
            )
            .buckets(vec![
                100.0, 500.0, 1000.0, 2500.0, 3000.0, 3500.0, 5000.0, 10000.0, 30000.0,
            ]),
            &["status"],
        )?;

        // Register all metrics
        registry.register(Box::new(orders_submitted.clone()))?;
        registry.register(Box::new(submissions_rejected.clone()))?;
        registry.register(Box::new(order_outcomes.clone()))?;
        registry.register(Box::new(orders_in_flight.clone()))?;
        registry.register(Box::new(orders_pending.clone()))?;
        registry.register(Box::new(observers.clone()))?;
        registry.register(Box::new(execution_latency_ms.clone()))?;

        Ok(Self {
            registry,
            orders_submitted,
            submissions_rejected,
            order_outcomes,
            orders_in_flight,
            orders_pending,
            observers,
            execution_latency_ms,
        })
    }

    /// Current metrics in the Prometheus text exposition format.
    ///
    /// # Errors
    /// Returns error if encoding fails.
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Serve Prometheus metrics on the configured bind address.
    ///
    /// # Errors
    /// Returns error if the address cannot be bound or the server fails.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics_self = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics_self);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Failed to encode metrics");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_registered_metrics() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics.orders_submitted.with_label_values(&["market"]).inc();
        metrics
            .order_outcomes
            .with_label_values(&["confirmed", "raydium"])
            .inc();
        metrics.orders_in_flight.set(3);

        let text = metrics.render().unwrap();
        assert!(text.contains("dex_engine_orders_submitted_total{order_type=\"market\"} 1"));
        assert!(text.contains("dex_engine_order_outcomes_total{status=\"confirmed\",venue=\"raydium\"} 1"));
        assert!(text.contains("dex_engine_orders_in_flight 3"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = MetricsRegistry::new().unwrap();
        let b = MetricsRegistry::new().unwrap();
        a.orders_pending.set(5);
        assert!(b.render().unwrap().contains("dex_engine_orders_pending 0"));
    }
}
