//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics export on :9090 via axum 0.7, fed by a recorder
//! task observing the broadcast hub.

pub mod prometheus;
pub mod recorder;

pub use self::prometheus::MetricsRegistry;
pub use recorder::MetricsRecorder;
