//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` and exposes the
//! engine to the outside world. Each sub-module groups adapters by
//! infrastructure concern.
//!
//! Adapter categories:
//! - `broadcast`: In-process fan-out of order updates (`UpdatePublisher`)
//! - `venues`: Simulated liquidity venues (`VenueClient`)
//! - `http`: Order API and WebSocket status stream via axum 0.7
//! - `metrics`: Prometheus metrics export

pub mod broadcast;
pub mod http;
pub mod metrics;
pub mod venues;
