//! Configuration Module - TOML-based Engine Configuration
//!
//! Loads and validates configuration from `config.toml`.
//! Every section has defaults, so an empty file (or no file at all)
//! yields a runnable engine with two simulated venues.
//! Venue parameters, concurrency ceiling and stage deadlines are
//! externalized here - nothing is hardcoded in the usecases layer.

pub mod loader;

use std::time::Duration;

use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  /// Service identity and HTTP bind address.
  pub engine: EngineConfig,
  /// Admission queue parameters.
  pub queue: QueueConfig,
  /// Execution pipeline timings and deadlines.
  pub pipeline: PipelineConfig,
  /// Status broadcast parameters.
  pub broadcast: BroadcastConfig,
  /// Liquidity venues, in quote request order.
  pub venues: Vec<VenueConfig>,
  /// Metrics and monitoring.
  pub metrics: MetricsConfig,
  /// Completed order retention.
  pub retention: RetentionConfig,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      engine: EngineConfig::default(),
      queue: QueueConfig::default(),
      pipeline: PipelineConfig::default(),
      broadcast: BroadcastConfig::default(),
      venues: default_venues(),
      metrics: MetricsConfig::default(),
      retention: RetentionConfig::default(),
    }
  }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Human-readable service name.
  pub name: String,
  /// Log level (trace, debug, info, warn, error).
  pub log_level: String,
  /// Order API / status stream bind address.
  pub bind_address: String,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      name: "dex-order-engine".to_string(),
      log_level: default_log_level(),
      bind_address: "0.0.0.0:3000".to_string(),
    }
  }
}

/// Admission queue configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
  /// Maximum number of orders processed simultaneously.
  pub max_concurrent: usize,
}

impl Default for QueueConfig {
  fn default() -> Self {
    Self { max_concurrent: 10 }
  }
}

/// What the quote aggregator does when a single venue fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueFailurePolicy {
  /// Any venue failure fails the whole aggregation (and the order).
  #[default]
  Strict,
  /// Failed venues are excluded; fails only when no venue quoted.
  BestEffort,
}

/// Execution pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Simulated transaction build time (milliseconds).
  pub build_delay_ms: u64,
  /// Deadline for each venue quote request (milliseconds).
  pub quote_timeout_ms: u64,
  /// Deadline for the venue execute call (milliseconds).
  pub execute_timeout_ms: u64,
  /// Venue failure handling during quote aggregation.
  pub venue_failure_policy: VenueFailurePolicy,
}

impl PipelineConfig {
  pub fn build_delay(&self) -> Duration {
    Duration::from_millis(self.build_delay_ms)
  }

  pub fn quote_timeout(&self) -> Duration {
    Duration::from_millis(self.quote_timeout_ms)
  }

  pub fn execute_timeout(&self) -> Duration {
    Duration::from_millis(self.execute_timeout_ms)
  }
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self {
      build_delay_ms: 500,
      quote_timeout_ms: 5_000,
      execute_timeout_ms: 30_000,
      venue_failure_policy: VenueFailurePolicy::Strict,
    }
  }
}

/// Status broadcast configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
  /// Per-observer buffer; slower observers drop the oldest updates.
  pub capacity: usize,
}

impl Default for BroadcastConfig {
  fn default() -> Self {
    Self { capacity: 1024 }
  }
}

/// Simulated venue configuration.
///
/// Quoted price = `(price_floor + U(0,1) * price_spread) * U(multiplier_min, multiplier_max)`
/// unless `fixed_price` is set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VenueConfig {
  /// Venue identifier.
  pub id: String,
  /// Fee fraction reported with every quote.
  pub fee: f64,
  /// Lower bound of the base price.
  #[serde(default = "default_price_floor")]
  pub price_floor: f64,
  /// Width of the uniform base price range.
  #[serde(default = "default_price_spread")]
  pub price_spread: f64,
  /// Lower bound of the venue-specific price multiplier.
  #[serde(default = "default_multiplier_min")]
  pub multiplier_min: f64,
  /// Upper bound of the venue-specific price multiplier.
  #[serde(default = "default_multiplier_max")]
  pub multiplier_max: f64,
  /// Quote latency (milliseconds).
  #[serde(default = "default_quote_latency")]
  pub quote_latency_ms: u64,
  /// Minimum swap execution latency (milliseconds).
  #[serde(default = "default_execute_latency_min")]
  pub execute_latency_min_ms: u64,
  /// Maximum swap execution latency (milliseconds).
  #[serde(default = "default_execute_latency_max")]
  pub execute_latency_max_ms: u64,
  /// Probability in [0, 1] that a swap execution is rejected.
  #[serde(default)]
  pub failure_rate: f64,
  /// Deterministic quote price, overriding the random model.
  #[serde(default)]
  pub fixed_price: Option<f64>,
}

impl VenueConfig {
  /// Venue with default price model and latencies.
  pub fn new(id: impl Into<String>, fee: f64) -> Self {
    Self {
      id: id.into(),
      fee,
      price_floor: default_price_floor(),
      price_spread: default_price_spread(),
      multiplier_min: default_multiplier_min(),
      multiplier_max: default_multiplier_max(),
      quote_latency_ms: default_quote_latency(),
      execute_latency_min_ms: default_execute_latency_min(),
      execute_latency_max_ms: default_execute_latency_max(),
      failure_rate: 0.0,
      fixed_price: None,
    }
  }

  /// Instant venue always quoting `price`.
  pub fn fixed(id: impl Into<String>, price: f64, fee: f64) -> Self {
    Self {
      quote_latency_ms: 0,
      execute_latency_min_ms: 0,
      execute_latency_max_ms: 0,
      fixed_price: Some(price),
      ..Self::new(id, fee)
    }
  }
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
  /// Enable Prometheus metrics export.
  pub enabled: bool,
  /// Metrics server bind address.
  pub bind_address: String,
}

impl Default for MetricsConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      bind_address: "0.0.0.0:9090".to_string(),
    }
  }
}

/// Retention of completed orders. Disabled unless a TTL is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
  /// Evict confirmed/failed orders older than this (seconds).
  pub completed_ttl_secs: Option<u64>,
  /// How often the sweep runs (seconds).
  pub sweep_interval_secs: u64,
}

impl Default for RetentionConfig {
  fn default() -> Self {
    Self {
      completed_ttl_secs: None,
      sweep_interval_secs: 60,
    }
  }
}

// Default value functions for serde

fn default_log_level() -> String {
  "info".to_string()
}

/// Raydium and Meteora simulations, quoted in that order.
fn default_venues() -> Vec<VenueConfig> {
  vec![
    VenueConfig::new("raydium", 0.003),
    VenueConfig {
      multiplier_min: 0.97,
      multiplier_max: 1.02,
      ..VenueConfig::new("meteora", 0.002)
    },
  ]
}

fn default_price_floor() -> f64 {
  100.0
}

fn default_price_spread() -> f64 {
  10.0
}

fn default_multiplier_min() -> f64 {
  0.98
}

fn default_multiplier_max() -> f64 {
  1.02
}

fn default_quote_latency() -> u64 {
  200
}

fn default_execute_latency_min() -> u64 {
  2_000
}

fn default_execute_latency_max() -> u64 {
  3_000
}
