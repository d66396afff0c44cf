//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
  let path = Path::new(path);

  let content = std::fs::read_to_string(path)
    .with_context(|| format!("Failed to read config file: {}", path.display()))?;

  parse_config(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig> {
  let config: AppConfig = toml::from_str(content).context("Failed to parse config TOML")?;
  validate_config(&config)?;
  Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - A positive concurrency ceiling and broadcast capacity
/// - At least one venue, with unique ids and sane price/latency ranges
/// - Non-zero stage deadlines
pub fn validate_config(config: &AppConfig) -> Result<()> {
  anyhow::ensure!(
    config.queue.max_concurrent > 0,
    "queue.max_concurrent must be positive"
  );
  anyhow::ensure!(
    config.broadcast.capacity > 0,
    "broadcast.capacity must be positive"
  );
  anyhow::ensure!(
    config.pipeline.quote_timeout_ms > 0 && config.pipeline.execute_timeout_ms > 0,
    "pipeline timeouts must be positive"
  );
  anyhow::ensure!(
    !config.engine.bind_address.is_empty(),
    "engine.bind_address must not be empty"
  );

  // Venue validation
  anyhow::ensure!(
    !config.venues.is_empty(),
    "At least one venue must be configured"
  );

  let mut seen = HashSet::new();
  for (i, venue) in config.venues.iter().enumerate() {
    anyhow::ensure!(!venue.id.is_empty(), "Venue {} has empty id", i);
    anyhow::ensure!(
      seen.insert(venue.id.as_str()),
      "Duplicate venue id: {}",
      venue.id
    );
    anyhow::ensure!(
      (0.0..1.0).contains(&venue.fee),
      "Venue {} fee must be in [0, 1), got {}",
      venue.id,
      venue.fee
    );
    anyhow::ensure!(
      venue.price_floor > 0.0 && venue.price_spread >= 0.0,
      "Venue {} price range must be positive",
      venue.id
    );
    anyhow::ensure!(
      venue.multiplier_min > 0.0 && venue.multiplier_min <= venue.multiplier_max,
      "Venue {} multiplier range invalid: [{}, {}]",
      venue.id,
      venue.multiplier_min,
      venue.multiplier_max
    );
    anyhow::ensure!(
      venue.execute_latency_min_ms <= venue.execute_latency_max_ms,
      "Venue {} execute latency range invalid",
      venue.id
    );
    anyhow::ensure!(
      (0.0..=1.0).contains(&venue.failure_rate),
      "Venue {} failure_rate must be in [0, 1], got {}",
      venue.id,
      venue.failure_rate
    );
    if let Some(price) = venue.fixed_price {
      anyhow::ensure!(
        price.is_finite() && price > 0.0,
        "Venue {} fixed_price must be positive, got {}",
        venue.id,
        price
      );
    }
  }

  if config.retention.completed_ttl_secs.is_some() {
    anyhow::ensure!(
      config.retention.sweep_interval_secs > 0,
      "retention.sweep_interval_secs must be positive"
    );
  }

  Ok(())
}
