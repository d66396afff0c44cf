//! Simulated Venue - Mock DEX Quote and Swap Adapter
//!
//! Implements the `VenueClient` port without touching a chain:
//! quotes after a fixed latency with a randomized price model, executes
//! swaps after a random latency and returns a fresh transaction
//! reference. Used for development, demos and load tests.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::config::VenueConfig;
use crate::domain::order::{Order, TradingPair};
use crate::domain::quote::{Quote, SwapReceipt, VenueId};
use crate::ports::venue::VenueClient;

/// Fresh 32-byte transaction reference as 64 lowercase hex characters.
pub fn generate_tx_hash() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// Venue whose prices and latencies come from a [`VenueConfig`].
#[derive(Debug, Clone)]
pub struct SimulatedVenue {
    config: VenueConfig,
}

impl SimulatedVenue {
    pub fn new(config: VenueConfig) -> Self {
        Self { config }
    }

    /// Draw a price from the configured model.
    fn sample_price(&self) -> f64 {
        if let Some(price) = self.config.fixed_price {
            return price;
        }
        let mut rng = rand::rng();
        let base = self.config.price_floor + rng.random::<f64>() * self.config.price_spread;
        base * rng.random_range(self.config.multiplier_min..=self.config.multiplier_max)
    }

    fn execute_latency(&self) -> Duration {
        let min = self.config.execute_latency_min_ms;
        let max = self.config.execute_latency_max_ms.max(min);
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    fn rejects(&self) -> bool {
        self.config.failure_rate > 0.0 && rand::rng().random_bool(self.config.failure_rate.min(1.0))
    }
}

#[async_trait]
impl VenueClient for SimulatedVenue {
    fn id(&self) -> VenueId {
        self.config.id.clone()
    }

    #[instrument(skip(self), fields(venue = %self.config.id))]
    async fn quote(&self, pair: &TradingPair, amount: Decimal) -> Result<Quote> {
        tokio::time::sleep(Duration::from_millis(self.config.quote_latency_ms)).await;

        let quote = Quote::new(self.config.id.clone(), self.sample_price(), self.config.fee);
        debug!(price = quote.price, fee = quote.fee, "Quote issued");
        Ok(quote)
    }

    #[instrument(skip(self, order, quote), fields(venue = %self.config.id, order_id = %order.id))]
    async fn execute(&self, order: &Order, quote: &Quote) -> Result<SwapReceipt> {
        let latency = self.execute_latency();
        let rejected = self.rejects();
        tokio::time::sleep(latency).await;

        if rejected {
            bail!("swap rejected by {}: simulated failure", self.config.id);
        }

        let receipt = SwapReceipt {
            tx_hash: generate_tx_hash(),
            executed_price: quote.price,
            venue: self.config.id.clone(),
        };
        debug!(tx_hash = %receipt.tx_hash, latency_ms = latency.as_millis(), "Swap executed");
        Ok(receipt)
    }
}

/// One venue client per configured venue, preserving order.
pub fn build_venues(configs: &[VenueConfig]) -> Vec<Arc<dyn VenueClient>> {
    configs
        .iter()
        .map(|config| Arc::new(SimulatedVenue::new(config.clone())) as Arc<dyn VenueClient>)
        .collect()
}
