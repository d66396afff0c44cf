//! Venue Port - Liquidity Venue Interface
//!
//! Defines the capability every execution venue offers the engine:
//! quote a pair for a given size, and execute a swap against a quote.
//! The pipeline is agnostic to the venue implementation; simulated
//! venues and real DEX connectors both plug in here.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::order::{Order, TradingPair};
use crate::domain::quote::{Quote, SwapReceipt, VenueId};

/// Trait for liquidity venues.
///
/// Implementors must be cheap to share (`Arc<dyn VenueClient>`) and safe
/// to call concurrently from many in-flight orders.
#[async_trait]
pub trait VenueClient: Send + Sync + 'static {
  /// Stable venue identifier, used as `Quote::venue` and in logs.
  fn id(&self) -> VenueId;

  /// Request a price quote for swapping `amount` of `pair.token_in`.
  ///
  /// # Errors
  /// Returns error if the venue cannot quote the pair.
  async fn quote(&self, pair: &TradingPair, amount: Decimal) -> anyhow::Result<Quote>;

  /// Execute the swap for `order` at the previously selected `quote`.
  ///
  /// # Errors
  /// Returns error if the venue rejects or fails the swap.
  async fn execute(&self, order: &Order, quote: &Quote) -> anyhow::Result<SwapReceipt>;
}
