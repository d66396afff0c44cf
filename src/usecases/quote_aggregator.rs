//! Quote Aggregator - Multi-venue Best Price Routing
//!
//! Fans a quote request out to every configured venue concurrently,
//! waits for all of them, and picks the winner:
//! - Strictly higher price wins, ties go to the venue asked first
//! - Each venue call has its own deadline; expiry counts as a failure
//! - Venue failures are handled per `VenueFailurePolicy`
//!
//! Never touches the order itself; the pipeline records the result.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use rust_decimal::Decimal;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use super::error::ExecutionError;
use crate::config::VenueFailurePolicy;
use crate::domain::order::{Order, TradingPair};
use crate::domain::quote::{Quote, best_quote_index};
use crate::ports::venue::VenueClient;

/// Winning quote together with the venue that must execute it.
#[derive(Clone)]
pub struct RoutedQuote {
  pub quote: Quote,
  pub venue: Arc<dyn VenueClient>,
}

impl std::fmt::Debug for RoutedQuote {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RoutedQuote")
      .field("quote", &self.quote)
      .field("venue", &self.venue.id())
      .finish()
  }
}

/// Queries all venues and selects the best quote.
pub struct QuoteAggregator {
  /// Venues in request order (tie-break order).
  venues: Vec<Arc<dyn VenueClient>>,
  /// Per-venue quote deadline.
  quote_timeout: Duration,
  /// What a single venue failure does to the aggregation.
  policy: VenueFailurePolicy,
}

impl QuoteAggregator {
  pub fn new(
    venues: Vec<Arc<dyn VenueClient>>,
    quote_timeout: Duration,
    policy: VenueFailurePolicy,
  ) -> Self {
    Self {
      venues,
      quote_timeout,
      policy,
    }
  }

  pub fn venue_count(&self) -> usize {
    self.venues.len()
  }

  /// Get the best quote across all venues for `order`.
  ///
  /// # Errors
  /// - `NoVenues` when nothing is configured
  /// - `QuoteFailed` for the first failing venue (strict policy)
  /// - `NoQuotes` when every venue failed (best-effort policy)
  #[instrument(skip(self, order), fields(order_id = %order.id, pair = %order.pair))]
  pub async fn best_quote(&self, order: &Order) -> Result<RoutedQuote, ExecutionError> {
    if self.venues.is_empty() {
      return Err(ExecutionError::NoVenues);
    }

    let requests = self
      .venues
      .iter()
      .map(|venue| self.request_quote(venue.as_ref(), &order.pair, order.amount));
    let results = join_all(requests).await;

    let mut venue_indices = Vec::with_capacity(results.len());
    let mut quotes = Vec::with_capacity(results.len());
    let mut failed = 0;

    for (idx, result) in results.into_iter().enumerate() {
      match result {
        Ok(quote) => {
          debug!(venue = %quote.venue, price = quote.price, fee = quote.fee, "Quote received");
          venue_indices.push(idx);
          quotes.push(quote);
        }
        Err(e) => match self.policy {
          VenueFailurePolicy::Strict => return Err(e),
          VenueFailurePolicy::BestEffort => {
            warn!(error = %e, "Venue excluded from comparison");
            failed += 1;
          }
        },
      }
    }

    let best = best_quote_index(&quotes).ok_or(ExecutionError::NoQuotes { failed })?;
    let venue = Arc::clone(&self.venues[venue_indices[best]]);
    let quote = quotes.swap_remove(best);

    info!(
      venue = %quote.venue,
      price = quote.price,
      fee = quote.fee,
      candidates = quotes.len() + 1,
      "Best quote selected"
    );

    Ok(RoutedQuote { quote, venue })
  }

  /// Ask one venue for a quote under the per-venue deadline.
  async fn request_quote(
    &self,
    venue: &dyn VenueClient,
    pair: &TradingPair,
    amount: Decimal,
  ) -> Result<Quote, ExecutionError> {
    let venue_id = venue.id();
    match timeout(self.quote_timeout, venue.quote(pair, amount)).await {
      Err(_) => Err(ExecutionError::StageTimeout {
        stage: "quote",
        venue: venue_id,
        timeout_ms: self.quote_timeout.as_millis() as u64,
      }),
      Ok(Err(e)) => Err(ExecutionError::QuoteFailed {
        venue: venue_id,
        reason: format!("{e:#}"),
      }),
      Ok(Ok(quote)) if !quote.is_valid() => Err(ExecutionError::QuoteFailed {
        venue: venue_id,
        reason: format!("unusable quote (price {}, fee {})", quote.price, quote.fee),
      }),
      Ok(Ok(quote)) => Ok(quote),
    }
  }
}
