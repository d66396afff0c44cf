//! Venue quotes, swap receipts, and the best-quote selection rule.
//!
//! Prices here are illustrative inputs coming from venues; they are
//! compared, never settled, so `f64` is sufficient at this boundary.

use serde::{Deserialize, Serialize};

/// Venue identifier (e.g. `raydium`, `meteora`).
pub type VenueId = String;

/// Length of a transaction reference in hex characters (32 bytes).
pub const TX_HASH_LEN: usize = 64;

/// A venue's offered price and fee for a given trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Venue that produced the quote.
    pub venue: VenueId,
    /// Offered price (output per unit of input). Must be positive.
    pub price: f64,
    /// Venue fee as a fraction (0.003 = 0.3%).
    pub fee: f64,
}

impl Quote {
    pub fn new(venue: impl Into<VenueId>, price: f64, fee: f64) -> Self {
        Self {
            venue: venue.into(),
            price,
            fee,
        }
    }

    /// A quote is usable when its price is a finite positive number and
    /// its fee is a fraction in `[0, 1)`.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0 && (0.0..1.0).contains(&self.fee)
    }
}

/// Confirmation returned by a venue after executing a swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    /// On-chain transaction reference (lowercase hex).
    pub tx_hash: String,
    /// Price the swap actually executed at.
    pub executed_price: f64,
    /// Venue that executed the swap.
    pub venue: VenueId,
}

/// Index of the winning quote.
///
/// A quote replaces the current best only with a strictly greater price,
/// so ties keep the quote requested first. Returns `None` for no quotes.
pub fn best_quote_index(quotes: &[Quote]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (idx, quote) in quotes.iter().enumerate() {
        match best {
            Some(current) if quote.price <= quotes[current].price => {}
            _ => best = Some(idx),
        }
    }
    best
}

/// The winning quote itself. See [`best_quote_index`].
pub fn select_best(quotes: &[Quote]) -> Option<&Quote> {
    best_quote_index(quotes).map(|idx| &quotes[idx])
}

/// Whether `hash` is a well-formed transaction reference:
/// exactly [`TX_HASH_LEN`] lowercase hex characters.
pub fn is_valid_tx_hash(hash: &str) -> bool {
    hash.len() == TX_HASH_LEN
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
