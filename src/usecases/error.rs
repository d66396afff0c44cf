//! Execution errors raised while an order is in the pipeline.
//!
//! Every variant is final for the order: its message becomes the
//! order's `error` field and the order moves to `failed`.

use thiserror::Error;

use crate::domain::error::TransitionError;
use crate::domain::order::OrderId;
use crate::domain::quote::VenueId;

#[derive(Debug, Error)]
pub enum ExecutionError {
  #[error("no venues configured")]
  NoVenues,

  #[error("quote from {venue} failed: {reason}")]
  QuoteFailed { venue: VenueId, reason: String },

  #[error("no venue returned a usable quote ({failed} failed)")]
  NoQuotes { failed: usize },

  #[error("{stage} on {venue} timed out after {timeout_ms} ms")]
  StageTimeout {
    stage: &'static str,
    venue: VenueId,
    timeout_ms: u64,
  },

  #[error("execution on {venue} failed: {reason}")]
  ExecutionFailed { venue: VenueId, reason: String },

  #[error("order {0} not found")]
  UnknownOrder(OrderId),

  #[error(transparent)]
  Transition(#[from] TransitionError),
}
