//! Domain errors.
//!
//! `ValidationError` rejects a submission before any order exists.
//! `TransitionError` guards the order state machine.

use thiserror::Error;

use super::order::{OrderId, OrderStatus};

/// Why a submission was rejected. Surfaced to the submitter as a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required fields are absent or empty.
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// Amount is present but not a positive number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    /// Order type other than the ones the engine routes.
    #[error("Unsupported order type: {0}")]
    UnsupportedOrderType(String),
}

/// An event that the order's current status does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order {order_id}: invalid transition {from} -> {to}")]
pub struct TransitionError {
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
}
