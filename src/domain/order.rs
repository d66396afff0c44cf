//! Order entity and its execution state machine.
//!
//! An order moves strictly forward through
//! `pending → routing → building → submitted → confirmed`; `failed`
//! can be reached from any in-flight stage. Once an order is terminal,
//! every further event is rejected, so a stored terminal order never
//! changes again.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{TransitionError, ValidationError};
use super::quote::{Quote, SwapReceipt, VenueId};

/// Opaque order identifier assigned at submission.
pub type OrderId = Uuid;

// ────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────

/// How the order should be routed. Only market orders are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Execute immediately at the best available venue price.
    #[default]
    Market,
}

impl FromStr for OrderType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Self::Market),
            other => Err(ValidationError::UnsupportedOrderType(other.to_string())),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "market"),
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Stored, waiting for a concurrency slot.
    Pending,
    /// Admitted; collecting quotes from venues.
    Routing,
    /// Best quote selected; transaction being built.
    Building,
    /// Transaction sent to the selected venue.
    Submitted,
    /// Swap executed. Terminal.
    Confirmed,
    /// Quoting, building or execution failed. Terminal.
    Failed,
}

impl OrderStatus {
    /// `confirmed` and `failed` are absorbing.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// In-flight stages, i.e. the order holds a concurrency slot.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Routing | Self::Building | Self::Submitted)
    }

    /// Position in the forward pipeline ordering.
    const fn stage(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Routing => 1,
            Self::Building => 2,
            Self::Submitted => 3,
            Self::Confirmed => 4,
            Self::Failed => u8::MAX,
        }
    }

    /// Whether `next` is a legal successor of this status.
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed => self.is_active(),
            _ => next.stage() == self.stage() + 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Routing => "routing",
            Self::Building => "building",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────
// Submission
// ────────────────────────────────────────────

/// Input/output token pair of a swap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub token_in: String,
    pub token_out: String,
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_in, self.token_out)
    }
}

/// A validated submission, ready to become an [`Order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTicket {
    pub pair: TradingPair,
    pub amount: Decimal,
    pub order_type: OrderType,
}

impl OrderTicket {
    /// Validate raw submission fields.
    ///
    /// Tokens must be non-blank and the amount strictly positive.
    pub fn new(
        token_in: &str,
        token_out: &str,
        amount: Decimal,
        order_type: OrderType,
    ) -> Result<Self, ValidationError> {
        let mut missing = Vec::new();
        if token_in.trim().is_empty() {
            missing.push("tokenIn");
        }
        if token_out.trim().is_empty() {
            missing.push("tokenOut");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if amount <= Decimal::ZERO {
            return Err(ValidationError::InvalidAmount(format!(
                "must be positive, got {amount}"
            )));
        }

        Ok(Self {
            pair: TradingPair {
                token_in: token_in.trim().to_string(),
                token_out: token_out.trim().to_string(),
            },
            amount,
            order_type,
        })
    }
}

// ────────────────────────────────────────────
// Order + state machine
// ────────────────────────────────────────────

/// Something that happened to an in-flight order.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    /// The admission queue handed the order to the pipeline.
    Admitted,
    /// Quote aggregation selected a winning quote.
    Routed(Quote),
    /// Transaction construction finished.
    Built,
    /// The venue executed the swap.
    Confirmed(SwapReceipt),
    /// Any stage failed; carries the error description.
    Failed(String),
}

impl OrderEvent {
    /// Status the order ends up in after this event.
    pub const fn target_status(&self) -> OrderStatus {
        match self {
            Self::Admitted => OrderStatus::Routing,
            Self::Routed(_) => OrderStatus::Building,
            Self::Built => OrderStatus::Submitted,
            Self::Confirmed(_) => OrderStatus::Confirmed,
            Self::Failed(_) => OrderStatus::Failed,
        }
    }
}

/// One trade request and its execution state.
///
/// Request fields are public; execution state is only changed through
/// [`Order::apply`], which enforces the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub pair: TradingPair,
    pub amount: Decimal,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
    status: OrderStatus,
    updated_at: DateTime<Utc>,
    selected_quote: Option<Quote>,
    tx_hash: Option<String>,
    executed_price: Option<f64>,
    error: Option<String>,
}

impl Order {
    /// Create a pending order with a fresh identifier.
    pub fn new(ticket: OrderTicket) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pair: ticket.pair,
            amount: ticket.amount,
            order_type: ticket.order_type,
            created_at: now,
            status: OrderStatus::Pending,
            updated_at: now,
            selected_quote: None,
            tx_hash: None,
            executed_price: None,
            error: None,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn selected_quote(&self) -> Option<&Quote> {
        self.selected_quote.as_ref()
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    pub fn executed_price(&self) -> Option<f64> {
        self.executed_price
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply an event, advancing the status.
    ///
    /// # Errors
    /// Returns `TransitionError` when the event is not a legal successor of
    /// the current status; the order is left untouched.
    pub fn apply(&mut self, event: OrderEvent) -> Result<(), TransitionError> {
        let next = event.target_status();
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                order_id: self.id,
                from: self.status,
                to: next,
            });
        }

        match event {
            OrderEvent::Routed(quote) => self.selected_quote = Some(quote),
            OrderEvent::Confirmed(receipt) => {
                self.tx_hash = Some(receipt.tx_hash);
                self.executed_price = Some(receipt.executed_price);
            }
            OrderEvent::Failed(reason) => self.error = Some(reason),
            OrderEvent::Admitted | OrderEvent::Built => {}
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Snapshot published to observers.
    pub fn update(&self) -> OrderUpdate {
        OrderUpdate {
            order_id: self.id,
            status: self.status,
            tx_hash: self.tx_hash.clone(),
            executed_price: self.executed_price,
            error: self.error.clone(),
            selected_venue: self.selected_quote.as_ref().map(|q| q.venue.clone()),
        }
    }
}

/// Status snapshot delivered to observers.
///
/// Optional fields are omitted from the JSON when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executed_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "selectedDex", default, skip_serializing_if = "Option::is_none")]
    pub selected_venue: Option<VenueId>,
}
