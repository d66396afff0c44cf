//! Domain layer - Core business logic and models.
//!
//! Pure order and quote types for the execution engine: the order state
//! machine, the best-quote selection rule, and submission validation.
//! No I/O here (hexagonal architecture inner ring).

pub mod error;
pub mod order;
pub mod quote;

// Re-export core types for convenience
pub use error::{TransitionError, ValidationError};
pub use order::{
    Order, OrderEvent, OrderId, OrderStatus, OrderTicket, OrderType, OrderUpdate, TradingPair,
};
pub use quote::{Quote, SwapReceipt, VenueId, best_quote_index, is_valid_tx_hash, select_best};
