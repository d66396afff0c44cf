//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the engine's core workflows.
//!
//! Use cases:
//! - `AdmissionQueue`: Bounded-concurrency FIFO admission
//! - `ExecutionPipeline`: Per-order state machine driver
//! - `QuoteAggregator`: Concurrent multi-venue quoting + best price
//! - `OrderStore`: Shared order registry
//! - `RetentionSweeper`: Optional eviction of completed orders

pub mod admission_queue;
pub mod error;
pub mod order_store;
pub mod pipeline;
pub mod quote_aggregator;
pub mod retention;

pub use admission_queue::AdmissionQueue;
pub use error::ExecutionError;
pub use order_store::OrderStore;
pub use pipeline::{ExecutionPipeline, PipelineSettings};
pub use quote_aggregator::{QuoteAggregator, RoutedQuote};
pub use retention::RetentionSweeper;
