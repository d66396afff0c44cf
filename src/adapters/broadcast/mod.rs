//! Broadcast Adapters
//!
//! Fan-out of order status snapshots to connected observers over a
//! tokio broadcast channel.

pub mod hub;

pub use hub::BroadcastHub;
