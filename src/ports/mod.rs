//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `VenueClient`: Quote and swap execution on a liquidity venue
//! - `UpdatePublisher`: Fan-out of order status snapshots to observers

pub mod publisher;
pub mod venue;

pub use publisher::UpdatePublisher;
pub use venue::VenueClient;
