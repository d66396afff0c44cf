//! Venue Adapters
//!
//! Concrete `VenueClient` implementations. Only simulated venues ship
//! today; real DEX connectors would live next to them.

pub mod simulated;

pub use simulated::{SimulatedVenue, build_venues, generate_tx_hash};
