//! Placement pipeline
//!
//! PlacementEvent -> PlacementValidator -> ValidatedEvent -> EventApplier -> LedgerDelta

pub mod applier;
pub mod validator;

pub use applier::EventApplier;
pub use validator::{PlacementValidator, ValidatedEvent};
