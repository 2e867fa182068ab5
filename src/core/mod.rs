pub mod config;
pub mod error;
pub mod types;

pub use config::{FactionAbilities, ForceCount, RulesConfig, ShipmentRates};
pub use error::{EngineError, InvariantViolation, RejectionReason, Result};
pub use types::{Faction, LocationId, SessionId};
