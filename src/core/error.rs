use thiserror::Error;

use crate::core::types::{Faction, LocationId, SessionId};
use crate::forces::ForceSlot;
use crate::shipment::ShipmentPermission;

/// Why a proposed placement was refused
///
/// User-facing: a rejection never changes state, the caller decides
/// whether to re-prompt the player.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    #[error("Force count mismatch: declared {declared}, placement carries {actual}")]
    ForceCountMismatch { declared: u32, actual: u32 },

    #[error("Invalid destination {location}: {detail}")]
    InvalidDestination {
        location: LocationId,
        detail: &'static str,
    },

    #[error("Permission denied for {faction} at {location} (requires {required:?})")]
    PermissionDenied {
        faction: Faction,
        location: LocationId,
        required: ShipmentPermission,
    },

    #[error("Insufficient forces for {faction} at {source_slot:?}: requested {requested}, available {available}")]
    InsufficientForces {
        faction: Faction,
        source_slot: ForceSlot,
        requested: u32,
        available: u32,
    },
}

/// Engine bug detected while applying an already validated event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Validated event is stale: validated at ledger version {validated}, ledger is at {current}")]
    StaleValidation { validated: u64, current: u64 },

    #[error("Ledger refused validated change: {0}")]
    LedgerRefused(String),

    #[error("Force pool of {faction} drifted: expected {expected}, found {found}")]
    ConservationBroken {
        faction: Faction,
        expected: u64,
        found: u64,
    },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Event rejected: {0}")]
    Rejected(#[from] RejectionReason),

    #[error("Internal invariant violation: {0}")]
    InternalInvariantViolation(#[from] InvariantViolation),

    #[error("Session {0} is corrupted and refuses further events")]
    SessionCorrupted(SessionId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Map error: {0}")]
    Map(#[from] crate::map::MapError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] crate::event::ScenarioError),

    #[error("Config error: {0}")]
    Config(#[from] crate::core::config::ConfigError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl EngineError {
    /// Returns the rejection if this error is a plain user-facing refusal
    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
