//! Game session - one table's authoritative state
//!
//! A session owns its ledger outright. Validation and application of one
//! event happen inside a single `&mut self` call, so no other event can
//! observe or change the ledger in between.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::config::RulesConfig;
use crate::core::error::{EngineError, InvariantViolation, Result};
use crate::core::types::{Faction, SessionId};
use crate::event::{EventKind, LocationEvent, PlacementEvent};
use crate::forces::{Battalion, ForceLedger, ForceSlot, LedgerDelta};
use crate::map::{MapError, MapModel};
use crate::placement::{EventApplier, PlacementValidator, ValidatedEvent};
use crate::shipment::{PermissionResolver, ShipmentCost, ShipmentPermission};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Active,
    /// An engine bug was detected; the session refuses further events
    Corrupted { reason: String },
}

/// Outcome of an applied event, handed to broadcast and logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedEvent {
    pub session: SessionId,
    pub kind: EventKind,
    pub event: LocationEvent,
    pub permissions: ShipmentPermission,
    pub cost: ShipmentCost,
    pub delta: LedgerDelta,
}

/// Running counters for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub applied: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    map: Arc<MapModel>,
    resolver: PermissionResolver,
    ledger: ForceLedger,
    starting_pools: BTreeMap<Faction, u64>,
    status: SessionStatus,
    stats: SessionStats,
}

impl GameSession {
    /// Set up a new table: reserves and opening placements per faction
    pub fn new(map: Arc<MapModel>, config: &RulesConfig) -> Result<Self> {
        config.validate()?;

        let mut ledger = ForceLedger::new();
        let mut starting_pools = BTreeMap::new();
        for setup in &config.factions {
            let faction = setup.faction;
            let reserve = setup.opening_reserve();
            ledger.seed(
                ForceSlot::Reserve,
                Battalion::new(faction, reserve.forces, reserve.special_forces),
            );
            for (key, count) in &setup.initial_placements {
                let location = map
                    .id_of(key)
                    .ok_or_else(|| MapError::UnknownLocation(key.clone()))?;
                ledger.seed(
                    ForceSlot::Map(location),
                    Battalion::new(faction, count.forces, count.special_forces),
                );
            }
            starting_pools.insert(
                faction,
                u64::from(setup.starting_forces) + u64::from(setup.starting_special_forces),
            );
        }

        let resolver = PermissionResolver::new(map.clone(), config);
        let id = SessionId::new();
        tracing::info!("Opened session {} with {} factions", id, starting_pools.len());

        Ok(Self {
            id,
            map,
            resolver,
            ledger,
            starting_pools,
            status: SessionStatus::Active,
            stats: SessionStats::default(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn map(&self) -> &MapModel {
        &self.map
    }

    pub fn ledger(&self) -> &ForceLedger {
        &self.ledger
    }

    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_corrupted(&self) -> bool {
        matches!(self.status, SessionStatus::Corrupted { .. })
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Fixed total force pool of a faction (zero for factions not seated)
    pub fn starting_pool(&self, faction: Faction) -> u64 {
        self.starting_pools.get(&faction).copied().unwrap_or(0)
    }

    pub fn factions(&self) -> impl Iterator<Item = Faction> + '_ {
        self.starting_pools.keys().copied()
    }

    /// Dry-run an event without touching the ledger
    pub fn preview(&self, event: &PlacementEvent) -> Result<ValidatedEvent> {
        if self.is_corrupted() {
            return Err(EngineError::SessionCorrupted(self.id));
        }
        let validator = PlacementValidator::new(&self.map, &self.resolver);
        Ok(validator.validate(&self.ledger, event)?)
    }

    /// Validate and apply one event as a single transaction
    ///
    /// The change is applied to a copy of the ledger and committed only once
    /// the faction's pool still adds up, so a corrupting event never lands.
    pub fn submit(&mut self, event: &PlacementEvent) -> Result<AppliedEvent> {
        if self.is_corrupted() {
            return Err(EngineError::SessionCorrupted(self.id));
        }

        let validated = match PlacementValidator::new(&self.map, &self.resolver).validate(&self.ledger, event) {
            Ok(validated) => validated,
            Err(reason) => {
                self.stats.rejected += 1;
                tracing::warn!("Session {}: rejected {} by {}: {}", self.id, event.kind(), event.initiator(), reason);
                return Err(reason.into());
            }
        };

        let mut staged = self.ledger.clone();
        let delta = match EventApplier::apply(&mut staged, &validated) {
            Ok(delta) => delta,
            Err(violation) => return Err(self.corrupt(violation)),
        };

        let faction = validated.faction();
        let expected = self.starting_pool(faction);
        let found = staged.total_of(faction);
        if found != expected {
            return Err(self.corrupt(InvariantViolation::ConservationBroken {
                faction,
                expected,
                found,
            }));
        }
        self.ledger = staged;

        self.stats.applied += 1;
        Ok(AppliedEvent {
            session: self.id,
            kind: event.kind(),
            event: event.as_location_event(),
            permissions: validated.permissions(),
            cost: validated.cost(),
            delta,
        })
    }

    /// Every faction's pool still adds up to its starting size
    pub fn conservation_holds(&self) -> bool {
        self.starting_pools
            .iter()
            .all(|(faction, pool)| self.ledger.total_of(*faction) == *pool)
    }

    fn corrupt(&mut self, violation: InvariantViolation) -> EngineError {
        tracing::error!("Session {} corrupted: {}", self.id, violation);
        self.status = SessionStatus::Corrupted {
            reason: violation.to_string(),
        };
        EngineError::InternalInvariantViolation(violation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ForceCount;
    use crate::core::error::RejectionReason;
    use crate::event::{Movement, Shipment};

    fn session() -> GameSession {
        let map = Arc::new(MapModel::standard().unwrap());
        GameSession::new(map, &RulesConfig::default()).unwrap()
    }

    #[test]
    fn test_opening_positions() {
        let session = session();
        let arrakeen = session.map().id_of("arrakeen").unwrap();
        assert_eq!(session.ledger().reserve_of(Faction::Atreides).strength(), 10);
        assert_eq!(session.ledger().strength_at(Faction::Atreides, arrakeen).strength(), 10);
        assert_eq!(session.ledger().reserve_of(Faction::Emperor), Battalion::new(Faction::Emperor, 15, 5));
        assert_eq!(session.starting_pool(Faction::Fremen), 20);
        assert!(session.conservation_holds());
        assert_eq!(session.factions().count(), 6);
    }

    #[test]
    fn test_unknown_opening_location_rejected() {
        let map = Arc::new(MapModel::standard().unwrap());
        let mut config = RulesConfig::default();
        config.factions[0]
            .initial_placements
            .insert("atlantis".into(), ForceCount::new(1, 0));
        assert!(matches!(
            GameSession::new(map, &config),
            Err(EngineError::Map(MapError::UnknownLocation(_)))
        ));
    }

    #[test]
    fn test_submit_applies_and_counts() {
        let mut session = session();
        let caladan = session.map().id_of("caladan").unwrap();
        let event: PlacementEvent =
            Shipment::single(Faction::Atreides, caladan, Battalion::regular(Faction::Atreides, 3)).into();

        let applied = session.submit(&event).unwrap();

        assert_eq!(applied.session, session.id());
        assert!(applied.permissions.contains(ShipmentPermission::TO_HOMEWORLD));
        assert_eq!(session.ledger().reserve_of(Faction::Atreides).strength(), 7);
        assert_eq!(session.stats(), SessionStats { applied: 1, rejected: 0 });
        assert!(session.conservation_holds());
    }

    #[test]
    fn test_rejection_leaves_ledger_unchanged() {
        let mut session = session();
        let before = session.ledger().clone();
        let meridian = session.map().id_of("meridian_west").unwrap();
        let event: PlacementEvent =
            Shipment::single(Faction::Atreides, meridian, Battalion::regular(Faction::Atreides, 3)).into();

        let err = session.submit(&event).unwrap_err();

        assert!(matches!(err.rejection(), Some(RejectionReason::PermissionDenied { .. })));
        assert_eq!(session.ledger(), &before);
        assert_eq!(session.stats().rejected, 1);
        assert!(!session.is_corrupted());
    }

    #[test]
    fn test_preview_does_not_mutate() {
        let session = session();
        let carthag = session.map().id_of("carthag").unwrap();
        let funeral = session.map().id_of("funeral_plain").unwrap();
        let event: PlacementEvent =
            Movement::single(Faction::Harkonnen, carthag, funeral, Battalion::regular(Faction::Harkonnen, 5)).into();

        let validated = session.preview(&event).unwrap();

        assert_eq!(validated.ledger_version(), 0);
        assert_eq!(session.ledger().version(), 0);
        assert_eq!(session.ledger().strength_at(Faction::Harkonnen, carthag).strength(), 10);
    }

    #[test]
    fn test_corrupted_session_refuses_events() {
        let mut session = session();
        let violation = InvariantViolation::StaleValidation { validated: 0, current: 1 };
        let _ = session.corrupt(violation);
        assert!(session.is_corrupted());

        let arrakeen = session.map().id_of("arrakeen").unwrap();
        let event: PlacementEvent =
            Shipment::single(Faction::Atreides, arrakeen, Battalion::regular(Faction::Atreides, 1)).into();
        assert!(matches!(session.submit(&event), Err(EngineError::SessionCorrupted(_))));
        assert!(matches!(session.preview(&event), Err(EngineError::SessionCorrupted(_))));
    }

    #[test]
    fn test_drifted_pool_is_caught_before_commit() {
        let mut session = session();
        // Forces that never came from the starting pool
        session.ledger.seed(ForceSlot::Reserve, Battalion::regular(Faction::Atreides, 1));
        let before = session.ledger().clone();

        let caladan = session.map().id_of("caladan").unwrap();
        let event: PlacementEvent =
            Shipment::single(Faction::Atreides, caladan, Battalion::regular(Faction::Atreides, 3)).into();
        let err = session.submit(&event).unwrap_err();

        assert!(matches!(
            err,
            EngineError::InternalInvariantViolation(InvariantViolation::ConservationBroken {
                faction: Faction::Atreides,
                expected: 20,
                found: 21,
            })
        ));
        assert!(session.is_corrupted());
        assert_eq!(session.ledger(), &before);
        assert_eq!(session.ledger().version(), 0);
        assert_eq!(session.stats().applied, 0);
    }

    #[test]
    fn test_huge_starting_pool_does_not_wrap() {
        let map = Arc::new(MapModel::standard().unwrap());
        let mut config = RulesConfig::default();
        let setup = &mut config.factions[0];
        setup.starting_forces = u32::MAX;
        setup.starting_special_forces = 1;
        setup.initial_placements.clear();
        let faction = setup.faction;

        let session = GameSession::new(map, &config).unwrap();

        assert_eq!(session.starting_pool(faction), u64::from(u32::MAX) + 1);
        assert!(session.conservation_holds());
    }
}
