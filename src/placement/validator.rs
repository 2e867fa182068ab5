//! Placement validation - decides whether an event is legal
//!
//! Validation never mutates the ledger, so the same call serves as a
//! dry-run preview for clients.

use std::collections::BTreeSet;

use crate::core::error::RejectionReason;
use crate::core::types::{Faction, LocationId};
use crate::event::PlacementEvent;
use crate::forces::{Battalion, ChangeSet, ForceLedger, ForceSlot};
use crate::map::MapModel;
use crate::shipment::{PermissionResolver, ShipmentCost, ShipmentPermission};

/// An event that passed every check, with the exact change to apply
///
/// Only [`PlacementValidator`] can build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEvent {
    event: PlacementEvent,
    permissions: ShipmentPermission,
    cost: ShipmentCost,
    changes: ChangeSet,
    ledger_version: u64,
}

impl ValidatedEvent {
    pub fn event(&self) -> &PlacementEvent {
        &self.event
    }

    pub fn faction(&self) -> Faction {
        self.event.initiator()
    }

    /// Permissions resolved for the event's declared destination
    pub fn permissions(&self) -> ShipmentPermission {
        self.permissions
    }

    pub fn cost(&self) -> ShipmentCost {
        self.cost
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    /// Ledger version the checks were run against
    pub fn ledger_version(&self) -> u64 {
        self.ledger_version
    }
}

/// Checks placement events against the map, the ledger and permissions
pub struct PlacementValidator<'a> {
    map: &'a MapModel,
    resolver: &'a PermissionResolver,
}

impl<'a> PlacementValidator<'a> {
    pub fn new(map: &'a MapModel, resolver: &'a PermissionResolver) -> Self {
        Self { map, resolver }
    }

    /// Validate an event, failing fast on the first violated rule
    ///
    /// 1. Declared total matches the sum of `force_locations`
    /// 2. Every deposit lands where this event kind may land
    /// 3. The initiator holds the permissions the destinations demand
    /// 4. The source slot holds enough forces of each sub-type
    pub fn validate(
        &self,
        ledger: &ForceLedger,
        event: &PlacementEvent,
    ) -> Result<ValidatedEvent, RejectionReason> {
        self.check_force_count(event)?;
        self.check_destinations(event)?;
        let permissions = self.check_permissions(event)?;
        let requested = self.check_sufficiency(ledger, event)?;

        let cost = match event {
            PlacementEvent::Shipment(_) => {
                let deposits: Vec<_> = event
                    .force_locations()
                    .iter()
                    .map(|(loc, b)| (loc, b.strength()))
                    .filter(|(_, strength)| *strength > 0)
                    .collect();
                self.resolver.quote(event.initiator(), permissions, &deposits)
            }
            PlacementEvent::Movement(_) | PlacementEvent::Deployment(_) => ShipmentCost::FREE,
        };

        let mut changes = ChangeSet::new(event.initiator()).withdraw(event.source(), requested);
        for (location, battalion) in event.force_locations().iter() {
            if !battalion.is_empty() {
                changes = changes.deposit(ForceSlot::Map(location), *battalion);
            }
        }

        tracing::debug!(
            "Validated {} by {} to {}: {} forces, permissions {:?}, cost {:?}",
            event.kind(),
            event.initiator(),
            self.map.name_of(event.to()),
            requested.strength(),
            permissions,
            cost
        );

        Ok(ValidatedEvent {
            event: event.clone(),
            permissions,
            cost,
            changes,
            ledger_version: ledger.version(),
        })
    }

    fn check_force_count(&self, event: &PlacementEvent) -> Result<(), RejectionReason> {
        let declared = event.total_amount_of_forces();
        match event.force_locations().checked_total_strength() {
            Some(actual) if declared != 0 && declared == actual => Ok(()),
            actual => Err(RejectionReason::ForceCountMismatch {
                declared,
                actual: actual.unwrap_or(u32::MAX),
            }),
        }
    }

    /// Locations this event may deposit into
    ///
    /// Shipment: every sector of `to`'s territory.
    /// Movement: `to` only.
    /// Deployment: sectors of `to` plus every location adjacent to `to`.
    fn landing_zone(&self, event: &PlacementEvent) -> BTreeSet<LocationId> {
        let to = event.to();
        match event {
            PlacementEvent::Shipment(_) => self.map.sectors_of(to).collect(),
            PlacementEvent::Movement(_) => BTreeSet::from([to]),
            PlacementEvent::Deployment(_) => self
                .map
                .sectors_of(to)
                .chain(self.map.neighbors(to))
                .collect(),
        }
    }

    fn check_destinations(&self, event: &PlacementEvent) -> Result<(), RejectionReason> {
        let to = event.to();
        if !self.map.contains(to) {
            return Err(invalid(to, "unknown location"));
        }

        if let PlacementEvent::Movement(movement) = event {
            let from = movement.from;
            if !self.map.contains(from) {
                return Err(invalid(from, "unknown origin"));
            }
            if from == to {
                return Err(invalid(to, "origin and destination are the same"));
            }
            let reachable = self.map.adjacent(from, to)
                || self.map.location(from).same_territory(self.map.location(to));
            if !reachable {
                return Err(invalid(to, "not reachable from origin"));
            }
        }

        let zone = self.landing_zone(event);
        for location in event.force_locations().locations() {
            if !self.map.contains(location) {
                return Err(invalid(location, "unknown location"));
            }
            if !zone.contains(&location) {
                return Err(invalid(location, "outside the landing zone of this event"));
            }
        }
        Ok(())
    }

    /// Returns the permissions resolved for `to`
    fn check_permissions(&self, event: &PlacementEvent) -> Result<ShipmentPermission, RejectionReason> {
        let faction = event.initiator();

        for (location, battalion) in event.force_locations().iter() {
            if battalion.faction != faction {
                return Err(RejectionReason::PermissionDenied {
                    faction,
                    location,
                    required: ShipmentPermission::NONE,
                });
            }
        }

        if matches!(event, PlacementEvent::Deployment(_))
            && !self.resolver.abilities(faction).native_deployment
        {
            return Err(RejectionReason::PermissionDenied {
                faction,
                location: event.to(),
                required: ShipmentPermission::NONE,
            });
        }

        for location in event.force_locations().locations() {
            let granted = self.resolver.resolve(faction, location);
            if event.from_reserve()
                && self.map.is_board_edge(location)
                && !granted.contains(ShipmentPermission::CROSS)
            {
                return Err(RejectionReason::PermissionDenied {
                    faction,
                    location,
                    required: ShipmentPermission::CROSS,
                });
            }
            if self.map.is_homeworld_of(location).is_some()
                && !granted.contains(ShipmentPermission::TO_HOMEWORLD)
            {
                return Err(RejectionReason::PermissionDenied {
                    faction,
                    location,
                    required: ShipmentPermission::TO_HOMEWORLD,
                });
            }
        }

        Ok(self.resolver.resolve(faction, event.to()))
    }

    /// Returns the battalion to withdraw from the source slot
    fn check_sufficiency(
        &self,
        ledger: &ForceLedger,
        event: &PlacementEvent,
    ) -> Result<Battalion, RejectionReason> {
        let faction = event.initiator();
        let requested = event
            .force_locations()
            .iter()
            .fold(Battalion::empty(faction), |acc, (_, b)| acc.merged(b));

        let source = event.source();
        let available = ledger.strength_in(faction, source);
        if !available.covers(&requested) {
            return Err(RejectionReason::InsufficientForces {
                faction,
                source_slot: source,
                requested: requested.strength(),
                available: available.strength(),
            });
        }
        Ok(requested)
    }
}

fn invalid(location: LocationId, detail: &'static str) -> RejectionReason {
    RejectionReason::InvalidDestination { location, detail }
}
