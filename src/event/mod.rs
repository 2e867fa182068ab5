//! Inbound placement events
//!
//! A closed union of every event that deposits forces on the map. Each
//! variant carries only its own fields; the validator matches on variant.

pub mod scenario;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::types::{Faction, LocationId};
use crate::forces::{Battalion, ForceSlot};

pub use scenario::{ScenarioError, ScenarioEvent, ScenarioFile};

/// Where an event deposits forces: location -> battalion
///
/// Encoded as a list of `[location, battalion]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(LocationId, Battalion)>", into = "Vec<(LocationId, Battalion)>")]
pub struct ForceLocations(BTreeMap<LocationId, Battalion>);

impl ForceLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry deposit
    pub fn at(location: LocationId, battalion: Battalion) -> Self {
        let mut locations = Self::new();
        locations.insert(location, battalion);
        locations
    }

    pub fn with(mut self, location: LocationId, battalion: Battalion) -> Self {
        self.insert(location, battalion);
        self
    }

    pub fn insert(&mut self, location: LocationId, battalion: Battalion) -> Option<Battalion> {
        self.0.insert(location, battalion)
    }

    pub fn get(&self, location: LocationId) -> Option<&Battalion> {
        self.0.get(&location)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Battalion)> {
        self.0.iter().map(|(loc, b)| (*loc, b))
    }

    pub fn locations(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of strengths across every entry, saturating at `u32::MAX`
    pub fn total_strength(&self) -> u32 {
        self.0
            .values()
            .fold(0u32, |acc, b| acc.saturating_add(b.strength()))
    }

    /// Sum of strengths, None if it does not fit in a `u32`
    pub fn checked_total_strength(&self) -> Option<u32> {
        self.0
            .values()
            .try_fold(0u32, |acc, b| acc.checked_add(b.checked_strength()?))
    }
}

/// Repeated locations are merged into one battalion
impl FromIterator<(LocationId, Battalion)> for ForceLocations {
    fn from_iter<I: IntoIterator<Item = (LocationId, Battalion)>>(iter: I) -> Self {
        let mut entries = BTreeMap::new();
        for (location, battalion) in iter {
            entries
                .entry(location)
                .and_modify(|b: &mut Battalion| b.merge(&battalion))
                .or_insert(battalion);
        }
        Self(entries)
    }
}

/// Decoding merges repeated locations and refuses pairs that cannot merge
impl TryFrom<Vec<(LocationId, Battalion)>> for ForceLocations {
    type Error = String;

    fn try_from(pairs: Vec<(LocationId, Battalion)>) -> Result<Self, Self::Error> {
        let mut entries: BTreeMap<LocationId, Battalion> = BTreeMap::new();
        for (location, battalion) in pairs {
            let merged = match entries.get(&location) {
                None => battalion,
                Some(existing) if existing.faction != battalion.faction => {
                    return Err(format!(
                        "Location {} lists both {} and {}",
                        location, existing.faction, battalion.faction
                    ));
                }
                Some(existing) => existing
                    .checked_merge(&battalion)
                    .ok_or_else(|| format!("Force count at location {} overflows", location))?,
            };
            entries.insert(location, merged);
        }
        Ok(Self(entries))
    }
}

impl From<ForceLocations> for Vec<(LocationId, Battalion)> {
    fn from(locations: ForceLocations) -> Self {
        locations.0.into_iter().collect()
    }
}

/// Event kinds, for logs and scenario files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Shipment,
    Movement,
    Deployment,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipment => f.write_str("shipment"),
            Self::Movement => f.write_str("movement"),
            Self::Deployment => f.write_str("deployment"),
        }
    }
}

/// Ship forces from reserve onto the map
///
/// May spill into the other sectors of `to`'s territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub initiator: Faction,
    pub to: LocationId,
    pub force_locations: ForceLocations,
    pub total_amount_of_forces: u32,
}

impl Shipment {
    /// Ship one battalion to a single location
    pub fn single(initiator: Faction, to: LocationId, battalion: Battalion) -> Self {
        Self {
            initiator,
            to,
            force_locations: ForceLocations::at(to, battalion),
            total_amount_of_forces: battalion.strength(),
        }
    }
}

/// Relocate forces from one map location to a neighbouring one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub initiator: Faction,
    pub from: LocationId,
    pub to: LocationId,
    pub force_locations: ForceLocations,
    pub total_amount_of_forces: u32,
}

impl Movement {
    pub fn single(initiator: Faction, from: LocationId, to: LocationId, battalion: Battalion) -> Self {
        Self {
            initiator,
            from,
            to,
            force_locations: ForceLocations::at(to, battalion),
            total_amount_of_forces: battalion.strength(),
        }
    }
}

/// Free native placement from reserve
///
/// May spill into the sectors of `to` and every location adjacent to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub initiator: Faction,
    pub to: LocationId,
    pub force_locations: ForceLocations,
    pub total_amount_of_forces: u32,
}

/// The minimal view every location-affecting event offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEvent {
    pub initiator: Faction,
    pub to: LocationId,
    pub total_amount_of_forces: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementEvent {
    Shipment(Shipment),
    Movement(Movement),
    Deployment(Deployment),
}

impl PlacementEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Shipment(_) => EventKind::Shipment,
            Self::Movement(_) => EventKind::Movement,
            Self::Deployment(_) => EventKind::Deployment,
        }
    }

    pub fn initiator(&self) -> Faction {
        match self {
            Self::Shipment(e) => e.initiator,
            Self::Movement(e) => e.initiator,
            Self::Deployment(e) => e.initiator,
        }
    }

    pub fn to(&self) -> LocationId {
        match self {
            Self::Shipment(e) => e.to,
            Self::Movement(e) => e.to,
            Self::Deployment(e) => e.to,
        }
    }

    pub fn total_amount_of_forces(&self) -> u32 {
        match self {
            Self::Shipment(e) => e.total_amount_of_forces,
            Self::Movement(e) => e.total_amount_of_forces,
            Self::Deployment(e) => e.total_amount_of_forces,
        }
    }

    pub fn force_locations(&self) -> &ForceLocations {
        match self {
            Self::Shipment(e) => &e.force_locations,
            Self::Movement(e) => &e.force_locations,
            Self::Deployment(e) => &e.force_locations,
        }
    }

    /// Slot the forces are drawn from
    pub fn source(&self) -> ForceSlot {
        match self {
            Self::Movement(e) => ForceSlot::Map(e.from),
            Self::Shipment(_) | Self::Deployment(_) => ForceSlot::Reserve,
        }
    }

    /// True for events that bring forces in from off the board
    pub fn from_reserve(&self) -> bool {
        self.source() == ForceSlot::Reserve
    }

    pub fn as_location_event(&self) -> LocationEvent {
        LocationEvent {
            initiator: self.initiator(),
            to: self.to(),
            total_amount_of_forces: self.total_amount_of_forces(),
        }
    }
}

impl From<Shipment> for PlacementEvent {
    fn from(e: Shipment) -> Self {
        Self::Shipment(e)
    }
}

impl From<Movement> for PlacementEvent {
    fn from(e: Movement) -> Self {
        Self::Movement(e)
    }
}

impl From<Deployment> for PlacementEvent {
    fn from(e: Deployment) -> Self {
        Self::Deployment(e)
    }
}
