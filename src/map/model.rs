//! Map model - the static location graph
//!
//! Built once by the loader and shared read-only between sessions.

use ahash::AHashMap;

use super::location::Location;
use super::loader::{self, MapError};
use crate::core::types::{Faction, LocationId};

/// The immutable map graph
#[derive(Debug, Clone)]
pub struct MapModel {
    locations: Vec<Location>,
    by_key: AHashMap<String, LocationId>,
}

impl MapModel {
    /// Build a map from locations whose ids match their position
    ///
    /// The loader is the only caller; it guarantees dense ids and
    /// symmetric adjacency.
    pub(crate) fn from_locations(locations: Vec<Location>) -> Self {
        let by_key = locations
            .iter()
            .map(|loc| (loc.key.clone(), loc.id))
            .collect();
        Self { locations, by_key }
    }

    /// The standard board shipped with the crate
    pub fn standard() -> Result<Self, MapError> {
        loader::load_map_str(loader::STANDARD_MAP)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn contains(&self, id: LocationId) -> bool {
        id.index() < self.locations.len()
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    /// Look up a location by id
    ///
    /// # Panics
    ///
    /// Panics on an id that did not come from this map.
    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }

    pub fn id_of(&self, key: &str) -> Option<LocationId> {
        self.by_key.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn adjacent(&self, a: LocationId, b: LocationId) -> bool {
        self.location(a).adjacent.contains(&b)
    }

    pub fn is_homeworld_of(&self, id: LocationId) -> Option<Faction> {
        self.location(id).is_homeworld()
    }

    pub fn is_board_edge(&self, id: LocationId) -> bool {
        self.location(id).is_board_edge()
    }

    pub fn neighbors(&self, id: LocationId) -> impl Iterator<Item = LocationId> + '_ {
        self.location(id).adjacent.iter().copied()
    }

    /// All sectors of the territory `id` belongs to, `id` included
    pub fn sectors_of(&self, id: LocationId) -> impl Iterator<Item = LocationId> + '_ {
        let territory = &self.location(id).territory;
        self.locations
            .iter()
            .filter(move |loc| &loc.territory == territory)
            .map(|loc| loc.id)
    }

    pub fn homeworlds_of(&self, faction: Faction) -> impl Iterator<Item = LocationId> + '_ {
        self.locations
            .iter()
            .filter(move |loc| loc.homeworld == Some(faction))
            .map(|loc| loc.id)
    }

    /// Display name for logs and CLI output, tolerant of foreign ids
    pub fn name_of(&self, id: LocationId) -> String {
        self.get(id)
            .map(|loc| loc.name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}
