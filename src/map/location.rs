//! Location - a named node on the map
//!
//! Locations are the nodes of the map graph. Several locations may belong
//! to one territory; those are the territory's sectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::types::{Faction, LocationId};

/// A location on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub key: String,
    pub name: String,
    pub territory: String,
    pub stronghold: bool,
    pub board_edge: bool, // Entering straight from reserve needs Cross
    pub homeworld: Option<Faction>,
    pub adjacent: BTreeSet<LocationId>,
}

impl Location {
    pub fn new(id: LocationId, key: &str, name: &str, territory: &str) -> Self {
        Self {
            id,
            key: key.to_string(),
            name: name.to_string(),
            territory: territory.to_string(),
            stronghold: false,
            board_edge: false,
            homeworld: None,
            adjacent: BTreeSet::new(),
        }
    }

    pub fn with_stronghold(mut self) -> Self {
        self.stronghold = true;
        self
    }

    pub fn with_board_edge(mut self) -> Self {
        self.board_edge = true;
        self
    }

    pub fn with_homeworld(mut self, faction: Faction) -> Self {
        self.homeworld = Some(faction);
        self
    }

    /// The faction this location is the home-world of, if any
    pub fn is_homeworld(&self) -> Option<Faction> {
        self.homeworld
    }

    pub fn is_board_edge(&self) -> bool {
        self.board_edge
    }

    /// Check if this location shares a territory with another
    pub fn same_territory(&self, other: &Location) -> bool {
        self.territory == other.territory
    }
}
