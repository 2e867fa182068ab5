//! Load the map graph from TOML files

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

use super::location::Location;
use super::model::MapModel;
use crate::core::types::{Faction, LocationId};

/// The standard board, embedded at build time
pub const STANDARD_MAP: &str = include_str!("../../data/maps/arrakis.toml");

/// Errors that can occur when loading a map
#[derive(Debug, Error)]
pub enum MapError {
    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// File I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Duplicate location: {0}")]
    DuplicateLocation(String),
    #[error("Unknown location: {0}")]
    UnknownLocation(String),
    #[error("Location {0} is adjacent to itself")]
    SelfAdjacent(String),
    /// Home-worlds are off the board and cannot border anything
    #[error("Home-world {0} declares adjacency")]
    HomeworldAdjacency(String),
    #[error("Map has too many locations ({0})")]
    TooManyLocations(usize),
}

/// Root structure for map TOML files
#[derive(Debug, Deserialize)]
struct MapFile {
    #[serde(default)]
    location: Vec<LocationEntry>,
}

/// A single `[[location]]` table
#[derive(Debug, Deserialize)]
struct LocationEntry {
    id: String,
    name: String,
    territory: String,
    #[serde(default)]
    stronghold: bool,
    #[serde(default)]
    board_edge: bool,
    #[serde(default)]
    homeworld: Option<Faction>,
    #[serde(default)]
    adjacent: Vec<String>,
}

/// Load a map from a TOML file on disk
pub fn load_map(path: &Path) -> Result<MapModel, MapError> {
    let content = std::fs::read_to_string(path)?;
    load_map_str(&content)
}

/// Load a map from TOML text
pub fn load_map_str(content: &str) -> Result<MapModel, MapError> {
    let file: MapFile = toml::from_str(content)?;

    if file.location.len() > u16::MAX as usize {
        return Err(MapError::TooManyLocations(file.location.len()));
    }

    // First pass: assign ids in file order
    let mut ids: HashMap<&str, LocationId> = HashMap::new();
    for (i, entry) in file.location.iter().enumerate() {
        if ids.insert(entry.id.as_str(), LocationId(i as u16)).is_some() {
            return Err(MapError::DuplicateLocation(entry.id.clone()));
        }
    }

    // Second pass: resolve adjacency and mirror every edge
    let mut adjacency: Vec<BTreeSet<LocationId>> = vec![BTreeSet::new(); file.location.len()];
    for (i, entry) in file.location.iter().enumerate() {
        if entry.homeworld.is_some() && !entry.adjacent.is_empty() {
            return Err(MapError::HomeworldAdjacency(entry.id.clone()));
        }
        for neighbor in &entry.adjacent {
            let other = *ids
                .get(neighbor.as_str())
                .ok_or_else(|| MapError::UnknownLocation(neighbor.clone()))?;
            if other.index() == i {
                return Err(MapError::SelfAdjacent(entry.id.clone()));
            }
            if file.location[other.index()].homeworld.is_some() {
                return Err(MapError::HomeworldAdjacency(neighbor.clone()));
            }
            adjacency[i].insert(other);
            adjacency[other.index()].insert(LocationId(i as u16));
        }
    }

    let locations = file
        .location
        .into_iter()
        .zip(adjacency)
        .enumerate()
        .map(|(i, (entry, adjacent))| {
            let mut loc = Location::new(LocationId(i as u16), &entry.id, &entry.name, &entry.territory);
            loc.stronghold = entry.stronghold;
            loc.board_edge = entry.board_edge;
            loc.homeworld = entry.homeworld;
            loc.adjacent = adjacent;
            loc
        })
        .collect();

    let map = MapModel::from_locations(locations);
    tracing::debug!("Loaded map with {} locations", map.len());
    Ok(map)
}
