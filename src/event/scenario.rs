//! JSON schema for scripted event sequences
//!
//! Scenario files name locations by key instead of id so they survive map
//! edits. Both event shapes are accepted:
//! - the minimal location form `{kind, initiator, to, total}`, which lands
//!   every force at `to` as regulars
//! - the placement form with an explicit `forces` table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use super::{Deployment, EventKind, ForceLocations, Movement, PlacementEvent, Shipment};
use crate::core::config::ForceCount;
use crate::core::types::{Faction, LocationId};
use crate::forces::Battalion;
use crate::map::MapModel;

/// Errors that can occur when loading a scenario
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Event {index}: unknown location {key}")]
    UnknownLocation { index: usize, key: String },
    #[error("Event {index}: movement needs a `from` location")]
    MissingOrigin { index: usize },
    #[error("Event {index}: needs either `total` or `forces`")]
    EmptyEvent { index: usize },
}

/// Root structure for scenario JSON files
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioFile {
    #[serde(default)]
    pub name: Option<String>,
    pub events: Vec<ScenarioEvent>,
}

/// A single scripted event
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioEvent {
    pub kind: EventKind,
    pub initiator: Faction,
    #[serde(default)]
    pub from: Option<String>,
    pub to: String,
    /// Declared total; defaults to the sum of `forces`
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub forces: BTreeMap<String, ForceCount>,
}

impl ScenarioFile {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Resolve every event against a map
    pub fn resolve(&self, map: &MapModel) -> Result<Vec<PlacementEvent>, ScenarioError> {
        self.events
            .iter()
            .enumerate()
            .map(|(index, event)| event.resolve(index, map))
            .collect()
    }
}

impl ScenarioEvent {
    fn lookup(map: &MapModel, index: usize, key: &str) -> Result<LocationId, ScenarioError> {
        map.id_of(key).ok_or_else(|| ScenarioError::UnknownLocation {
            index,
            key: key.to_string(),
        })
    }

    pub fn resolve(&self, index: usize, map: &MapModel) -> Result<PlacementEvent, ScenarioError> {
        let to = Self::lookup(map, index, &self.to)?;

        let force_locations: ForceLocations = if self.forces.is_empty() {
            let total = self.total.ok_or(ScenarioError::EmptyEvent { index })?;
            ForceLocations::at(to, Battalion::regular(self.initiator, total))
        } else {
            self.forces
                .iter()
                .map(|(key, count)| {
                    let location = Self::lookup(map, index, key)?;
                    let battalion = Battalion::new(self.initiator, count.forces, count.special_forces);
                    Ok::<_, ScenarioError>((location, battalion))
                })
                .collect::<Result<_, ScenarioError>>()?
        };
        let total_amount_of_forces = self.total.unwrap_or_else(|| force_locations.total_strength());

        let event = match self.kind {
            EventKind::Shipment => PlacementEvent::Shipment(Shipment {
                initiator: self.initiator,
                to,
                force_locations,
                total_amount_of_forces,
            }),
            EventKind::Movement => {
                let from_key = self
                    .from
                    .as_deref()
                    .ok_or(ScenarioError::MissingOrigin { index })?;
                PlacementEvent::Movement(Movement {
                    initiator: self.initiator,
                    from: Self::lookup(map, index, from_key)?,
                    to,
                    force_locations,
                    total_amount_of_forces,
                })
            }
            EventKind::Deployment => PlacementEvent::Deployment(Deployment {
                initiator: self.initiator,
                to,
                force_locations,
                total_amount_of_forces,
            }),
        };
        Ok(event)
    }
}
