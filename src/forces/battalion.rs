//! Battalion - a quantity of one faction's forces

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::types::{Faction, LocationId};

/// Forces belonging to one faction
///
/// `special_forces` are the elite sub-type (Sardaukar, Fedaykin). Both
/// counts are tracked separately but always move together as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Battalion {
    pub faction: Faction,
    pub forces: u32,
    #[serde(default)]
    pub special_forces: u32,
}

impl Battalion {
    pub fn new(faction: Faction, forces: u32, special_forces: u32) -> Self {
        Self {
            faction,
            forces,
            special_forces,
        }
    }

    /// Battalion of regular forces only
    pub fn regular(faction: Faction, forces: u32) -> Self {
        Self::new(faction, forces, 0)
    }

    pub fn empty(faction: Faction) -> Self {
        Self::new(faction, 0, 0)
    }

    /// Total number of forces regardless of sub-type, saturating at `u32::MAX`
    pub fn strength(&self) -> u32 {
        self.forces.saturating_add(self.special_forces)
    }

    /// Total number of forces, None if it does not fit in a `u32`
    pub fn checked_strength(&self) -> Option<u32> {
        self.forces.checked_add(self.special_forces)
    }

    pub fn is_empty(&self) -> bool {
        self.strength() == 0
    }

    /// Check that every sub-type count of `other` fits in this battalion
    pub fn covers(&self, other: &Battalion) -> bool {
        self.forces >= other.forces && self.special_forces >= other.special_forces
    }

    /// Merge another battalion of the same faction into this one
    ///
    /// Counts saturate; use [`Battalion::checked_merge`] where an overflow
    /// must be refused.
    pub fn merge(&mut self, other: &Battalion) {
        debug_assert_eq!(self.faction, other.faction);
        self.forces = self.forces.saturating_add(other.forces);
        self.special_forces = self.special_forces.saturating_add(other.special_forces);
    }

    pub fn merged(mut self, other: &Battalion) -> Self {
        self.merge(other);
        self
    }

    /// Merge, None if any count would overflow
    pub fn checked_merge(&self, other: &Battalion) -> Option<Battalion> {
        Some(Battalion {
            faction: self.faction,
            forces: self.forces.checked_add(other.forces)?,
            special_forces: self.special_forces.checked_add(other.special_forces)?,
        })
    }

    /// Remove `other` from this battalion, None if any count would go negative
    pub fn checked_sub(&self, other: &Battalion) -> Option<Battalion> {
        Some(Battalion {
            faction: self.faction,
            forces: self.forces.checked_sub(other.forces)?,
            special_forces: self.special_forces.checked_sub(other.special_forces)?,
        })
    }
}

impl fmt::Display for Battalion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.special_forces > 0 {
            write!(f, "{} {}+{}*", self.faction, self.forces, self.special_forces)
        } else {
            write!(f, "{} {}", self.faction, self.forces)
        }
    }
}

/// Where a faction's forces sit: off-map reserve or a map location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ForceSlot {
    Reserve,
    Map(LocationId),
}

impl ForceSlot {
    pub fn location(self) -> Option<LocationId> {
        match self {
            Self::Reserve => None,
            Self::Map(id) => Some(id),
        }
    }
}
