//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location identifier on the map
///
/// Dense index assigned by the map loader in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationId(pub u16);

impl LocationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Player factions, one per seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Faction {
    Atreides,
    Harkonnen,
    Emperor,
    Fremen,
    Guild,
    BeneGesserit,
}

impl Faction {
    pub const ALL: [Faction; 6] = [
        Faction::Atreides,
        Faction::Harkonnen,
        Faction::Emperor,
        Faction::Fremen,
        Faction::Guild,
        Faction::BeneGesserit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Atreides => "Atreides",
            Self::Harkonnen => "Harkonnen",
            Self::Emperor => "Emperor",
            Self::Fremen => "Fremen",
            Self::Guild => "Guild",
            Self::BeneGesserit => "BeneGesserit",
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Faction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Faction::ALL
            .into_iter()
            .find(|f| f.name().to_lowercase() == lower)
            .ok_or_else(|| format!("Unknown faction: {}", s))
    }
}
