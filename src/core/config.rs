//! Rules configuration with documented constants
//!
//! Everything that differs between table variants of the game (shipment
//! rates, starting pools, opening positions, faction abilities) lives here.
//! The defaults reproduce the standard six-faction game.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::types::Faction;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Per-force shipment prices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipmentRates {
    /// Price per force when shipping into a stronghold
    pub stronghold_rate: u32,

    /// Price per force when shipping anywhere else on the map
    pub standard_rate: u32,

    /// Price per force when shipping onto the faction's own home-world
    pub homeworld_rate: u32,

    /// Discount divisor for factions holding the orange rate
    ///
    /// Orange cost is `ceil(standard cost / divisor)`, so a divisor of 2
    /// halves the bill rounding up.
    pub orange_rate_divisor: u32,
}

impl Default for ShipmentRates {
    fn default() -> Self {
        Self {
            stronghold_rate: 1,
            standard_rate: 2,
            homeworld_rate: 1,
            orange_rate_divisor: 2,
        }
    }
}

/// Plain force counts used in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceCount {
    pub forces: u32,
    pub special_forces: u32,
}

impl ForceCount {
    pub fn new(forces: u32, special_forces: u32) -> Self {
        Self {
            forces,
            special_forces,
        }
    }
}

/// Fixed faction traits that affect shipment legality and price
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactionAbilities {
    /// May ship straight onto board-edge locations
    pub cross_entry: bool,
    /// Qualifies for the discounted shipment rate
    pub orange_rate: bool,
    /// May deploy from reserve for free, spreading into adjacent locations
    pub native_deployment: bool,
}

/// Opening setup for one faction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionSetup {
    pub faction: Faction,
    pub starting_forces: u32,
    #[serde(default)]
    pub starting_special_forces: u32,
    /// Location key -> forces placed there at game start
    #[serde(default)]
    pub initial_placements: BTreeMap<String, ForceCount>,
    #[serde(default)]
    pub abilities: FactionAbilities,
}

impl FactionSetup {
    fn new(faction: Faction, starting_forces: u32, starting_special_forces: u32) -> Self {
        Self {
            faction,
            starting_forces,
            starting_special_forces,
            initial_placements: BTreeMap::new(),
            abilities: FactionAbilities::default(),
        }
    }

    fn place(mut self, location: &str, forces: u32, special_forces: u32) -> Self {
        self.initial_placements
            .insert(location.to_string(), ForceCount::new(forces, special_forces));
        self
    }

    fn with_abilities(mut self, abilities: FactionAbilities) -> Self {
        self.abilities = abilities;
        self
    }

    /// Forces left in reserve after the opening placements
    pub fn opening_reserve(&self) -> ForceCount {
        let placed = self
            .initial_placements
            .values()
            .fold(ForceCount::default(), |acc, c| {
                ForceCount::new(
                    acc.forces.saturating_add(c.forces),
                    acc.special_forces.saturating_add(c.special_forces),
                )
            });
        ForceCount::new(
            self.starting_forces.saturating_sub(placed.forces),
            self.starting_special_forces.saturating_sub(placed.special_forces),
        )
    }
}

/// Configuration for a game table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub shipment: ShipmentRates,
    pub factions: Vec<FactionSetup>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            shipment: ShipmentRates::default(),
            factions: vec![
                FactionSetup::new(Faction::Atreides, 20, 0).place("arrakeen", 10, 0),
                FactionSetup::new(Faction::Harkonnen, 20, 0).place("carthag", 10, 0),
                // Sardaukar are the special forces
                FactionSetup::new(Faction::Emperor, 15, 5),
                // Fedaykin are the special forces
                FactionSetup::new(Faction::Fremen, 17, 3)
                    .place("sietch_tabr", 4, 2)
                    .place("false_wall_west_south", 4, 0)
                    .with_abilities(FactionAbilities {
                        cross_entry: true,
                        native_deployment: true,
                        ..Default::default()
                    }),
                FactionSetup::new(Faction::Guild, 15, 0)
                    .place("tueks_sietch", 5, 0)
                    .with_abilities(FactionAbilities {
                        cross_entry: true,
                        orange_rate: true,
                        ..Default::default()
                    }),
                FactionSetup::new(Faction::BeneGesserit, 20, 0).place("polar_sink", 1, 0),
            ],
        }
    }
}

impl RulesConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RulesConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file on disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn setup_of(&self, faction: Faction) -> Option<&FactionSetup> {
        self.factions.iter().find(|s| s.faction == faction)
    }

    pub fn abilities_of(&self, faction: Faction) -> FactionAbilities {
        self.setup_of(faction)
            .map(|s| s.abilities)
            .unwrap_or_default()
    }

    /// Validate configuration for internal consistency
    ///
    /// Location keys in opening placements are checked later, against the
    /// map the session is built on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = &self.shipment;
        if rates.stronghold_rate == 0 || rates.standard_rate == 0 || rates.homeworld_rate == 0 {
            return Err(ConfigError::Invalid("Shipment rates must be positive".into()));
        }
        if rates.orange_rate_divisor == 0 {
            return Err(ConfigError::Invalid("orange_rate_divisor must be positive".into()));
        }

        for (i, setup) in self.factions.iter().enumerate() {
            if self.factions[..i].iter().any(|s| s.faction == setup.faction) {
                return Err(ConfigError::Invalid(format!(
                    "Faction {} is configured twice",
                    setup.faction
                )));
            }

            let (forces, special) = setup
                .initial_placements
                .values()
                .try_fold((0u32, 0u32), |(f, s), c| {
                    Some((f.checked_add(c.forces)?, s.checked_add(c.special_forces)?))
                })
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("{} opening placements overflow", setup.faction))
                })?;
            if forces > setup.starting_forces || special > setup.starting_special_forces {
                return Err(ConfigError::Invalid(format!(
                    "{} places {}+{} forces at start but only owns {}+{}",
                    setup.faction,
                    forces,
                    special,
                    setup.starting_forces,
                    setup.starting_special_forces
                )));
            }
        }

        Ok(())
    }
}

// === GLOBAL CONFIG ACCESS ===

use std::sync::OnceLock;

static CONFIG: OnceLock<RulesConfig> = OnceLock::new();

/// Get the global rules config (initializes with defaults if not set)
pub fn config() -> &'static RulesConfig {
    CONFIG.get_or_init(RulesConfig::default)
}

/// Set the global rules config (can only be called once)
///
/// Returns Err if config was already set.
pub fn set_config(config: RulesConfig) -> Result<(), RulesConfig> {
    CONFIG.set(config)
}
