//! Permission resolver - which shipment flags apply, and what they cost
//!
//! Flags come from the destination and fixed faction abilities only; the
//! resolver never reads the ledger.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::permission::ShipmentPermission;
use crate::core::config::{FactionAbilities, RulesConfig, ShipmentRates};
use crate::core::types::{Faction, LocationId};
use crate::map::MapModel;

/// Price tier a shipment is billed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostTier {
    /// Movement and native deployment
    Free,
    Standard,
    Homeworld,
    OrangeRate,
}

/// Price of one validated event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentCost {
    pub tier: CostTier,
    pub amount: u32,
}

impl ShipmentCost {
    pub const FREE: Self = Self {
        tier: CostTier::Free,
        amount: 0,
    };
}

/// Resolves shipment permissions for a table
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    map: Arc<MapModel>,
    rates: ShipmentRates,
    abilities: Vec<(Faction, FactionAbilities)>,
}

impl PermissionResolver {
    pub fn new(map: Arc<MapModel>, config: &RulesConfig) -> Self {
        let abilities = config
            .factions
            .iter()
            .map(|setup| (setup.faction, setup.abilities))
            .collect();
        Self {
            map,
            rates: config.shipment.clone(),
            abilities,
        }
    }

    pub fn abilities(&self, faction: Faction) -> FactionAbilities {
        self.abilities
            .iter()
            .find(|(f, _)| *f == faction)
            .map(|(_, a)| *a)
            .unwrap_or_default()
    }

    /// Every permission flag that applies to `faction` shipping onto `destination`
    ///
    /// 1. Board-edge destination and a cross-entry ability -> Cross
    /// 2. Destination is the faction's own home-world -> ToHomeworld
    /// 3. Discounted-rate ability -> OrangeRate
    pub fn resolve(&self, faction: Faction, destination: LocationId) -> ShipmentPermission {
        let abilities = self.abilities(faction);
        let mut permissions = ShipmentPermission::NONE;

        if self.map.is_board_edge(destination) && abilities.cross_entry {
            permissions |= ShipmentPermission::CROSS;
        }
        if self.map.is_homeworld_of(destination) == Some(faction) {
            permissions |= ShipmentPermission::TO_HOMEWORLD;
        }
        if abilities.orange_rate {
            permissions |= ShipmentPermission::ORANGE_RATE;
        }

        permissions
    }

    /// Cheapest applicable price for landing `deposits` (location, strength)
    ///
    /// Standard always applies. Homeworld applies when `permissions` hold
    /// ToHomeworld and every deposit lands on one of the faction's own
    /// home-worlds. OrangeRate applies when `permissions` hold it. Ties keep
    /// the earlier tier in that order.
    pub fn quote(
        &self,
        faction: Faction,
        permissions: ShipmentPermission,
        deposits: &[(LocationId, u32)],
    ) -> ShipmentCost {
        let standard: u32 = deposits
            .iter()
            .map(|(loc, strength)| {
                let rate = if self.map.location(*loc).stronghold {
                    self.rates.stronghold_rate
                } else {
                    self.rates.standard_rate
                };
                rate.saturating_mul(*strength)
            })
            .fold(0u32, u32::saturating_add);
        let total = deposits
            .iter()
            .fold(0u32, |acc, (_, strength)| acc.saturating_add(*strength));

        let mut best = ShipmentCost {
            tier: CostTier::Standard,
            amount: standard,
        };

        let all_home = !deposits.is_empty()
            && deposits
                .iter()
                .all(|(loc, _)| self.map.is_homeworld_of(*loc) == Some(faction));
        if permissions.contains(ShipmentPermission::TO_HOMEWORLD) && all_home {
            let amount = self.rates.homeworld_rate.saturating_mul(total);
            if amount < best.amount {
                best = ShipmentCost {
                    tier: CostTier::Homeworld,
                    amount,
                };
            }
        }

        if permissions.contains(ShipmentPermission::ORANGE_RATE) {
            let amount = standard.div_ceil(self.rates.orange_rate_divisor);
            if amount < best.amount {
                best = ShipmentCost {
                    tier: CostTier::OrangeRate,
                    amount,
                };
            }
        }

        best
    }
}
