//! Force ledger - where every faction's troops sit
//!
//! The ledger is the authoritative record for one game session. It only
//! changes through [`ForceLedger::apply_delta`], which either commits a
//! whole [`ChangeSet`] or leaves the ledger untouched.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::battalion::{Battalion, ForceSlot};
use crate::core::types::{Faction, LocationId};

/// Errors raised by ledger mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{faction} has {available} forces at {slot:?}, cannot remove {requested}")]
    InsufficientForces {
        faction: Faction,
        slot: ForceSlot,
        requested: u32,
        available: u32,
    },
    /// Withdrawals and deposits of a change set must balance exactly
    #[error("Unbalanced change set: withdrew {withdrawn}, deposited {deposited}")]
    Unbalanced { withdrawn: u32, deposited: u32 },
    #[error("Change set for {expected} carries a {found} battalion")]
    FactionMismatch { expected: Faction, found: Faction },
    #[error("Force count of {faction} would overflow")]
    Overflow { faction: Faction },
}

/// A balanced set of moves for one faction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub faction: Faction,
    pub withdrawals: BTreeMap<ForceSlot, Battalion>,
    pub deposits: BTreeMap<ForceSlot, Battalion>,
}

impl ChangeSet {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            withdrawals: BTreeMap::new(),
            deposits: BTreeMap::new(),
        }
    }

    pub fn withdraw(mut self, slot: ForceSlot, battalion: Battalion) -> Self {
        self.withdrawals
            .entry(slot)
            .and_modify(|b| b.merge(&battalion))
            .or_insert(battalion);
        self
    }

    pub fn deposit(mut self, slot: ForceSlot, battalion: Battalion) -> Self {
        self.deposits
            .entry(slot)
            .and_modify(|b| b.merge(&battalion))
            .or_insert(battalion);
        self
    }

    fn sum(entries: &BTreeMap<ForceSlot, Battalion>, faction: Faction) -> Result<Battalion, LedgerError> {
        entries
            .values()
            .try_fold(Battalion::empty(faction), |acc, b| acc.checked_merge(b))
            .ok_or(LedgerError::Overflow { faction })
    }
}

/// Before/after value of one touched ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaEntry {
    pub faction: Faction,
    pub slot: ForceSlot,
    pub before: Battalion,
    pub after: Battalion,
}

/// Record of one committed change set, for logging and broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDelta {
    /// Ledger version after the commit
    pub version: u64,
    pub entries: Vec<DeltaEntry>,
}

impl LedgerDelta {
    pub fn entry(&self, slot: ForceSlot) -> Option<&DeltaEntry> {
        self.entries.iter().find(|e| e.slot == slot)
    }
}

/// One on-map entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub location: LocationId,
    pub battalion: Battalion,
}

/// Ordered, serialisable copy of the whole ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u64,
    pub reserves: BTreeMap<Faction, Battalion>,
    pub on_map: Vec<SnapshotEntry>,
}

/// The force ledger
///
/// Zero policy: on-map entries that reach zero strength are pruned;
/// reserve entries stay for the whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForceLedger {
    reserves: AHashMap<Faction, Battalion>,
    on_map: AHashMap<(Faction, LocationId), Battalion>,
    version: u64,
}

impl ForceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place forces during game setup
    ///
    /// Seeding happens before the first event and does not bump the version.
    pub fn seed(&mut self, slot: ForceSlot, battalion: Battalion) {
        match slot {
            ForceSlot::Reserve => {
                self.reserves
                    .entry(battalion.faction)
                    .and_modify(|b| b.merge(&battalion))
                    .or_insert(battalion);
            }
            ForceSlot::Map(location) => {
                if battalion.is_empty() {
                    return;
                }
                self.on_map
                    .entry((battalion.faction, location))
                    .and_modify(|b| b.merge(&battalion))
                    .or_insert(battalion);
            }
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Strength of a faction at a map location (zero battalion if absent)
    pub fn strength_at(&self, faction: Faction, location: LocationId) -> Battalion {
        self.on_map
            .get(&(faction, location))
            .copied()
            .unwrap_or_else(|| Battalion::empty(faction))
    }

    pub fn reserve_of(&self, faction: Faction) -> Battalion {
        self.reserves
            .get(&faction)
            .copied()
            .unwrap_or_else(|| Battalion::empty(faction))
    }

    pub fn strength_in(&self, faction: Faction, slot: ForceSlot) -> Battalion {
        match slot {
            ForceSlot::Reserve => self.reserve_of(faction),
            ForceSlot::Map(location) => self.strength_at(faction, location),
        }
    }

    /// Reserve plus every map entry of a faction
    ///
    /// Counted in `u64` so a full pool never wraps.
    pub fn total_of(&self, faction: Faction) -> u64 {
        let reserve = self.reserve_of(faction);
        self.on_map
            .iter()
            .filter(|((f, _), _)| *f == faction)
            .map(|(_, b)| b)
            .chain(std::iter::once(&reserve))
            .map(|b| u64::from(b.forces) + u64::from(b.special_forces))
            .sum()
    }

    /// Map entries of a faction, ordered by location
    pub fn entries_for(&self, faction: Faction) -> Vec<(LocationId, Battalion)> {
        let mut entries: Vec<_> = self
            .on_map
            .iter()
            .filter(|((f, _), _)| *f == faction)
            .map(|((_, loc), b)| (*loc, *b))
            .collect();
        entries.sort_by_key(|(loc, _)| *loc);
        entries
    }

    /// Every faction present at a location, ordered by faction
    pub fn occupants(&self, location: LocationId) -> Vec<Battalion> {
        let mut present: Vec<_> = self
            .on_map
            .iter()
            .filter(|((_, loc), _)| *loc == location)
            .map(|(_, b)| *b)
            .collect();
        present.sort_by_key(|b| b.faction);
        present
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let reserves = self.reserves.iter().map(|(f, b)| (*f, *b)).collect();
        let mut on_map: Vec<_> = self
            .on_map
            .iter()
            .map(|((_, location), battalion)| SnapshotEntry {
                location: *location,
                battalion: *battalion,
            })
            .collect();
        on_map.sort_by_key(|e| (e.battalion.faction, e.location));
        LedgerSnapshot {
            version: self.version,
            reserves,
            on_map,
        }
    }

    /// Apply a balanced change set, all or nothing
    ///
    /// 1. Reject battalions of another faction
    /// 2. Reject change sets that create or destroy forces
    /// 3. Stage every withdrawal and deposit against current values
    /// 4. Commit the staged values and bump the version
    pub fn apply_delta(&mut self, changes: &ChangeSet) -> Result<LedgerDelta, LedgerError> {
        let faction = changes.faction;
        if let Some(stray) = changes
            .withdrawals
            .values()
            .chain(changes.deposits.values())
            .find(|b| b.faction != faction)
        {
            return Err(LedgerError::FactionMismatch {
                expected: faction,
                found: stray.faction,
            });
        }

        let withdrawn = ChangeSet::sum(&changes.withdrawals, faction)?;
        let deposited = ChangeSet::sum(&changes.deposits, faction)?;
        if withdrawn != deposited {
            return Err(LedgerError::Unbalanced {
                withdrawn: withdrawn.strength(),
                deposited: deposited.strength(),
            });
        }

        // Stage: slot -> (before, after)
        let mut staged: BTreeMap<ForceSlot, (Battalion, Battalion)> = BTreeMap::new();
        for (slot, amount) in &changes.withdrawals {
            let before = self.strength_in(faction, *slot);
            let after = before
                .checked_sub(amount)
                .ok_or(LedgerError::InsufficientForces {
                    faction,
                    slot: *slot,
                    requested: amount.strength(),
                    available: before.strength(),
                })?;
            staged.insert(*slot, (before, after));
        }
        for (slot, amount) in &changes.deposits {
            let entry = staged.entry(*slot).or_insert_with(|| {
                let current = self.strength_in(faction, *slot);
                (current, current)
            });
            entry.1 = entry
                .1
                .checked_merge(amount)
                .ok_or(LedgerError::Overflow { faction })?;
        }

        // Commit
        let mut entries = Vec::with_capacity(staged.len());
        for (slot, (before, after)) in staged {
            match slot {
                ForceSlot::Reserve => {
                    self.reserves.insert(faction, after);
                }
                ForceSlot::Map(location) if after.is_empty() => {
                    self.on_map.remove(&(faction, location));
                }
                ForceSlot::Map(location) => {
                    self.on_map.insert((faction, location), after);
                }
            }
            entries.push(DeltaEntry {
                faction,
                slot,
                before,
                after,
            });
        }
        self.version += 1;

        Ok(LedgerDelta {
            version: self.version,
            entries,
        })
    }
}
