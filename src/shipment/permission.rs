//! Shipment permission flags
//!
//! A permission set explains why a shipment is legal and which price tier
//! it may use. The numeric values are part of the wire format and must stay
//! stable: `None=0, Cross=1, ToHomeworld=2, OrangeRate=4`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ShipmentPermission(u8);

impl ShipmentPermission {
    pub const NONE: Self = Self(0);
    /// May enter a board-edge location without a prior foothold
    pub const CROSS: Self = Self(1);
    /// May ship straight onto the faction's own home-world
    pub const TO_HOMEWORLD: Self = Self(2);
    /// Qualifies for the discounted per-force rate
    pub const ORANGE_RATE: Self = Self(4);

    const FLAGS: [(Self, &'static str); 3] = [
        (Self::CROSS, "Cross"),
        (Self::TO_HOMEWORLD, "ToHomeworld"),
        (Self::ORANGE_RATE, "OrangeRate"),
    ];
    const KNOWN_BITS: u8 = 0b111;

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits, None if an unknown bit is set
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::KNOWN_BITS == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Iterate over the individual flags that are set
    pub fn iter(self) -> impl Iterator<Item = Self> {
        Self::FLAGS
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(flag, _)| flag)
    }
}

impl BitOr for ShipmentPermission {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShipmentPermission {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ShipmentPermission {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl TryFrom<u8> for ShipmentPermission {
    type Error = String;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits).ok_or_else(|| format!("Unknown shipment permission bits: {:#04b}", bits))
    }
}

impl From<ShipmentPermission> for u8 {
    fn from(permission: ShipmentPermission) -> u8 {
        permission.0
    }
}

impl fmt::Debug for ShipmentPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<_> = Self::FLAGS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}
