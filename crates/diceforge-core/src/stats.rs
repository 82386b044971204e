//! Actor attributes.
//!
//! Every actor carries four independent stats. [`StatKind`] names one of them
//! and [`Attributes`] stores a full set, either as base values or as a bonus
//! layer that is added on top (temporary effects, queued bonus groups, gear).
//!
//! # Example
//!
//! ```
//! use diceforge_core::stats::{Attributes, StatKind};
//!
//! let base = Attributes::new(10, 4, 7, 21);
//! let mut bonus = Attributes::default();
//! bonus.add_stat(StatKind::Strength, 3);
//!
//! let effective = base + bonus;
//! assert_eq!(effective.get(StatKind::Strength), 13);
//! assert_eq!(effective.get(StatKind::Intelligence), 21);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// One of the four actor attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    /// Primary offensive attribute; feeds damage.
    Strength,
    /// Agility.
    Agility,
    /// Drives the combo amplifier curve and heal strength.
    Technique,
    /// Converted into a flat roll bonus.
    Intelligence,
}

impl StatKind {
    /// All attributes in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Strength,
        Self::Agility,
        Self::Technique,
        Self::Intelligence,
    ];
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strength => write!(f, "STR"),
            Self::Agility => write!(f, "AGI"),
            Self::Technique => write!(f, "TEC"),
            Self::Intelligence => write!(f, "INT"),
        }
    }
}

/// A full set of attribute values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    /// Strength.
    pub strength: i32,
    /// Agility.
    pub agility: i32,
    /// Technique.
    pub technique: i32,
    /// Intelligence.
    pub intelligence: i32,
}

impl Attributes {
    /// Creates a set of attributes.
    #[must_use]
    pub const fn new(strength: i32, agility: i32, technique: i32, intelligence: i32) -> Self {
        Self {
            strength,
            agility,
            technique,
            intelligence,
        }
    }

    /// Returns the value of one attribute.
    #[must_use]
    pub const fn get(&self, stat: StatKind) -> i32 {
        match stat {
            StatKind::Strength => self.strength,
            StatKind::Agility => self.agility,
            StatKind::Technique => self.technique,
            StatKind::Intelligence => self.intelligence,
        }
    }

    /// Overwrites one attribute.
    pub fn set(&mut self, stat: StatKind, value: i32) {
        *self.slot_mut(stat) = value;
    }

    /// Adds to one attribute, saturating at the `i32` bounds.
    pub fn add_stat(&mut self, stat: StatKind, amount: i32) {
        let slot = self.slot_mut(stat);
        *slot = slot.saturating_add(amount);
    }

    /// Returns `true` if every attribute is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.strength == 0 && self.agility == 0 && self.technique == 0 && self.intelligence == 0
    }

    fn slot_mut(&mut self, stat: StatKind) -> &mut i32 {
        match stat {
            StatKind::Strength => &mut self.strength,
            StatKind::Agility => &mut self.agility,
            StatKind::Technique => &mut self.technique,
            StatKind::Intelligence => &mut self.intelligence,
        }
    }
}

impl Add for Attributes {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Attributes {
    fn add_assign(&mut self, rhs: Self) {
        for stat in StatKind::ALL {
            self.add_stat(stat, rhs.get(stat));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_each_stat() {
        let mut attrs = Attributes::default();
        for (i, stat) in StatKind::ALL.into_iter().enumerate() {
            let value = i32::try_from(i).unwrap() + 1;
            attrs.set(stat, value);
            assert_eq!(attrs.get(stat), value);
        }
        assert_eq!(attrs, Attributes::new(1, 2, 3, 4));
    }

    #[test]
    fn add_saturates() {
        let mut attrs = Attributes::new(i32::MAX, 0, 0, 0);
        attrs.add_stat(StatKind::Strength, 10);
        assert_eq!(attrs.strength, i32::MAX);
    }

    #[test]
    fn sum_of_layers() {
        let total = Attributes::new(1, 2, 3, 4) + Attributes::new(10, 0, -3, 6);
        assert_eq!(total, Attributes::new(11, 2, 0, 10));
        assert!(Attributes::default().is_zero());
        assert!(!total.is_zero());
    }

    #[test]
    fn display_uses_short_names() {
        assert_eq!(StatKind::Technique.to_string(), "TEC");
        assert_eq!(StatKind::Intelligence.to_string(), "INT");
    }
}
