//! Equipment bonus queries.
//!
//! The combat core never owns or mutates gear. It asks an
//! [`EquipmentBonusProvider`] for the numbers it needs while resolving an
//! action. [`Loadout`] is a plain-data provider suitable for tests, tools and
//! callers that flatten their inventory up front.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::StatKind;

/// A bonus that gear can provide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GearStat {
    /// Strength bonus.
    Strength,
    /// Agility bonus.
    Agility,
    /// Technique bonus.
    Technique,
    /// Intelligence bonus.
    Intelligence,
    /// Weapon base damage.
    WeaponDamage,
    /// Flat damage from equipment.
    DamageBonus,
    /// Flat damage from modifications.
    ModificationDamage,
    /// Roll bonus from equipment.
    RollBonus,
    /// Roll bonus from modifications.
    ModificationRollBonus,
    /// Flat armor on top of armor pieces.
    ArmorBonus,
}

impl From<StatKind> for GearStat {
    fn from(stat: StatKind) -> Self {
        match stat {
            StatKind::Strength => Self::Strength,
            StatKind::Agility => Self::Agility,
            StatKind::Technique => Self::Technique,
            StatKind::Intelligence => Self::Intelligence,
        }
    }
}

/// Read-only view of an actor's equipped gear.
pub trait EquipmentBonusProvider {
    /// Summed bonus of one kind.
    fn stat_bonus(&self, stat: GearStat) -> i32;

    /// Sum of equipped armor pieces.
    fn total_armor(&self) -> i32;

    /// Damage multiplier from modifications.
    fn modification_damage_multiplier(&self) -> f64 {
        1.0
    }

    /// Fraction of dealt damage returned as healing.
    fn modification_lifesteal(&self) -> f64 {
        0.0
    }

    /// Failed rolls are promoted to basic actions.
    fn has_auto_success(&self) -> bool {
        false
    }

    /// Reroll charges granted for a whole fight.
    fn reroll_charges(&self) -> u32 {
        0
    }
}

/// Provider for an actor with nothing equipped.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Unequipped;

impl EquipmentBonusProvider for Unequipped {
    fn stat_bonus(&self, _stat: GearStat) -> i32 {
        0
    }

    fn total_armor(&self) -> i32 {
        0
    }
}

/// Flattened gear bonuses.
///
/// ```
/// use diceforge_core::equipment::{EquipmentBonusProvider, GearStat, Loadout};
///
/// let gear = Loadout::new()
///     .with_bonus(GearStat::WeaponDamage, 5)
///     .with_armor_piece(2)
///     .with_armor_piece(1)
///     .with_bonus(GearStat::ArmorBonus, 1);
///
/// assert_eq!(gear.stat_bonus(GearStat::WeaponDamage), 5);
/// assert_eq!(gear.total_armor(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loadout {
    /// Summed bonuses by kind.
    pub bonuses: BTreeMap<GearStat, i32>,
    /// Armor values of individual pieces.
    pub armor_pieces: Vec<i32>,
    /// Modification damage multiplier.
    pub damage_multiplier: f64,
    /// Modification lifesteal fraction.
    pub lifesteal: f64,
    /// Promotes failed rolls to basic.
    pub auto_success: bool,
    /// Reroll charges per fight.
    pub reroll_charges: u32,
}

impl Default for Loadout {
    fn default() -> Self {
        Self {
            bonuses: BTreeMap::new(),
            armor_pieces: Vec::new(),
            damage_multiplier: 1.0,
            lifesteal: 0.0,
            auto_success: false,
            reroll_charges: 0,
        }
    }
}

impl Loadout {
    /// Creates an empty loadout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to a bonus.
    #[must_use]
    pub fn with_bonus(mut self, stat: GearStat, amount: i32) -> Self {
        let bonus = self.bonuses.entry(stat).or_insert(0);
        *bonus = bonus.saturating_add(amount);
        self
    }

    /// Adds an armor piece.
    #[must_use]
    pub fn with_armor_piece(mut self, armor: i32) -> Self {
        self.armor_pieces.push(armor);
        self
    }

    /// Sets the modification damage multiplier.
    #[must_use]
    pub fn with_damage_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    /// Sets the lifesteal fraction.
    #[must_use]
    pub fn with_lifesteal(mut self, lifesteal: f64) -> Self {
        self.lifesteal = lifesteal;
        self
    }

    /// Enables auto-success.
    #[must_use]
    pub fn with_auto_success(mut self) -> Self {
        self.auto_success = true;
        self
    }

    /// Sets reroll charges per fight.
    #[must_use]
    pub fn with_reroll_charges(mut self, charges: u32) -> Self {
        self.reroll_charges = charges;
        self
    }
}

impl EquipmentBonusProvider for Loadout {
    fn stat_bonus(&self, stat: GearStat) -> i32 {
        self.bonuses.get(&stat).copied().unwrap_or(0)
    }

    fn total_armor(&self) -> i32 {
        self.armor_pieces
            .iter()
            .fold(0_i32, |total, piece| total.saturating_add(*piece))
    }

    fn modification_damage_multiplier(&self) -> f64 {
        self.damage_multiplier
    }

    fn modification_lifesteal(&self) -> f64 {
        self.lifesteal
    }

    fn has_auto_success(&self) -> bool {
        self.auto_success
    }

    fn reroll_charges(&self) -> u32 {
        self.reroll_charges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unequipped_is_neutral() {
        let gear = Unequipped;
        assert_eq!(gear.stat_bonus(GearStat::RollBonus), 0);
        assert_eq!(gear.total_armor(), 0);
        assert_eq!(gear.modification_damage_multiplier(), 1.0);
        assert_eq!(gear.modification_lifesteal(), 0.0);
        assert!(!gear.has_auto_success());
        assert_eq!(gear.reroll_charges(), 0);
    }

    #[test]
    fn bonuses_accumulate() {
        let gear = Loadout::new()
            .with_bonus(GearStat::Strength, 2)
            .with_bonus(GearStat::Strength, 3);
        assert_eq!(gear.stat_bonus(GearStat::Strength), 5);
        assert_eq!(gear.stat_bonus(StatKind::Strength.into()), 5);
        assert_eq!(gear.stat_bonus(GearStat::Agility), 0);
    }

    #[test]
    fn extreme_values_saturate() {
        let gear = Loadout::new()
            .with_bonus(GearStat::WeaponDamage, i32::MAX)
            .with_bonus(GearStat::WeaponDamage, 10)
            .with_armor_piece(i32::MAX)
            .with_armor_piece(i32::MAX)
            .with_bonus(GearStat::RollBonus, i32::MIN)
            .with_bonus(GearStat::RollBonus, -1);
        assert_eq!(gear.stat_bonus(GearStat::WeaponDamage), i32::MAX);
        assert_eq!(gear.total_armor(), i32::MAX);
        assert_eq!(gear.stat_bonus(GearStat::RollBonus), i32::MIN);
    }

    #[test]
    fn default_multiplier_is_neutral() {
        assert_eq!(Loadout::default().modification_damage_multiplier(), 1.0);
    }

    #[test]
    fn json_roundtrip_and_partial_load() {
        let gear = Loadout::new()
            .with_bonus(GearStat::RollBonus, 2)
            .with_armor_piece(4)
            .with_lifesteal(0.25)
            .with_reroll_charges(1);
        let json = serde_json::to_string(&gear).unwrap();
        let restored: Loadout = serde_json::from_str(&json).unwrap();
        assert_eq!(gear, restored);

        let partial: Loadout = serde_json::from_str(r#"{ "auto_success": true }"#).unwrap();
        assert!(partial.has_auto_success());
        assert_eq!(partial.damage_multiplier, 1.0);
    }
}
