//! Damage composition.
//!
//! Stages run in a fixed order so results are reproducible:
//!
//! 1. attribute + weapon damage + flat equipment and modification damage
//! 2. plus the roll bonus
//! 3. times the action multiplier
//! 4. times the combo amplification
//! 5. times the external and modification multipliers (pre-mitigation value)
//! 6. times the weaken multiplier if the attacker is weakened
//! 7. minus target armor, then times `1 - damage_reduction`
//! 8. floored at zero; a target shield then applies `floor(d * factor)`
//! 9. at least 1 if the pre-mitigation value was positive
//!
//! The only side effect is shield consumption in
//! [`DamageCalculator::compute`]; [`DamageCalculator::preview`] is pure.
//!
//! # Example
//!
//! ```
//! use diceforge_core::damage::{DamageCalculator, DamageInput};
//! use diceforge_core::effects::StatusEffectRegistry;
//! use diceforge_core::equipment::{GearStat, Loadout};
//!
//! let sword = Loadout::new().with_bonus(GearStat::WeaponDamage, 5);
//! let plate = Loadout::new().with_armor_piece(3);
//! let mut target = StatusEffectRegistry::new();
//!
//! let report = DamageCalculator::default().compute(
//!     &DamageInput::new(10, &sword),
//!     &mut target,
//!     &plate,
//! );
//! assert_eq!(report.damage, 12);
//! ```

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::DamageTuning;
use crate::effects::StatusEffectRegistry;
use crate::equipment::{EquipmentBonusProvider, GearStat};

/// Attacker-side inputs.
#[derive(Clone, Copy)]
pub struct DamageInput<'a> {
    /// Effective offensive attribute (strength).
    pub attribute: i32,
    /// Attacker gear.
    pub gear: &'a dyn EquipmentBonusProvider,
    /// Attacker is weakened.
    pub weakened: bool,
    /// Executed action, if any.
    pub action: Option<&'a Action>,
    /// Combo amplification for the executed slot.
    pub combo_amplification: f64,
    /// Difficulty or settings scalar.
    pub external_multiplier: f64,
    /// Roll bonus fed into damage.
    pub roll_bonus: i32,
}

impl<'a> DamageInput<'a> {
    /// Neutral input: no action, amplification and multiplier 1.0, no bonus.
    #[must_use]
    pub fn new(attribute: i32, gear: &'a dyn EquipmentBonusProvider) -> Self {
        Self {
            attribute,
            gear,
            weakened: false,
            action: None,
            combo_amplification: 1.0,
            external_multiplier: 1.0,
            roll_bonus: 0,
        }
    }

    /// Sets the executed action.
    #[must_use]
    pub fn with_action(mut self, action: &'a Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the combo amplification.
    #[must_use]
    pub fn with_amplification(mut self, amplification: f64) -> Self {
        self.combo_amplification = amplification;
        self
    }

    /// Sets the external multiplier.
    #[must_use]
    pub fn with_external_multiplier(mut self, multiplier: f64) -> Self {
        self.external_multiplier = multiplier;
        self
    }

    /// Sets the roll bonus.
    #[must_use]
    pub fn with_roll_bonus(mut self, roll_bonus: i32) -> Self {
        self.roll_bonus = roll_bonus;
        self
    }

    /// Marks the attacker as weakened.
    #[must_use]
    pub fn weakened(mut self, weakened: bool) -> Self {
        self.weakened = weakened;
        self
    }
}

/// How a hit was computed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    /// Damage after all multipliers, before weaken and mitigation.
    pub pre_mitigation: f64,
    /// Armor subtracted.
    pub armor: i32,
    /// Damage reduction fraction applied.
    pub reduction: f64,
    /// Weaken scaled the hit.
    pub weakened: bool,
    /// A shield absorbed part of the hit.
    pub shielded: bool,
    /// Final damage.
    pub damage: u32,
}

/// Computes hit damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageCalculator {
    weaken_multiplier: f64,
    shield_factor: f64,
}

impl Default for DamageCalculator {
    fn default() -> Self {
        Self::from_tuning(&DamageTuning::default())
    }
}

impl DamageCalculator {
    /// Creates a calculator from damage tuning.
    #[must_use]
    pub fn from_tuning(tuning: &DamageTuning) -> Self {
        Self {
            weaken_multiplier: tuning.weaken_multiplier,
            shield_factor: tuning.shield_factor,
        }
    }

    /// Computes damage and consumes the target's shield if one was armed.
    pub fn compute(
        &self,
        input: &DamageInput<'_>,
        target: &mut StatusEffectRegistry,
        target_gear: &dyn EquipmentBonusProvider,
    ) -> DamageReport {
        let report = self.preview(input, target, target_gear);
        if report.shielded {
            target.consume_shield();
        }
        report
    }

    /// Computes damage without consuming anything.
    #[must_use]
    pub fn preview(
        &self,
        input: &DamageInput<'_>,
        target: &StatusEffectRegistry,
        target_gear: &dyn EquipmentBonusProvider,
    ) -> DamageReport {
        let gear = input.gear;
        let flat = input
            .attribute
            .saturating_add(gear.stat_bonus(GearStat::WeaponDamage))
            .saturating_add(gear.stat_bonus(GearStat::DamageBonus))
            .saturating_add(gear.stat_bonus(GearStat::ModificationDamage))
            .saturating_add(input.roll_bonus);

        let action_multiplier = input.action.map_or(1.0, |action| action.damage_multiplier);
        let pre_mitigation = f64::from(flat)
            * action_multiplier
            * input.combo_amplification
            * input.external_multiplier
            * gear.modification_damage_multiplier();

        let mut damage = pre_mitigation;
        if input.weakened {
            damage *= self.weaken_multiplier;
        }

        let armor = target_gear
            .total_armor()
            .saturating_add(target_gear.stat_bonus(GearStat::ArmorBonus));
        let reduction = target.damage_reduction();
        damage = (damage - f64::from(armor)) * (1.0 - reduction);

        let mut dealt = to_points(damage);
        let shielded = target.has_shield();
        if shielded {
            dealt = to_points(f64::from(dealt) * self.shield_factor);
        }
        if pre_mitigation > 0.0 {
            dealt = dealt.max(1);
        }

        DamageReport {
            pre_mitigation,
            armor,
            reduction,
            weakened: input.weakened,
            shielded,
            damage: dealt,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_points(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        value.floor().min(f64::from(u32::MAX)) as u32
    }
}
