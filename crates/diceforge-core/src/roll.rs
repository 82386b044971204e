//! Roll resolution.
//!
//! A d20 is rolled, the aggregated bonus is added and the total falls into
//! one of three tiers:
//!
//! | Total                  | Tier    | Effect on combo          |
//! |------------------------|---------|--------------------------|
//! | `<= fail_max`          | Fail    | resets, nothing resolves |
//! | `<= basic_max`         | Basic   | resets, basic action     |
//! | `> basic_max`          | Combo   | current slot, advances   |
//!
//! With the shipped [`RollBands`] this is 1-5 / 6-15 / 16-20. A natural
//! roll at or above `critical` is always Combo. A temporary or queued combo
//! bonus lowers the Combo threshold for that roll only.
//!
//! # Example
//!
//! ```
//! use diceforge_core::config::RollBands;
//! use diceforge_core::roll::{RollBreakdown, RollResolver, RollTier};
//!
//! let resolver = RollResolver::new(RollBands::default(), 10);
//! let none = RollBreakdown::default();
//! assert_eq!(resolver.classify(5, &none, false).0, RollTier::Fail);
//! assert_eq!(resolver.classify(9, &none, false).0, RollTier::Basic);
//! assert_eq!(resolver.classify(16, &none, false).0, RollTier::Combo);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::{CombatConfig, RollBands};
use crate::dice::DieRoller;
use crate::effects::{BonusTotals, StatusEffectRegistry};
use crate::equipment::{EquipmentBonusProvider, GearStat};

/// Outcome class of a roll.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RollTier {
    /// Nothing resolves.
    Fail,
    /// A fixed, non-combo action resolves.
    Basic,
    /// The current combo slot resolves.
    Combo,
}

impl RollTier {
    /// Returns `true` for Basic and Combo.
    #[must_use]
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Fail)
    }
}

impl fmt::Display for RollTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fail => "fail",
            Self::Basic => "basic",
            Self::Combo => "combo",
        };
        f.write_str(name)
    }
}

/// Every term that went into a roll total.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollBreakdown {
    /// Intelligence divided by the configured ratio.
    pub intelligence: i32,
    /// Equipment roll bonus.
    pub equipment: i32,
    /// Modification roll bonus.
    pub modification: i32,
    /// Temporary roll bonus spent on this roll.
    pub temporary: i32,
    /// Accuracy from queued bonus groups.
    pub queued: i32,
    /// The roller's own penalty.
    pub penalty: i32,
    /// Penalty imposed by the opponent.
    pub enemy_penalty: i32,
    /// Reduction of the Combo threshold.
    pub combo_bonus: i32,
}

impl RollBreakdown {
    /// Net modifier added to the natural roll.
    ///
    /// `combo_bonus` shifts the threshold, not the total, and is excluded.
    #[must_use]
    pub fn total_bonus(&self) -> i32 {
        self.intelligence
            .saturating_add(self.equipment)
            .saturating_add(self.modification)
            .saturating_add(self.temporary)
            .saturating_add(self.queued)
            .saturating_sub(self.penalty)
            .saturating_sub(self.enemy_penalty)
    }
}

/// Result of one roll.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    /// Face shown by the die.
    pub natural: u32,
    /// Natural roll plus the net bonus.
    pub total: i32,
    /// Resulting tier.
    pub tier: RollTier,
    /// Bonus terms.
    pub breakdown: RollBreakdown,
    /// Natural roll reached the critical face.
    pub critical: bool,
    /// A Fail was promoted to Basic by gear.
    pub auto_success: bool,
    /// A reroll charge was spent.
    pub rerolled: bool,
}

/// Inputs to a roll that come from outside the roller's registry.
#[derive(Clone, Copy)]
pub struct RollInput<'a> {
    /// Effective intelligence.
    pub intelligence: i32,
    /// The roller's gear.
    pub gear: &'a dyn EquipmentBonusProvider,
    /// Penalty the opponent imposes on this roll.
    pub enemy_penalty: i32,
    /// Totals of the front queued bonus groups.
    pub queued: BonusTotals,
}

/// Turns dice and bonuses into a [`RollTier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollResolver {
    bands: RollBands,
    intelligence_ratio: i32,
}

impl Default for RollResolver {
    fn default() -> Self {
        Self::from_config(&CombatConfig::default())
    }
}

impl RollResolver {
    /// Creates a resolver. A ratio below 1 is treated as 1.
    #[must_use]
    pub fn new(bands: RollBands, intelligence_ratio: i32) -> Self {
        Self {
            bands,
            intelligence_ratio: intelligence_ratio.max(1),
        }
    }

    /// Creates a resolver from the roll and attribute sections of `config`.
    #[must_use]
    pub fn from_config(config: &CombatConfig) -> Self {
        Self::new(config.rolls, config.attributes.intelligence_per_roll_bonus)
    }

    /// Tier thresholds.
    #[must_use]
    pub const fn bands(&self) -> &RollBands {
        &self.bands
    }

    /// Roll bonus granted by `intelligence`.
    #[must_use]
    pub fn intelligence_bonus(&self, intelligence: i32) -> i32 {
        intelligence.max(0) / self.intelligence_ratio
    }

    /// Classifies a natural roll, returning the tier and the total.
    ///
    /// `auto_success` promotes Fail to Basic.
    #[must_use]
    pub fn classify(
        &self,
        natural: u32,
        breakdown: &RollBreakdown,
        auto_success: bool,
    ) -> (RollTier, i32) {
        let natural_value = i32::try_from(natural).unwrap_or(i32::MAX);
        let total = natural_value.saturating_add(breakdown.total_bonus());

        let tier = if natural >= self.bands.critical {
            RollTier::Combo
        } else if total <= self.bands.fail_max {
            if auto_success {
                RollTier::Basic
            } else {
                RollTier::Fail
            }
        } else if total.saturating_add(breakdown.combo_bonus) > self.bands.basic_max {
            RollTier::Combo
        } else {
            RollTier::Basic
        };
        (tier, total)
    }

    /// Rolls for an actor whose effects are `effects`.
    ///
    /// Returns `None` without touching the dice or any effect if the actor is
    /// stunned. Otherwise spends one use of the temporary roll and combo
    /// bonuses, and on a Fail spends a reroll charge if one is available.
    pub fn resolve<R: DieRoller + ?Sized>(
        &self,
        dice: &mut R,
        effects: &mut StatusEffectRegistry,
        input: &RollInput<'_>,
    ) -> Option<RollOutcome> {
        if effects.is_stunned() {
            debug!("roll skipped: stunned");
            return None;
        }

        let breakdown = RollBreakdown {
            intelligence: self.intelligence_bonus(input.intelligence),
            equipment: input.gear.stat_bonus(GearStat::RollBonus),
            modification: input.gear.stat_bonus(GearStat::ModificationRollBonus),
            temporary: effects.consume_temp_roll_bonus(),
            queued: input.queued.accuracy,
            penalty: effects.roll_penalty(),
            enemy_penalty: input.enemy_penalty,
            combo_bonus: effects
                .consume_temp_combo_bonus()
                .saturating_add(input.queued.combo),
        };
        let auto_success = input.gear.has_auto_success();

        let mut natural = dice.roll_die(self.bands.die_sides);
        let (mut tier, mut total) = self.classify(natural, &breakdown, auto_success);
        let mut rerolled = false;

        if tier == RollTier::Fail && effects.try_use_reroll() {
            natural = dice.roll_die(self.bands.die_sides);
            (tier, total) = self.classify(natural, &breakdown, auto_success);
            rerolled = true;
        }

        let outcome = RollOutcome {
            natural,
            total,
            tier,
            breakdown,
            critical: natural >= self.bands.critical,
            auto_success: auto_success && tier == RollTier::Basic && total <= self.bands.fail_max,
            rerolled,
        };
        debug!(
            natural,
            total,
            tier = %tier,
            critical = outcome.critical,
            rerolled,
            "roll resolved"
        );
        Some(outcome)
    }
}
