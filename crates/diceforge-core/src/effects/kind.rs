//! Effect identifiers, requests and stored state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::{Attributes, StatKind};

/// Key of an entry in the status-effect registry.
///
/// At most one entry per kind exists at a time; stacking rules decide how a
/// new application merges into an existing one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Actor cannot act.
    Stun,
    /// Outgoing damage is scaled down.
    Weaken,
    /// Subtracted from the actor's own rolls.
    RollPenalty,
    /// Subtracted from rolls made against the actor.
    EnemyRollPenalty,
    /// Fraction of incoming damage ignored, decaying per turn.
    DamageReduction,
    /// Time-ticked damage over time (bleed is poison with a flag).
    Poison,
    /// Time-ticked damage over time.
    Burn,
    /// Temporary attribute bonuses sharing one duration.
    StatBonus,
    /// Scales combo amplification.
    ComboAmplifier,
    /// Shortens effective action length.
    LengthReduction,
    /// Lowers the combo threshold, consumed per roll.
    TempComboBonus,
    /// Added to the roll total, consumed per roll.
    TempRollBonus,
    /// Halves the next incoming hit.
    Shield,
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stun => "stun",
            Self::Weaken => "weaken",
            Self::RollPenalty => "roll penalty",
            Self::EnemyRollPenalty => "enemy roll penalty",
            Self::DamageReduction => "damage reduction",
            Self::Poison => "poison",
            Self::Burn => "burn",
            Self::StatBonus => "stat bonus",
            Self::ComboAmplifier => "combo amplifier",
            Self::LengthReduction => "length reduction",
            Self::TempComboBonus => "temporary combo bonus",
            Self::TempRollBonus => "temporary roll bonus",
            Self::Shield => "shield",
        };
        f.write_str(name)
    }
}

/// A request to apply an effect.
///
/// Durations, stacks and uses are signed so that malformed input can be
/// represented and rejected at the registry boundary instead of wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Stun for `turns`.
    Stun {
        /// Duration in turns.
        turns: i32,
    },
    /// Weaken for `turns`.
    Weaken {
        /// Duration in turns.
        turns: i32,
    },
    /// Penalise the actor's own rolls.
    RollPenalty {
        /// Amount subtracted from each roll.
        amount: i32,
        /// Duration in turns.
        turns: i32,
    },
    /// Penalise rolls made against the actor.
    EnemyRollPenalty {
        /// Amount subtracted from opposing rolls.
        amount: i32,
        /// Duration in turns.
        turns: i32,
    },
    /// Ignore a fraction of incoming damage.
    DamageReduction {
        /// Fraction in `[0, 1]`.
        fraction: f64,
    },
    /// Add poison stacks. Bleeds are poison with `bleeding` set.
    Poison {
        /// Damage per stack per tick.
        damage: i32,
        /// Stacks to add.
        stacks: i32,
        /// Marks the poison as a bleed.
        bleeding: bool,
    },
    /// Add burn stacks.
    Burn {
        /// Damage per stack per tick.
        damage: i32,
        /// Stacks to add.
        stacks: i32,
    },
    /// Temporarily raise one attribute.
    StatBonus {
        /// Attribute to raise.
        stat: StatKind,
        /// Bonus amount.
        amount: i32,
        /// Shared duration in turns.
        turns: i32,
    },
    /// Scale combo amplification.
    ComboAmplifier {
        /// Multiplier applied to the combo amplification.
        multiplier: f64,
        /// Duration in turns.
        turns: i32,
    },
    /// Shorten actions.
    LengthReduction {
        /// Fraction of length removed, in `[0, 1]`.
        fraction: f64,
        /// Duration in turns.
        turns: i32,
    },
    /// Lower the combo threshold for the next rolls.
    TempComboBonus {
        /// Threshold reduction.
        amount: i32,
        /// Rolls that consume it.
        uses: i32,
    },
    /// Add to the next rolls.
    TempRollBonus {
        /// Roll bonus.
        amount: i32,
        /// Rolls that consume it.
        uses: i32,
    },
    /// Halve the next incoming hit.
    Shield,
}

impl Effect {
    /// Registry slot this request targets.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        match self {
            Self::Stun { .. } => EffectKind::Stun,
            Self::Weaken { .. } => EffectKind::Weaken,
            Self::RollPenalty { .. } => EffectKind::RollPenalty,
            Self::EnemyRollPenalty { .. } => EffectKind::EnemyRollPenalty,
            Self::DamageReduction { .. } => EffectKind::DamageReduction,
            Self::Poison { .. } => EffectKind::Poison,
            Self::Burn { .. } => EffectKind::Burn,
            Self::StatBonus { .. } => EffectKind::StatBonus,
            Self::ComboAmplifier { .. } => EffectKind::ComboAmplifier,
            Self::LengthReduction { .. } => EffectKind::LengthReduction,
            Self::TempComboBonus { .. } => EffectKind::TempComboBonus,
            Self::TempRollBonus { .. } => EffectKind::TempRollBonus,
            Self::Shield => EffectKind::Shield,
        }
    }
}

/// Poison or burn state.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotState {
    /// Remaining stacks. Never zero while stored.
    pub stacks: u32,
    /// Damage per stack. Never zero while stored.
    pub damage: u32,
    /// Game time of the last tick or application.
    pub last_tick: f64,
    /// Poison applied as a bleed.
    pub bleeding: bool,
}

impl DotState {
    /// Damage the next tick would deal.
    #[must_use]
    pub const fn pending_damage(&self) -> u32 {
        self.stacks.saturating_mul(self.damage)
    }
}

/// Stored state of an active effect.
///
/// An entry only exists while it has a nonzero magnitude and remaining
/// duration; expiry removes it from the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectState {
    /// Flag with a turn counter (stun, weaken).
    Timed {
        /// Turns remaining.
        turns: u32,
    },
    /// Signed amount with a turn counter (roll penalties).
    Penalty {
        /// Amount subtracted.
        amount: i32,
        /// Turns remaining.
        turns: u32,
    },
    /// Fraction that decays per turn (damage reduction).
    Decaying {
        /// Current fraction.
        fraction: f64,
    },
    /// Scalar with a turn counter (combo amplifier, length reduction).
    Scaled {
        /// Current value.
        value: f64,
        /// Turns remaining.
        turns: u32,
    },
    /// Attribute bonuses sharing one counter.
    Stats {
        /// Bonus per attribute.
        bonus: Attributes,
        /// Turns remaining.
        turns: u32,
    },
    /// Time-ticked stacks.
    DamageOverTime(DotState),
    /// Bonus consumed per roll.
    Charged {
        /// Bonus amount.
        amount: i32,
        /// Rolls remaining.
        uses: u32,
    },
    /// One-shot shield.
    Armed,
}

impl EffectState {
    /// Remaining turns for turn-gated states.
    #[must_use]
    pub const fn turns(&self) -> Option<u32> {
        match self {
            Self::Timed { turns }
            | Self::Penalty { turns, .. }
            | Self::Scaled { turns, .. }
            | Self::Stats { turns, .. } => Some(*turns),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_maps_to_kind() {
        assert_eq!(Effect::Shield.kind(), EffectKind::Shield);
        assert_eq!(
            Effect::Poison {
                damage: 1,
                stacks: 1,
                bleeding: true
            }
            .kind(),
            EffectKind::Poison
        );
        assert_eq!(
            Effect::StatBonus {
                stat: StatKind::Agility,
                amount: 2,
                turns: 1
            }
            .kind(),
            EffectKind::StatBonus
        );
    }

    #[test]
    fn dot_pending_damage() {
        let dot = DotState {
            stacks: 3,
            damage: 4,
            last_tick: 0.0,
            bleeding: false,
        };
        assert_eq!(dot.pending_damage(), 12);
    }

    #[test]
    fn effect_json_shape() {
        let json = serde_json::to_string(&Effect::Stun { turns: 2 }).unwrap();
        assert_eq!(json, r#"{"Stun":{"turns":2}}"#);
        let shield: Effect = serde_json::from_str(r#""Shield""#).unwrap();
        assert_eq!(shield, Effect::Shield);
    }
}
