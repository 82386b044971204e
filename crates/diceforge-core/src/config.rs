//! Tunable combat constants.
//!
//! [`CombatConfig`] gathers every balance knob the combat core reads: roll
//! bands, the combo amplifier curve, effect timing, damage factors, default
//! infliction strengths and attribute ratios. All sections implement
//! [`Default`] with the shipped balance and deserialize with
//! `#[serde(default)]`, so a JSON file only needs the keys it overrides.
//!
//! # Example
//!
//! ```
//! use diceforge_core::config::CombatConfig;
//!
//! let config = CombatConfig::from_json(r#"{ "rolls": { "basic_max": 13 } }"#).unwrap();
//! assert_eq!(config.rolls.fail_max, 5);
//! assert_eq!(config.rolls.basic_max, 13);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while loading or validating a [`CombatConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse combat config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Roll bands are not strictly increasing within the die range.
    #[error(
        "roll bands must satisfy 0 < fail_max < basic_max < critical <= die_sides \
         (got fail_max={fail_max}, basic_max={basic_max}, critical={critical}, die_sides={die_sides})"
    )]
    InvalidRollBands {
        /// Highest total that fails.
        fail_max: i32,
        /// Highest total that yields a basic action.
        basic_max: i32,
        /// Natural roll treated as critical.
        critical: u32,
        /// Number of die faces.
        die_sides: u32,
    },

    /// The combo curve needs room above technique 5.
    #[error("combo curve max_tech must be greater than 5 (got {0})")]
    InvalidMaxTech(i32),

    /// A value that must be finite and strictly positive was not.
    #[error("{field} must be finite and positive (got {value})")]
    NotPositive {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A fraction fell outside `[0, 1]`.
    #[error("{field} must lie in [0, 1] (got {value})")]
    OutOfUnitRange {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The intelligence ratio would divide by zero.
    #[error("intelligence_per_roll_bonus must be at least 1 (got {0})")]
    InvalidIntelligenceRatio(i32),
}

// =============================================================================
// Sections
// =============================================================================

/// Thresholds that turn a roll total into a tier.
///
/// Totals up to `fail_max` fail, totals up to `basic_max` resolve a basic
/// action and anything above is a combo. A natural roll of `critical` or more
/// is always a combo regardless of modifiers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollBands {
    /// Highest total that fails.
    pub fail_max: i32,
    /// Highest total that resolves a basic action.
    pub basic_max: i32,
    /// Natural roll that always combos.
    pub critical: u32,
    /// Faces on the action die.
    pub die_sides: u32,
}

impl Default for RollBands {
    fn default() -> Self {
        Self {
            fail_max: 5,
            basic_max: 15,
            critical: 20,
            die_sides: 20,
        }
    }
}

/// Piecewise-linear combo amplifier keyed by technique.
///
/// Technique is clamped to `[1, max_tech]`. From 1 to 5 the amplifier rises
/// linearly from `base` to `at_tech5`; above 5 it rises linearly to `max` at
/// `max_tech`. Amplification at combo step `s` is `amplifier^s`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboCurve {
    /// Amplifier at technique 1.
    pub base: f64,
    /// Amplifier at technique 5.
    pub at_tech5: f64,
    /// Amplifier at `max_tech`.
    pub max: f64,
    /// Technique at which the curve saturates.
    pub max_tech: i32,
}

impl Default for ComboCurve {
    fn default() -> Self {
        Self {
            base: 1.01,
            at_tech5: 1.05,
            max: 2.0,
            max_tech: 100,
        }
    }
}

impl ComboCurve {
    /// Per-step amplifier for a technique value.
    #[must_use]
    pub fn amplifier(&self, technique: i32) -> f64 {
        let tech = technique.clamp(1, self.max_tech.max(1));
        if tech <= 5 {
            let progress = f64::from(tech - 1) / 4.0;
            return self.base + (self.at_tech5 - self.base) * progress;
        }
        let range = f64::from(self.max_tech - 5);
        let progress = f64::from(tech - 5) / range;
        self.at_tech5 + (self.max - self.at_tech5) * progress
    }

    /// Amplification for a combo step: `amplifier(technique)^step`.
    #[must_use]
    pub fn amplification(&self, technique: i32, step: usize) -> f64 {
        let exponent = i32::try_from(step).unwrap_or(i32::MAX);
        self.amplifier(technique).powi(exponent)
    }
}

/// Timing constants for the status-effect registry.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    /// Game seconds between poison/burn ticks.
    pub tick_interval: f64,
    /// Damage reduction lost per turn.
    pub damage_reduction_decay: f64,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            tick_interval: 10.0,
            damage_reduction_decay: 0.1,
        }
    }
}

/// Damage pipeline factors.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageTuning {
    /// Outgoing damage scale while weakened.
    pub weaken_multiplier: f64,
    /// Incoming damage scale when a shield absorbs a hit.
    pub shield_factor: f64,
    /// Difficulty scalar applied to every hit.
    pub external_multiplier: f64,
}

impl Default for DamageTuning {
    fn default() -> Self {
        Self {
            weaken_multiplier: 0.5,
            shield_factor: 0.5,
            external_multiplier: 1.0,
        }
    }
}

/// Strength of effects inflicted through action flags.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InflictionTuning {
    /// Poison damage per stack.
    pub poison_damage: i32,
    /// Poison stacks per application.
    pub poison_stacks: i32,
    /// Burn damage per stack.
    pub burn_damage: i32,
    /// Burn stacks per application.
    pub burn_stacks: i32,
    /// Bleed damage per stack.
    pub bleed_damage: i32,
    /// Bleed stacks per application.
    pub bleed_stacks: i32,
    /// Turns of stun.
    pub stun_turns: i32,
    /// Turns of weaken.
    pub weaken_turns: i32,
}

impl Default for InflictionTuning {
    fn default() -> Self {
        Self {
            poison_damage: 3,
            poison_stacks: 2,
            burn_damage: 2,
            burn_stacks: 2,
            bleed_damage: 2,
            bleed_stacks: 2,
            stun_turns: 1,
            weaken_turns: 2,
        }
    }
}

/// Attribute conversion ratios.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeTuning {
    /// Intelligence points per +1 roll bonus.
    pub intelligence_per_roll_bonus: i32,
}

impl Default for AttributeTuning {
    fn default() -> Self {
        Self {
            intelligence_per_roll_bonus: 10,
        }
    }
}

// =============================================================================
// CombatConfig
// =============================================================================

/// Complete set of combat tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Roll tier thresholds.
    pub rolls: RollBands,
    /// Combo amplifier curve.
    pub combo: ComboCurve,
    /// Effect timing.
    pub effects: EffectTuning,
    /// Damage factors.
    pub damage: DamageTuning,
    /// Flag-driven infliction strengths.
    pub inflictions: InflictionTuning,
    /// Attribute ratios.
    pub attributes: AttributeTuning,
    /// Game seconds per unit of action length. `None` disables the
    /// time-based poison/burn tick.
    pub seconds_per_turn: Option<f64>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            rolls: RollBands::default(),
            combo: ComboCurve::default(),
            effects: EffectTuning::default(),
            damage: DamageTuning::default(),
            inflictions: InflictionTuning::default(),
            attributes: AttributeTuning::default(),
            seconds_per_turn: Some(10.0),
        }
    }
}

impl CombatConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed JSON and any validation
    /// error from [`CombatConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bands = self.rolls;
        let critical = i64::from(bands.critical);
        if bands.fail_max <= 0
            || bands.basic_max <= bands.fail_max
            || i64::from(bands.basic_max) >= critical
            || bands.critical > bands.die_sides
        {
            return Err(ConfigError::InvalidRollBands {
                fail_max: bands.fail_max,
                basic_max: bands.basic_max,
                critical: bands.critical,
                die_sides: bands.die_sides,
            });
        }

        if self.combo.max_tech <= 5 {
            return Err(ConfigError::InvalidMaxTech(self.combo.max_tech));
        }
        positive("combo.base", self.combo.base)?;
        positive("combo.at_tech5", self.combo.at_tech5)?;
        positive("combo.max", self.combo.max)?;

        positive("effects.tick_interval", self.effects.tick_interval)?;
        unit("effects.damage_reduction_decay", self.effects.damage_reduction_decay)?;

        unit("damage.weaken_multiplier", self.damage.weaken_multiplier)?;
        unit("damage.shield_factor", self.damage.shield_factor)?;
        positive("damage.external_multiplier", self.damage.external_multiplier)?;

        if self.attributes.intelligence_per_roll_bonus < 1 {
            return Err(ConfigError::InvalidIntelligenceRatio(
                self.attributes.intelligence_per_roll_bonus,
            ));
        }

        if let Some(seconds) = self.seconds_per_turn {
            positive("seconds_per_turn", seconds)?;
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { field, value })
    }
}
