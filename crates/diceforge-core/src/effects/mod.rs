//! Per-actor status effects.
//!
//! [`StatusEffectRegistry`] owns every timed, stacked or one-shot effect on an
//! actor. Effects are stored as a map from [`EffectKind`] to [`EffectState`], so
//! clearing and advancing are single passes over the map rather than
//! hand-maintained field lists.
//!
//! # Lifecycles
//!
//! The registry runs several independent clocks:
//!
//! - **Turn-gated** effects (stun, weaken, penalties, stat bonuses, combo
//!   amplifier, length reduction) count down in [`advance_turns`]. Damage
//!   reduction decays by a fixed step in the same pass.
//! - **Time-ticked** poison and burn fire in [`tick_time_based_damage`] when
//!   the configured interval of game time has elapsed, losing one stack per
//!   tick.
//! - **Roll-consumed** temporary roll/combo bonuses lose a use only when a
//!   roll reads them.
//! - **One-shot** shields clear on the next hit.
//! - **Reroll charges** are latched to one use per turn.
//! - **Bonus groups** queue per keyword (see [`BonusKeyword`]).
//!
//! # Invariants
//!
//! - An entry exists only while its magnitude and remaining duration are
//!   nonzero; the update that zeroes either removes the entry.
//! - Poison/burn stacks and damage-per-stack are stored and removed together.
//! - Invalid requests return an [`EffectError`] and leave the registry untouched.
//!
//! # Example
//!
//! ```
//! use diceforge_core::effects::{Effect, EffectKind, StatusEffectRegistry};
//!
//! let mut effects = StatusEffectRegistry::new();
//! effects.apply(&Effect::Stun { turns: 2 }, 0.0).unwrap();
//! assert!(effects.is_stunned());
//!
//! effects.advance_turns(1);
//! assert_eq!(effects.remaining_turns(EffectKind::Stun), Some(1));
//!
//! let expired = effects.advance_turns(1);
//! assert_eq!(expired, vec![EffectKind::Stun]);
//! assert!(!effects.is_stunned());
//! ```
//!
//! [`advance_turns`]: StatusEffectRegistry::advance_turns
//! [`tick_time_based_damage`]: StatusEffectRegistry::tick_time_based_damage

mod bonus;
mod kind;

pub use bonus::{Bonus, BonusGroup, BonusKeyword, BonusKind, BonusQueue, BonusTotals};
pub use kind::{DotState, Effect, EffectKind, EffectState};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{trace, warn};

use crate::config::EffectTuning;
use crate::stats::{Attributes, StatKind};

// =============================================================================
// Errors
// =============================================================================

/// Rejected effect applications.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    /// Duration or use count below zero.
    #[error("{kind} duration must be non-negative (got {turns})")]
    NegativeDuration {
        /// Targeted effect.
        kind: EffectKind,
        /// Offending duration.
        turns: i32,
    },

    /// Stack count below zero.
    #[error("{kind} stack count must be non-negative (got {stacks})")]
    NegativeStacks {
        /// Targeted effect.
        kind: EffectKind,
        /// Offending stack count.
        stacks: i32,
    },

    /// Damage per stack below zero.
    #[error("{kind} damage per stack must be non-negative (got {damage})")]
    NegativeDamage {
        /// Targeted effect.
        kind: EffectKind,
        /// Offending damage.
        damage: i32,
    },

    /// Fraction or multiplier outside its valid range.
    #[error("{kind} value {value} is out of range")]
    OutOfRange {
        /// Targeted effect.
        kind: EffectKind,
        /// Offending value.
        value: f64,
    },
}

// =============================================================================
// Support types
// =============================================================================

/// Poison and burn damage produced by one tick call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DotTick {
    /// Poison (including bleed) damage.
    pub poison: u32,
    /// Burn damage.
    pub burn: u32,
}

impl DotTick {
    /// Combined damage.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.poison.saturating_add(self.burn)
    }
}

/// Reroll charges with the once-per-turn latch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
struct RerollState {
    charges: u32,
    used_this_turn: bool,
}

// =============================================================================
// StatusEffectRegistry
// =============================================================================

/// Owned store of an actor's status effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffectRegistry {
    effects: BTreeMap<EffectKind, EffectState>,
    rerolls: RerollState,
    action_bonuses: BonusQueue,
    attack_bonuses: BonusQueue,
    tuning: EffectTuning,
}

impl Default for StatusEffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEffectRegistry {
    /// Creates an empty registry with default timing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tuning(EffectTuning::default())
    }

    /// Creates an empty registry with the given timing.
    #[must_use]
    pub fn with_tuning(tuning: EffectTuning) -> Self {
        Self {
            effects: BTreeMap::new(),
            rerolls: RerollState::default(),
            action_bonuses: BonusQueue::default(),
            attack_bonuses: BonusQueue::default(),
            tuning,
        }
    }

    /// Timing constants in use.
    #[must_use]
    pub const fn tuning(&self) -> &EffectTuning {
        &self.tuning
    }

    /// Replaces the timing constants. Active effects are kept.
    pub fn set_tuning(&mut self, tuning: EffectTuning) {
        self.tuning = tuning;
    }

    // -------------------------------------------------------------------------
    // Application
    // -------------------------------------------------------------------------

    /// Applies an effect according to its stacking policy.
    ///
    /// Poison and burn add stacks, take the new damage per stack and restart
    /// their tick timer at `now`. Turn-gated debuffs keep the larger of the
    /// old and new magnitude and duration. Temporary roll/combo bonuses
    /// overwrite. A zero magnitude or duration is accepted and does nothing.
    ///
    /// # Errors
    ///
    /// Rejects negative durations, stacks or damage and out-of-range
    /// fractions; the registry is left unchanged.
    pub fn apply(&mut self, effect: &Effect, now: f64) -> Result<(), EffectError> {
        let result = self.try_apply(effect, now);
        if let Err(err) = &result {
            warn!(kind = %effect.kind(), %err, "rejected status effect");
        }
        result
    }

    fn try_apply(&mut self, effect: &Effect, now: f64) -> Result<(), EffectError> {
        let kind = effect.kind();
        match *effect {
            Effect::Stun { turns } | Effect::Weaken { turns } => {
                let turns = duration(kind, turns)?;
                if turns == 0 {
                    return Ok(());
                }
                match self.effects.get_mut(&kind) {
                    Some(EffectState::Timed { turns: current }) => *current = (*current).max(turns),
                    _ => {
                        self.effects.insert(kind, EffectState::Timed { turns });
                    }
                }
            }
            Effect::RollPenalty { amount, turns } | Effect::EnemyRollPenalty { amount, turns } => {
                let turns = duration(kind, turns)?;
                if turns == 0 || amount == 0 {
                    return Ok(());
                }
                match self.effects.get_mut(&kind) {
                    Some(EffectState::Penalty {
                        amount: current,
                        turns: left,
                    }) => {
                        *current = (*current).max(amount);
                        *left = (*left).max(turns);
                    }
                    _ => {
                        self.effects.insert(kind, EffectState::Penalty { amount, turns });
                    }
                }
            }
            Effect::DamageReduction { fraction } => {
                let fraction = unit_fraction(kind, fraction)?;
                if fraction == 0.0 {
                    return Ok(());
                }
                match self.effects.get_mut(&kind) {
                    Some(EffectState::Decaying { fraction: current }) => {
                        *current = current.max(fraction);
                    }
                    _ => {
                        self.effects.insert(kind, EffectState::Decaying { fraction });
                    }
                }
            }
            Effect::Poison {
                damage,
                stacks,
                bleeding,
            } => self.add_stacks(kind, damage, stacks, bleeding, now)?,
            Effect::Burn { damage, stacks } => self.add_stacks(kind, damage, stacks, false, now)?,
            Effect::StatBonus {
                stat,
                amount,
                turns,
            } => {
                let turns = duration(kind, turns)?;
                if turns == 0 || amount == 0 {
                    return Ok(());
                }
                self.add_stat_bonus(stat, amount, turns);
            }
            Effect::ComboAmplifier { multiplier, turns } => {
                if !multiplier.is_finite() || multiplier <= 0.0 {
                    return Err(EffectError::OutOfRange {
                        kind,
                        value: multiplier,
                    });
                }
                let turns = duration(kind, turns)?;
                if turns == 0 {
                    return Ok(());
                }
                self.raise_scaled(kind, multiplier, turns);
            }
            Effect::LengthReduction { fraction, turns } => {
                let fraction = unit_fraction(kind, fraction)?;
                let turns = duration(kind, turns)?;
                if turns == 0 || fraction == 0.0 {
                    return Ok(());
                }
                self.raise_scaled(kind, fraction, turns);
            }
            Effect::TempComboBonus { amount, uses } | Effect::TempRollBonus { amount, uses } => {
                let uses = duration(kind, uses)?;
                if uses == 0 || amount == 0 {
                    return Ok(());
                }
                self.effects.insert(kind, EffectState::Charged { amount, uses });
            }
            Effect::Shield => {
                self.effects.insert(kind, EffectState::Armed);
            }
        }
        trace!(%kind, "status effect applied");
        Ok(())
    }

    fn add_stacks(
        &mut self,
        kind: EffectKind,
        damage: i32,
        stacks: i32,
        bleeding: bool,
        now: f64,
    ) -> Result<(), EffectError> {
        let stacks = u32::try_from(stacks).map_err(|_| EffectError::NegativeStacks { kind, stacks })?;
        let damage = u32::try_from(damage).map_err(|_| EffectError::NegativeDamage { kind, damage })?;
        if stacks == 0 || damage == 0 {
            return Ok(());
        }
        match self.effects.get_mut(&kind) {
            Some(EffectState::DamageOverTime(dot)) => {
                dot.stacks = dot.stacks.saturating_add(stacks);
                dot.damage = damage;
                dot.last_tick = now;
                dot.bleeding = bleeding;
            }
            _ => {
                self.effects.insert(
                    kind,
                    EffectState::DamageOverTime(DotState {
                        stacks,
                        damage,
                        last_tick: now,
                        bleeding,
                    }),
                );
            }
        }
        Ok(())
    }

    fn add_stat_bonus(&mut self, stat: StatKind, amount: i32, turns: u32) {
        match self.effects.get_mut(&EffectKind::StatBonus) {
            Some(EffectState::Stats { bonus, turns: left }) => {
                bonus.set(stat, amount);
                *left = (*left).max(turns);
            }
            _ => {
                let mut bonus = Attributes::default();
                bonus.set(stat, amount);
                self.effects
                    .insert(EffectKind::StatBonus, EffectState::Stats { bonus, turns });
            }
        }
    }

    fn raise_scaled(&mut self, kind: EffectKind, value: f64, turns: u32) {
        match self.effects.get_mut(&kind) {
            Some(EffectState::Scaled {
                value: current,
                turns: left,
            }) => {
                *current = current.max(value);
                *left = (*left).max(turns);
            }
            _ => {
                self.effects.insert(kind, EffectState::Scaled { value, turns });
            }
        }
    }

    // -------------------------------------------------------------------------
    // Clocks
    // -------------------------------------------------------------------------

    /// Counts down every turn-gated effect by `turns`.
    ///
    /// Counters saturate at zero and an effect whose counter reaches zero is
    /// removed in the same pass. Damage reduction loses
    /// `damage_reduction_decay * turns`. Poison, burn, temporary roll/combo
    /// bonuses and shields are untouched. Any elapsed turn also re-arms the
    /// reroll latch.
    ///
    /// Returns the kinds that expired, in key order.
    pub fn advance_turns(&mut self, turns: u32) -> Vec<EffectKind> {
        if turns == 0 {
            return Vec::new();
        }
        self.rerolls.used_this_turn = false;

        let decay = self.tuning.damage_reduction_decay * f64::from(turns);
        let mut expired = Vec::new();
        self.effects.retain(|kind, state| {
            let alive = match state {
                EffectState::Timed { turns: left }
                | EffectState::Penalty { turns: left, .. }
                | EffectState::Scaled { turns: left, .. }
                | EffectState::Stats { turns: left, .. } => {
                    *left = (*left).saturating_sub(turns);
                    *left > 0
                }
                EffectState::Decaying { fraction } => {
                    *fraction -= decay;
                    *fraction > f64::EPSILON
                }
                EffectState::DamageOverTime(_) | EffectState::Charged { .. } | EffectState::Armed => {
                    true
                }
            };
            if !alive {
                trace!(%kind, "status effect expired");
                expired.push(*kind);
            }
            alive
        });
        expired
    }

    /// Fires poison and burn ticks that are due at game time `now`.
    ///
    /// A tick is due once `now - last_tick >= tick_interval`. Each due effect
    /// deals `stacks * damage`, records `now` as its last tick and loses one
    /// stack; the last stack removes the effect. At most one tick per effect
    /// fires per call.
    pub fn tick_time_based_damage(&mut self, now: f64) -> DotTick {
        let interval = self.tuning.tick_interval;
        let mut tick = DotTick::default();
        for kind in [EffectKind::Poison, EffectKind::Burn] {
            let Some(EffectState::DamageOverTime(dot)) = self.effects.get_mut(&kind) else {
                continue;
            };
            if now - dot.last_tick < interval {
                continue;
            }
            let damage = dot.pending_damage();
            dot.last_tick = now;
            dot.stacks = dot.stacks.saturating_sub(1);
            if dot.stacks == 0 {
                self.effects.remove(&kind);
                trace!(%kind, "damage over time exhausted");
            }
            if kind == EffectKind::Poison {
                tick.poison = damage;
            } else {
                tick.burn = damage;
            }
        }
        tick
    }

    /// Resets every effect, reroll and bonus queue to the empty state.
    pub fn clear_all(&mut self) {
        self.effects.clear();
        self.rerolls = RerollState::default();
        self.action_bonuses.clear();
        self.attack_bonuses.clear();
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns `true` if an effect of `kind` is active.
    #[must_use]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.effects.contains_key(&kind)
    }

    /// Stored state for `kind`.
    #[must_use]
    pub fn state(&self, kind: EffectKind) -> Option<&EffectState> {
        self.effects.get(&kind)
    }

    /// Turns remaining for a turn-gated effect.
    #[must_use]
    pub fn remaining_turns(&self, kind: EffectKind) -> Option<u32> {
        self.state(kind).and_then(EffectState::turns)
    }

    /// Active effects in key order.
    pub fn iter(&self) -> impl Iterator<Item = (EffectKind, &EffectState)> + '_ {
        self.effects.iter().map(|(kind, state)| (*kind, state))
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Returns `true` while stunned.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.is_active(EffectKind::Stun)
    }

    /// Returns `true` while weakened.
    #[must_use]
    pub fn is_weakened(&self) -> bool {
        self.is_active(EffectKind::Weaken)
    }

    /// Penalty on this actor's own rolls.
    #[must_use]
    pub fn roll_penalty(&self) -> i32 {
        self.penalty(EffectKind::RollPenalty)
    }

    /// Penalty on rolls made against this actor.
    #[must_use]
    pub fn enemy_roll_penalty(&self) -> i32 {
        self.penalty(EffectKind::EnemyRollPenalty)
    }

    fn penalty(&self, kind: EffectKind) -> i32 {
        match self.effects.get(&kind) {
            Some(EffectState::Penalty { amount, .. }) => *amount,
            _ => 0,
        }
    }

    /// Current damage reduction fraction.
    #[must_use]
    pub fn damage_reduction(&self) -> f64 {
        match self.effects.get(&EffectKind::DamageReduction) {
            Some(EffectState::Decaying { fraction }) => fraction.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// All temporary attribute bonuses.
    #[must_use]
    pub fn stat_bonuses(&self) -> Attributes {
        match self.effects.get(&EffectKind::StatBonus) {
            Some(EffectState::Stats { bonus, .. }) => *bonus,
            _ => Attributes::default(),
        }
    }

    /// Temporary bonus for one attribute.
    #[must_use]
    pub fn stat_bonus(&self, stat: StatKind) -> i32 {
        self.stat_bonuses().get(stat)
    }

    /// Multiplier on combo amplification; `1.0` when inactive.
    #[must_use]
    pub fn combo_amplifier_multiplier(&self) -> f64 {
        self.scaled(EffectKind::ComboAmplifier).unwrap_or(1.0)
    }

    /// Fraction of action length removed; `0.0` when inactive.
    #[must_use]
    pub fn length_reduction(&self) -> f64 {
        self.scaled(EffectKind::LengthReduction).unwrap_or(0.0)
    }

    fn scaled(&self, kind: EffectKind) -> Option<f64> {
        match self.effects.get(&kind) {
            Some(EffectState::Scaled { value, .. }) => Some(*value),
            _ => None,
        }
    }

    /// Active poison (or bleed).
    #[must_use]
    pub fn poison(&self) -> Option<&DotState> {
        self.dot(EffectKind::Poison)
    }

    /// Active burn.
    #[must_use]
    pub fn burn(&self) -> Option<&DotState> {
        self.dot(EffectKind::Burn)
    }

    fn dot(&self, kind: EffectKind) -> Option<&DotState> {
        match self.effects.get(&kind) {
            Some(EffectState::DamageOverTime(dot)) => Some(dot),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // One-shot and roll-consumed effects
    // -------------------------------------------------------------------------

    /// Returns `true` if a shield is armed.
    #[must_use]
    pub fn has_shield(&self) -> bool {
        self.is_active(EffectKind::Shield)
    }

    /// Removes the shield, returning whether one was armed.
    pub fn consume_shield(&mut self) -> bool {
        let consumed = self.effects.remove(&EffectKind::Shield).is_some();
        if consumed {
            trace!("shield consumed");
        }
        consumed
    }

    /// Pending temporary roll bonus, without consuming it.
    #[must_use]
    pub fn temp_roll_bonus(&self) -> i32 {
        self.charged(EffectKind::TempRollBonus)
    }

    /// Pending temporary combo bonus, without consuming it.
    #[must_use]
    pub fn temp_combo_bonus(&self) -> i32 {
        self.charged(EffectKind::TempComboBonus)
    }

    /// Reads the temporary roll bonus for a roll, spending one use.
    pub fn consume_temp_roll_bonus(&mut self) -> i32 {
        self.consume_charged(EffectKind::TempRollBonus)
    }

    /// Reads the temporary combo bonus for a roll, spending one use.
    pub fn consume_temp_combo_bonus(&mut self) -> i32 {
        self.consume_charged(EffectKind::TempComboBonus)
    }

    fn charged(&self, kind: EffectKind) -> i32 {
        match self.effects.get(&kind) {
            Some(EffectState::Charged { amount, .. }) => *amount,
            _ => 0,
        }
    }

    fn consume_charged(&mut self, kind: EffectKind) -> i32 {
        let Some(EffectState::Charged { amount, uses }) = self.effects.get_mut(&kind) else {
            return 0;
        };
        let value = *amount;
        *uses = (*uses).saturating_sub(1);
        if *uses == 0 {
            self.effects.remove(&kind);
        }
        value
    }

    // -------------------------------------------------------------------------
    // Rerolls
    // -------------------------------------------------------------------------

    /// Refreshes reroll charges and re-arms the per-turn latch.
    pub fn reset_rerolls(&mut self, charges: u32) {
        self.rerolls = RerollState {
            charges,
            used_this_turn: false,
        };
    }

    /// Charges left.
    #[must_use]
    pub const fn reroll_charges(&self) -> u32 {
        self.rerolls.charges
    }

    /// Returns `true` if a reroll was already spent this turn.
    #[must_use]
    pub const fn reroll_used_this_turn(&self) -> bool {
        self.rerolls.used_this_turn
    }

    /// Spends a reroll if a charge remains and none was used this turn.
    pub fn try_use_reroll(&mut self) -> bool {
        if self.rerolls.charges == 0 || self.rerolls.used_this_turn {
            return false;
        }
        self.rerolls.charges -= 1;
        self.rerolls.used_this_turn = true;
        true
    }

    // -------------------------------------------------------------------------
    // Bonus groups
    // -------------------------------------------------------------------------

    /// Queues a bonus group behind any others with the same keyword.
    pub fn queue_bonus_group(&mut self, group: BonusGroup) {
        match group.keyword {
            BonusKeyword::Action => self.action_bonuses.push(group),
            BonusKeyword::Attack => self.attack_bonuses.push(group),
        }
    }

    /// Combined bonuses of the front ACTION and ATTACK groups.
    #[must_use]
    pub fn pending_bonuses(&self) -> BonusTotals {
        let mut totals = BonusTotals::default();
        self.action_bonuses.accumulate(&mut totals);
        self.attack_bonuses.accumulate(&mut totals);
        totals
    }

    /// Spends one use of the front ATTACK group. Called on every roll.
    pub fn consume_attack_bonus(&mut self) -> bool {
        self.attack_bonuses.consume()
    }

    /// Spends one use of the front ACTION group. Called only on success.
    pub fn consume_action_bonus(&mut self) -> bool {
        self.action_bonuses.consume()
    }

    /// Queued ACTION groups.
    #[must_use]
    pub const fn action_bonuses(&self) -> &BonusQueue {
        &self.action_bonuses
    }

    /// Queued ATTACK groups.
    #[must_use]
    pub const fn attack_bonuses(&self) -> &BonusQueue {
        &self.attack_bonuses
    }
}

fn duration(kind: EffectKind, turns: i32) -> Result<u32, EffectError> {
    u32::try_from(turns).map_err(|_| EffectError::NegativeDuration { kind, turns })
}

fn unit_fraction(kind: EffectKind, value: f64) -> Result<f64, EffectError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(EffectError::OutOfRange { kind, value })
    }
}
