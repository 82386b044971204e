//! Turn accounting after an action.
//!
//! [`TurnClock::advance`] converts an action's length into whole turns for
//! the duration-gated effects, and separately moves the actor's game time
//! forward so poison and burn can tick on their own interval.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::actor::Actor;
use crate::config::CombatConfig;
use crate::effects::{DotTick, EffectKind};

/// What one clock advance did to an actor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnReport {
    /// Whole turns passed to the effect registry.
    pub turns: u32,
    /// Effects that expired.
    pub expired: Vec<EffectKind>,
    /// Damage-over-time ticks that fired.
    pub dot: DotTick,
    /// Health actually lost to those ticks.
    pub dot_damage_applied: u32,
}

/// Drives effect decay and game-time ticking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnClock {
    seconds_per_turn: Option<f64>,
}

impl Default for TurnClock {
    fn default() -> Self {
        Self::from_config(&CombatConfig::default())
    }
}

impl TurnClock {
    /// Creates a clock. `None` disables game-time ticking.
    #[must_use]
    pub const fn new(seconds_per_turn: Option<f64>) -> Self {
        Self { seconds_per_turn }
    }

    /// Creates a clock from `config.seconds_per_turn`.
    #[must_use]
    pub fn from_config(config: &CombatConfig) -> Self {
        Self::new(config.seconds_per_turn)
    }

    /// Game seconds per turn, if ticking is enabled.
    #[must_use]
    pub const fn seconds_per_turn(&self) -> Option<f64> {
        self.seconds_per_turn
    }

    /// Whole turns consumed by an action of `length` after `reduction`.
    ///
    /// ```
    /// use diceforge_core::clock::TurnClock;
    ///
    /// assert_eq!(TurnClock::turns_for(1.0, 0.0), 1);
    /// assert_eq!(TurnClock::turns_for(1.5, 0.0), 2);
    /// assert_eq!(TurnClock::turns_for(2.0, 0.25), 2);
    /// assert_eq!(TurnClock::turns_for(0.0, 0.0), 0);
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn turns_for(length: f64, reduction: f64) -> u32 {
        let effective = length * (1.0 - reduction.clamp(0.0, 1.0));
        if !effective.is_finite() || effective <= 0.0 {
            return 0;
        }
        effective.ceil().min(f64::from(u32::MAX)) as u32
    }

    /// Advances `actor` past an action of `action_length` turns.
    ///
    /// Must be called exactly once per action; repeated calls decay effects
    /// again.
    pub fn advance(&self, actor: &mut Actor, action_length: f64) -> TurnReport {
        let reduction = actor.effects().length_reduction();
        let turns = Self::turns_for(action_length, reduction);
        let expired = actor.effects_mut().advance_turns(turns);

        let mut report = TurnReport {
            turns,
            expired,
            ..TurnReport::default()
        };

        if let Some(seconds) = self.seconds_per_turn {
            actor.add_elapsed_time(action_length.max(0.0) * seconds);
            let now = actor.elapsed_time();
            report.dot = actor.effects_mut().tick_time_based_damage(now);
            report.dot_damage_applied = actor.vitals_mut().take_damage(report.dot.total());
        }

        debug!(
            actor = %actor.id(),
            turns,
            expired = report.expired.len(),
            dot = report.dot.total(),
            "turn advanced"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;
    use crate::effects::Effect;
    use crate::stats::Attributes;

    fn actor() -> Actor {
        Actor::new(ActorId::new(1), "Tess", Attributes::default(), 50)
    }

    #[test]
    fn length_rounds_up() {
        assert_eq!(TurnClock::turns_for(0.2, 0.0), 1);
        assert_eq!(TurnClock::turns_for(3.0, 0.5), 2);
        assert_eq!(TurnClock::turns_for(f64::NAN, 0.0), 0);
        assert_eq!(TurnClock::turns_for(-2.0, 0.0), 0);
    }

    #[test]
    fn advance_expires_turn_gated_effects() {
        let clock = TurnClock::new(None);
        let mut actor = actor();
        actor
            .effects_mut()
            .apply(&Effect::Weaken { turns: 2 }, 0.0)
            .unwrap();

        let first = clock.advance(&mut actor, 1.0);
        assert_eq!(first.turns, 1);
        assert!(first.expired.is_empty());

        let second = clock.advance(&mut actor, 1.0);
        assert_eq!(second.expired, vec![EffectKind::Weaken]);
    }

    #[test]
    fn length_reduction_shortens_turns() {
        let clock = TurnClock::new(None);
        let mut actor = actor();
        actor
            .effects_mut()
            .apply(
                &Effect::LengthReduction {
                    fraction: 0.5,
                    turns: 5,
                },
                0.0,
            )
            .unwrap();
        assert_eq!(clock.advance(&mut actor, 2.0).turns, 1);
    }

    #[test]
    fn game_time_ticks_poison() {
        let clock = TurnClock::new(Some(10.0));
        let mut actor = actor();
        actor
            .effects_mut()
            .apply(
                &Effect::Poison {
                    damage: 3,
                    stacks: 2,
                    bleeding: false,
                },
                0.0,
            )
            .unwrap();

        let report = clock.advance(&mut actor, 1.0);
        assert_eq!(report.dot.poison, 6);
        assert_eq!(report.dot_damage_applied, 6);
        assert_eq!(actor.vitals().current(), 44);
        assert!((actor.elapsed_time() - 10.0).abs() < 1e-9);
        assert_eq!(actor.effects().poison().map(|p| p.stacks), Some(1));
    }

    #[test]
    fn no_time_source_skips_ticks() {
        let clock = TurnClock::new(None);
        let mut actor = actor();
        actor
            .effects_mut()
            .apply(
                &Effect::Burn {
                    damage: 2,
                    stacks: 2,
                },
                0.0,
            )
            .unwrap();
        let report = clock.advance(&mut actor, 3.0);
        assert_eq!(report.dot.total(), 0);
        assert_eq!(actor.vitals().current(), 50);
    }
}
