//! Action resolution.
//!
//! [`CombatEngine`] composes the roll resolver, combo sequencer, damage
//! calculator and turn clock into the three operations a combat loop calls:
//!
//! 1. [`resolve_action`]: roll, pick the action for the tier, execute it
//! 2. [`advance_turn`]: decay effects and tick damage over time
//! 3. [`combo_preview`]: what the next Combo roll would do
//!
//! # Resolution order
//!
//! 1. Stunned actors return an empty result before any dice are rolled.
//! 2. The roll spends temporary roll/combo bonuses and one use of the front
//!    ATTACK bonus group.
//! 3. Fail resets the combo. Nothing else happens.
//! 4. Success spends one use of the front ACTION bonus group.
//! 5. Basic resets the combo and executes the basic action unamplified.
//! 6. Combo executes the current slot with its amplification, then routes
//!    the pointer. An empty combo falls back to the basic action.
//!
//! # Example
//!
//! ```
//! use diceforge_core::action::{Action, ActionKind};
//! use diceforge_core::actor::{Actor, ActorId};
//! use diceforge_core::engine::{CombatEngine, Combatant};
//! use diceforge_core::equipment::Unequipped;
//! use diceforge_core::stats::Attributes;
//!
//! let mut engine = CombatEngine::new(42);
//! let mut hero = Actor::new(ActorId::new(1), "Hero", Attributes::new(10, 5, 5, 10), 40);
//! let mut wolf = Actor::new(ActorId::new(2), "Wolf", Attributes::new(6, 8, 2, 1), 25);
//!
//! let result = engine.resolve_action(
//!     Combatant::new(&mut hero, &Unequipped),
//!     Combatant::new(&mut wolf, &Unequipped),
//! );
//! let report = engine.advance_turn(&mut hero, result.action_length());
//! assert!(report.turns >= 1 || result.roll.is_none());
//! ```
//!
//! [`resolve_action`]: CombatEngine::resolve_action
//! [`advance_turn`]: CombatEngine::advance_turn
//! [`combo_preview`]: CombatEngine::combo_preview

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, ActionInstanceId, ActionKind, InflictFlags};
use crate::actor::{Actor, ActorId};
use crate::clock::{TurnClock, TurnReport};
use crate::config::{CombatConfig, ConfigError, InflictionTuning};
use crate::damage::{DamageCalculator, DamageInput, DamageReport};
use crate::dice::{Dice, DieRoller};
use crate::effects::Effect;
use crate::equipment::EquipmentBonusProvider;
use crate::roll::{RollInput, RollOutcome, RollResolver, RollTier};
use crate::stats::Attributes;

// =============================================================================
// Results
// =============================================================================

/// The action that executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsedAction {
    /// Pool instance, or `None` for the built-in strike.
    pub instance: Option<ActionInstanceId>,
    /// Action name.
    pub name: String,
    /// Action kind.
    pub kind: ActionKind,
    /// Turns the action takes.
    pub length: f64,
    /// Combo slot that fired, for Combo-tier actions.
    pub combo_slot: Option<usize>,
}

/// An effect that landed on an actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffect {
    /// Actor that received the effect.
    pub target: ActorId,
    /// The applied request.
    pub effect: Effect,
}

/// Everything one call to [`CombatEngine::resolve_action`] did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Acting actor.
    pub actor: ActorId,
    /// Opposing actor.
    pub target: ActorId,
    /// The roll; `None` if the actor was stunned.
    pub roll: Option<RollOutcome>,
    /// The executed action; `None` on Fail or stun.
    pub action_used: Option<UsedAction>,
    /// Damage breakdown of the hit, if the action dealt damage.
    pub damage: Option<DamageReport>,
    /// Final damage of the hit.
    pub damage_dealt: u32,
    /// Health restored to the actor by a heal.
    pub healed: u32,
    /// Health restored to the actor by lifesteal.
    pub lifesteal: u32,
    /// The target's shield absorbed the hit.
    pub shield_consumed: bool,
    /// Amplification used for the executed action.
    pub combo_amplification: f64,
    /// Effects applied to either actor, in application order.
    pub effects_applied: Vec<AppliedEffect>,
}

impl ActionResult {
    fn empty(actor: ActorId, target: ActorId) -> Self {
        Self {
            actor,
            target,
            roll: None,
            action_used: None,
            damage: None,
            damage_dealt: 0,
            healed: 0,
            lifesteal: 0,
            shield_consumed: false,
            combo_amplification: 1.0,
            effects_applied: Vec::new(),
        }
    }

    /// Roll tier, if a roll happened.
    #[must_use]
    pub fn tier(&self) -> Option<RollTier> {
        self.roll.map(|roll| roll.tier)
    }

    /// Roll total, if a roll happened.
    #[must_use]
    pub fn roll_total(&self) -> Option<i32> {
        self.roll.map(|roll| roll.total)
    }

    /// Returns `true` if the actor could not act.
    #[must_use]
    pub fn was_stunned(&self) -> bool {
        self.roll.is_none()
    }

    /// Length to pass to [`CombatEngine::advance_turn`].
    ///
    /// A failed roll or a stun still costs one turn.
    #[must_use]
    pub fn action_length(&self) -> f64 {
        self.action_used.as_ref().map_or(1.0, |used| used.length)
    }
}

/// What the next Combo-tier roll would execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboPreview {
    /// Current slot.
    pub slot: usize,
    /// Pool instance in that slot.
    pub instance: ActionInstanceId,
    /// Action name.
    pub action_name: String,
    /// Amplification if executed now.
    pub amplification: f64,
}

// =============================================================================
// Combatant
// =============================================================================

/// An actor paired with the gear it fights with.
pub struct Combatant<'a> {
    /// The actor.
    pub actor: &'a mut Actor,
    /// Its equipped gear.
    pub gear: &'a dyn EquipmentBonusProvider,
}

impl<'a> Combatant<'a> {
    /// Pairs `actor` with `gear`.
    pub fn new(actor: &'a mut Actor, gear: &'a dyn EquipmentBonusProvider) -> Self {
        Self { actor, gear }
    }
}

// =============================================================================
// CombatEngine
// =============================================================================

/// Resolves actions between actors.
///
/// Holds the only random source; the same seed and the same sequence of
/// calls give identical results.
#[derive(Debug, Clone)]
pub struct CombatEngine<R = Dice> {
    config: CombatConfig,
    dice: R,
    rolls: RollResolver,
    damage: DamageCalculator,
    clock: TurnClock,
}

impl CombatEngine<Dice> {
    /// Creates an engine with the default configuration.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::build(CombatConfig::default(), Dice::new(seed))
    }

    /// Creates an engine with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in `config`.
    pub fn with_config(config: CombatConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_roller(config, Dice::new(seed))
    }
}

impl<R: DieRoller> CombatEngine<R> {
    /// Creates an engine that rolls through `roller`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in `config`.
    pub fn with_roller(config: CombatConfig, roller: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, roller))
    }

    fn build(config: CombatConfig, dice: R) -> Self {
        Self {
            rolls: RollResolver::from_config(&config),
            damage: DamageCalculator::from_tuning(&config.damage),
            clock: TurnClock::from_config(&config),
            config,
            dice,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// The random source.
    pub fn dice_mut(&mut self) -> &mut R {
        &mut self.dice
    }

    /// Prepares an actor for a new fight.
    ///
    /// Fills reroll charges from `gear`. Charges are not refilled again until
    /// the next fight.
    pub fn begin_encounter(&self, actor: &mut Actor, gear: &dyn EquipmentBonusProvider) {
        self.start_turn(actor);
        actor.effects_mut().reset_rerolls(gear.reroll_charges());
    }

    /// Puts the actor's effect timing on this engine's configuration.
    ///
    /// The per-turn reroll latch is re-armed by [`Self::advance_turn`].
    pub fn start_turn(&self, actor: &mut Actor) {
        actor.effects_mut().set_tuning(self.config.effects);
    }

    /// Rolls for `attacker` and executes the resulting action against
    /// `target`.
    pub fn resolve_action(&mut self, attacker: Combatant<'_>, target: Combatant<'_>) -> ActionResult {
        let Combatant {
            actor: attacker,
            gear: attacker_gear,
        } = attacker;
        let Combatant {
            actor: target,
            gear: target_gear,
        } = target;

        let mut result = ActionResult::empty(attacker.id(), target.id());
        let queued = attacker.effects().pending_bonuses();
        let attributes = attacker.effective_attributes(attacker_gear) + queued.stats;
        let input = RollInput {
            intelligence: attributes.intelligence,
            gear: attacker_gear,
            enemy_penalty: target.effects().enemy_roll_penalty(),
            queued,
        };

        let Some(roll) = self
            .rolls
            .resolve(&mut self.dice, attacker.effects_mut(), &input)
        else {
            debug!(actor = %attacker.id(), "stunned, no action");
            return result;
        };
        result.roll = Some(roll);
        attacker.effects_mut().consume_attack_bonus();

        if roll.tier == RollTier::Fail {
            attacker.combo_mut().reset();
            debug!(actor = %attacker.id(), total = roll.total, "action failed");
            return result;
        }
        attacker.effects_mut().consume_action_bonus();

        let mut exec = Execution {
            attacker,
            attacker_gear,
            target,
            target_gear,
            attributes,
            roll_bonus: roll.breakdown.total_bonus(),
            result: &mut result,
        };

        let combo_pick = if roll.tier == RollTier::Combo {
            exec.attacker.combo_action().cloned()
        } else {
            None
        };

        match combo_pick {
            Some(aref) => {
                let slot = exec.attacker.combo().step();
                let amplification = exec.attacker.combo().amplification(
                    &self.config.combo,
                    attributes.technique,
                    exec.attacker.effects().combo_amplifier_multiplier(),
                );
                self.execute(&mut exec, Some(aref.id), &aref.action, amplification, Some(slot));
                let advance = exec.attacker.combo_mut().advance(aref.action.routing);
                debug!(actor = %exec.attacker.id(), ?advance, "combo routed");
            }
            None => {
                exec.attacker.combo_mut().reset();
                let (instance, action) = exec.attacker.basic_action();
                self.execute(&mut exec, instance, &action, 1.0, None);
            }
        }

        debug!(
            actor = %result.actor,
            target = %result.target,
            tier = %roll.tier,
            damage = result.damage_dealt,
            healed = result.healed,
            effects = result.effects_applied.len(),
            "action resolved"
        );
        result
    }

    /// Decays `actor`'s effects after an action of `action_length` turns.
    pub fn advance_turn(&self, actor: &mut Actor, action_length: f64) -> TurnReport {
        self.clock.advance(actor, action_length)
    }

    /// The action a Combo roll would execute now, with its amplification.
    ///
    /// Returns `None` when the combo sequence is empty.
    #[must_use]
    pub fn combo_preview(
        &self,
        actor: &Actor,
        gear: &dyn EquipmentBonusProvider,
    ) -> Option<ComboPreview> {
        let aref = actor.combo_action()?;
        let technique = actor.effective_attributes(gear).technique
            + actor.effects().pending_bonuses().stats.technique;
        Some(ComboPreview {
            slot: actor.combo().step(),
            instance: aref.id,
            action_name: aref.action.name.clone(),
            amplification: actor.combo().amplification(
                &self.config.combo,
                technique,
                actor.effects().combo_amplifier_multiplier(),
            ),
        })
    }

    fn execute(
        &self,
        exec: &mut Execution<'_, '_>,
        instance: Option<ActionInstanceId>,
        action: &Action,
        amplification: f64,
        combo_slot: Option<usize>,
    ) {
        exec.result.combo_amplification = amplification;
        exec.result.action_used = Some(UsedAction {
            instance,
            name: action.name.clone(),
            kind: action.kind,
            length: action.length,
            combo_slot,
        });

        if action.kind.deals_damage() {
            self.strike(exec, action, amplification);
        } else if action.kind == ActionKind::Heal {
            let amount = action
                .base_value
                .saturating_add(exec.attributes.technique)
                .max(1)
                .unsigned_abs();
            exec.result.healed = exec.attacker.vitals_mut().heal(amount);
        }

        if action.kind.targets_opponent() {
            exec.grant_target(&action.grants);
        } else {
            exec.grant_self(&action.grants);
        }

        for group in &action.bonus_groups {
            exec.attacker.effects_mut().queue_bonus_group(group.clone());
        }
    }

    fn strike(&self, exec: &mut Execution<'_, '_>, action: &Action, amplification: f64) {
        let attribute = match action.kind {
            ActionKind::Spell => exec.attributes.intelligence,
            _ => exec.attributes.strength,
        };
        let input = DamageInput {
            attribute,
            gear: exec.attacker_gear,
            weakened: exec.attacker.effects().is_weakened(),
            action: Some(action),
            combo_amplification: amplification,
            external_multiplier: self.config.damage.external_multiplier,
            roll_bonus: exec.roll_bonus,
        };
        let report = self
            .damage
            .compute(&input, exec.target.effects_mut(), exec.target_gear);
        exec.target.vitals_mut().take_damage(report.damage);

        exec.result.damage = Some(report);
        exec.result.damage_dealt = report.damage;
        exec.result.shield_consumed = report.shielded;

        let lifesteal = floor_fraction(report.damage, exec.attacker_gear.modification_lifesteal());
        if lifesteal > 0 {
            exec.result.lifesteal = exec.attacker.vitals_mut().heal(lifesteal);
        }

        if report.damage > 0 {
            let inflicted = inflictions(action.inflicts, &self.config.inflictions);
            exec.grant_target(&inflicted);
        }
    }
}

// =============================================================================
// Execution helpers
// =============================================================================

struct Execution<'a, 'r> {
    attacker: &'a mut Actor,
    attacker_gear: &'a dyn EquipmentBonusProvider,
    target: &'a mut Actor,
    target_gear: &'a dyn EquipmentBonusProvider,
    attributes: Attributes,
    roll_bonus: i32,
    result: &'r mut ActionResult,
}

impl Execution<'_, '_> {
    fn grant_self(&mut self, effects: &[Effect]) {
        let now = self.attacker.elapsed_time();
        let id = self.attacker.id();
        for effect in effects {
            if self.attacker.effects_mut().apply(effect, now).is_ok() {
                self.result.effects_applied.push(AppliedEffect {
                    target: id,
                    effect: effect.clone(),
                });
            }
        }
    }

    fn grant_target(&mut self, effects: &[Effect]) {
        let now = self.target.elapsed_time();
        let id = self.target.id();
        for effect in effects {
            if self.target.effects_mut().apply(effect, now).is_ok() {
                self.result.effects_applied.push(AppliedEffect {
                    target: id,
                    effect: effect.clone(),
                });
            }
        }
    }
}

fn inflictions(flags: InflictFlags, tuning: &InflictionTuning) -> Vec<Effect> {
    let mut effects = Vec::new();
    if flags.contains(InflictFlags::POISON) {
        effects.push(Effect::Poison {
            damage: tuning.poison_damage,
            stacks: tuning.poison_stacks,
            bleeding: false,
        });
    }
    if flags.contains(InflictFlags::BLEED) {
        effects.push(Effect::Poison {
            damage: tuning.bleed_damage,
            stacks: tuning.bleed_stacks,
            bleeding: true,
        });
    }
    if flags.contains(InflictFlags::BURN) {
        effects.push(Effect::Burn {
            damage: tuning.burn_damage,
            stacks: tuning.burn_stacks,
        });
    }
    if flags.contains(InflictFlags::STUN) {
        effects.push(Effect::Stun {
            turns: tuning.stun_turns,
        });
    }
    if flags.contains(InflictFlags::WEAKEN) {
        effects.push(Effect::Weaken {
            turns: tuning.weaken_turns,
        });
    }
    effects
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_fraction(amount: u32, fraction: f64) -> u32 {
    if !fraction.is_finite() || fraction <= 0.0 {
        return 0;
    }
    (f64::from(amount) * fraction).floor().min(f64::from(u32::MAX)) as u32
}
