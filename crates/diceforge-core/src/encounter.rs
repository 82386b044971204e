//! Encounter bookkeeping.
//!
//! An [`Encounter`] owns the actors of one fight and the [`Loadout`] each of
//! them fights with. It serializes turns: [`Encounter::take_turn`] resolves
//! one action and advances that actor's clock before anyone else acts.
//!
//! # Architecture
//!
//! Actors are stored in a `BTreeMap` keyed by [`ActorId`], so iteration order
//! is the id order on every platform. Ids are handed out monotonically and
//! never reused within an encounter.
//!
//! # Example
//!
//! ```
//! use diceforge_core::encounter::Encounter;
//! use diceforge_core::engine::CombatEngine;
//! use diceforge_core::stats::Attributes;
//!
//! let mut engine = CombatEngine::new(7);
//! let mut encounter = Encounter::new();
//! let hero = encounter.spawn("Hero", Attributes::new(10, 5, 5, 10), 40);
//! let wolf = encounter.spawn("Wolf", Attributes::new(6, 8, 2, 1), 25);
//!
//! let outcome = encounter.take_turn(&mut engine, hero, wolf).unwrap();
//! assert_eq!(outcome.action.actor, hero);
//! assert_eq!(encounter.current_turn(), 1);
//! ```

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::action::ActionCatalog;
use crate::actor::{Actor, ActorId, GearChange, GearChangeReport};
use crate::clock::TurnReport;
use crate::dice::DieRoller;
use crate::engine::{ActionResult, CombatEngine, Combatant};
use crate::equipment::{EquipmentBonusProvider, Loadout, Unequipped};
use crate::error::CombatError;
use crate::stats::Attributes;

/// Invalid encounter requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncounterError {
    /// No actor has this id.
    #[error("no actor {0} in encounter")]
    UnknownActor(ActorId),

    /// An actor cannot target itself with an opposed action.
    #[error("actor {0} cannot target itself")]
    SelfTarget(ActorId),
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// The resolved action.
    pub action: ActionResult,
    /// Effect decay on the acting actor.
    pub clock: TurnReport,
}

/// Actors and loadouts of one fight.
#[derive(Debug, Clone, Default)]
pub struct Encounter {
    next_id: u64,
    actors: BTreeMap<ActorId, Actor>,
    loadouts: BTreeMap<ActorId, Loadout>,
    turn: u64,
}

impl Encounter {
    /// Creates an empty encounter at turn 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an actor with an empty pool and returns its id.
    pub fn spawn(&mut self, name: impl Into<String>, attributes: Attributes, max_health: u32) -> ActorId {
        let id = ActorId::new(self.next_id);
        self.next_id += 1;
        self.actors.insert(id, Actor::new(id, name, attributes, max_health));
        id
    }

    /// Adds a prebuilt actor, replacing any actor with the same id.
    ///
    /// Later spawns never reuse the inserted id.
    pub fn insert(&mut self, actor: Actor) -> Option<Actor> {
        let id = actor.id();
        self.next_id = self.next_id.max(id.as_u64().saturating_add(1));
        self.actors.insert(id, actor)
    }

    /// Removes an actor and its loadout.
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        self.loadouts.remove(&id);
        self.actors.remove(&id)
    }

    /// Looks up an actor.
    #[must_use]
    pub fn get(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Looks up an actor mutably.
    #[must_use]
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Actor ids in ascending order.
    pub fn actor_ids_sorted(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.keys().copied()
    }

    /// Ids of actors above zero health.
    pub fn living(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors
            .values()
            .filter(|actor| actor.vitals().is_alive())
            .map(Actor::id)
    }

    /// Returns `true` once at most one actor is still alive.
    #[must_use]
    pub fn is_decided(&self) -> bool {
        self.living().nth(1).is_none()
    }

    /// Number of actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns `true` if there are no actors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Turns taken so far.
    #[must_use]
    pub const fn current_turn(&self) -> u64 {
        self.turn
    }

    /// Sets the gear an actor fights with and fills its reroll charges.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterError::UnknownActor`] if `id` is not present.
    pub fn equip(&mut self, id: ActorId, loadout: Loadout) -> Result<(), EncounterError> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(EncounterError::UnknownActor(id))?;
        actor.effects_mut().reset_rerolls(loadout.reroll_charges());
        self.loadouts.insert(id, loadout);
        Ok(())
    }

    /// Starts a fight: every actor gets the engine's effect timing and the
    /// reroll charges of its loadout.
    ///
    /// Charges are spent across the whole fight; turns never refill them.
    pub fn begin<R: DieRoller>(&mut self, engine: &CombatEngine<R>) {
        for (id, actor) in &mut self.actors {
            engine.begin_encounter(actor, gear_for(&self.loadouts, *id));
        }
        debug!(actors = self.actors.len(), "encounter started");
    }

    /// The gear an actor fights with, if any was equipped.
    #[must_use]
    pub fn loadout(&self, id: ActorId) -> Option<&Loadout> {
        self.loadouts.get(&id)
    }

    /// Swaps an actor's gear and rebuilds its gear-granted actions.
    ///
    /// # Arguments
    ///
    /// * `id` - Actor changing gear
    /// * `catalog` - Source of actions granted by gear tags
    /// * `change` - Tags removed and added
    /// * `loadout` - Bonuses of the new gear
    ///
    /// # Errors
    ///
    /// Fails for an unknown actor or a malformed catalog action.
    pub fn change_gear(
        &mut self,
        id: ActorId,
        catalog: &dyn ActionCatalog,
        change: &GearChange,
        loadout: Loadout,
    ) -> Result<GearChangeReport, CombatError> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(EncounterError::UnknownActor(id))?;
        let report = actor.apply_gear_change(catalog, change)?;
        self.loadouts.insert(id, loadout);
        Ok(report)
    }

    /// Resolves one action by `attacker` against `target` and advances the
    /// attacker's clock.
    ///
    /// # Errors
    ///
    /// Fails without side effects if either actor is unknown or both ids
    /// are the same.
    pub fn take_turn<R: DieRoller>(
        &mut self,
        engine: &mut CombatEngine<R>,
        attacker: ActorId,
        target: ActorId,
    ) -> Result<TurnOutcome, EncounterError> {
        if attacker == target {
            return Err(EncounterError::SelfTarget(attacker));
        }
        if !self.actors.contains_key(&target) {
            return Err(EncounterError::UnknownActor(target));
        }
        let mut acting = self
            .actors
            .remove(&attacker)
            .ok_or(EncounterError::UnknownActor(attacker))?;

        let outcome = match self.actors.get_mut(&target) {
            Some(defender) => {
                let attacker_gear = gear_for(&self.loadouts, attacker);
                let target_gear = gear_for(&self.loadouts, target);

                engine.start_turn(&mut acting);
                let action = engine.resolve_action(
                    Combatant::new(&mut acting, attacker_gear),
                    Combatant::new(defender, target_gear),
                );
                let clock = engine.advance_turn(&mut acting, action.action_length());
                Ok(TurnOutcome { action, clock })
            }
            None => Err(EncounterError::UnknownActor(target)),
        };
        self.actors.insert(attacker, acting);

        if outcome.is_ok() {
            self.turn += 1;
            debug!(turn = self.turn, %attacker, %target, "turn taken");
        }
        outcome
    }

    /// Ends the fight: clears every actor's effects and resets combos.
    pub fn end(&mut self) {
        for actor in self.actors.values_mut() {
            actor.end_encounter();
        }
        debug!(turns = self.turn, "encounter ended");
    }
}

fn gear_for(loadouts: &BTreeMap<ActorId, Loadout>, id: ActorId) -> &dyn EquipmentBonusProvider {
    match loadouts.get(&id) {
        Some(loadout) => loadout,
        None => &Unequipped,
    }
}
