//! Combat actors.
//!
//! An [`Actor`] bundles everything the combat core mutates for one
//! participant:
//! - [`ActorId`] and display name
//! - base [`Attributes`] and [`Vitals`]
//! - an [`ActionPool`] of weighted action copies
//! - a [`ComboSequencer`] pointing into that pool
//! - a [`StatusEffectRegistry`]
//! - elapsed game time for poison/burn ticking
//!
//! The registry and sequencer are owned exclusively by their actor; callers
//! that share actors across threads must serialize access per actor.
//!
//! # Example
//!
//! ```
//! use diceforge_core::action::{Action, ActionKind};
//! use diceforge_core::actor::{Actor, ActorId};
//! use diceforge_core::stats::Attributes;
//!
//! let mut hero = Actor::new(ActorId::new(1), "Ilsa", Attributes::new(12, 8, 6, 20), 40);
//! let lunge = hero
//!     .add_action(Action::new("Lunge", ActionKind::Attack).as_combo(), 1.0)
//!     .unwrap();
//! hero.add_to_combo(lunge).unwrap();
//!
//! assert_eq!(hero.combo_action().map(|a| a.action.name.as_str()), Some("Lunge"));
//! ```

mod pool;

pub use pool::{ActionPool, ActionSource, PoolEntry, PoolError};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::action::{Action, ActionCatalog, ActionInstanceId, ActionRef};
use crate::combo::ComboSequencer;
use crate::config::EffectTuning;
use crate::effects::StatusEffectRegistry;
use crate::equipment::{EquipmentBonusProvider, GearStat};
use crate::error::CombatError;
use crate::stats::{Attributes, StatKind};

// =============================================================================
// ActorId
// =============================================================================

/// Unique identifier for an actor within an encounter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(u64);

impl ActorId {
    /// Creates a new `ActorId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ActorId> for u64 {
    fn from(id: ActorId) -> Self {
        id.0
    }
}

// =============================================================================
// Vitals
// =============================================================================

/// Current and maximum health.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    current: u32,
    max: u32,
}

impl Vitals {
    /// Full health at `max`.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Returns `true` above zero health.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.current > 0
    }

    /// Removes health, returning the amount actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.current);
        self.current -= lost;
        lost
    }

    /// Restores health up to the maximum, returning the amount gained.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max - self.current);
        self.current += gained;
        gained
    }
}

// =============================================================================
// Gear changes
// =============================================================================

/// Gear tags removed and added by an equipment change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GearChange {
    /// Tags of unequipped gear.
    pub removed: Vec<String>,
    /// Tags of newly equipped gear.
    pub added: Vec<String>,
}

impl GearChange {
    /// Creates an empty change.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an unequipped tag.
    #[must_use]
    pub fn removing(mut self, tag: impl Into<String>) -> Self {
        self.removed.push(tag.into());
        self
    }

    /// Records a newly equipped tag.
    #[must_use]
    pub fn adding(mut self, tag: impl Into<String>) -> Self {
        self.added.push(tag.into());
        self
    }
}

/// Pool instances affected by a gear change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GearChangeReport {
    /// Instances stripped from pool and combo.
    pub removed: Vec<ActionInstanceId>,
    /// Instances added to the pool.
    pub added: Vec<ActionInstanceId>,
}

// =============================================================================
// Actor
// =============================================================================

/// A combat participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    name: String,
    attributes: Attributes,
    vitals: Vitals,
    pool: ActionPool,
    combo: ComboSequencer,
    effects: StatusEffectRegistry,
    elapsed_time: f64,
}

impl Actor {
    /// Creates an actor at full health with an empty pool.
    #[must_use]
    pub fn new(id: ActorId, name: impl Into<String>, attributes: Attributes, max_health: u32) -> Self {
        Self {
            id,
            name: name.into(),
            attributes,
            vitals: Vitals::new(max_health),
            pool: ActionPool::new(),
            combo: ComboSequencer::new(),
            effects: StatusEffectRegistry::new(),
            elapsed_time: 0.0,
        }
    }

    /// Uses `tuning` for this actor's effect timing.
    #[must_use]
    pub fn with_effect_tuning(mut self, tuning: EffectTuning) -> Self {
        self.effects.set_tuning(tuning);
        self
    }

    /// Actor id.
    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base attributes.
    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable base attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Health.
    #[must_use]
    pub const fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Mutable health.
    pub fn vitals_mut(&mut self) -> &mut Vitals {
        &mut self.vitals
    }

    /// Action pool.
    #[must_use]
    pub const fn pool(&self) -> &ActionPool {
        &self.pool
    }

    /// Combo sequence.
    #[must_use]
    pub const fn combo(&self) -> &ComboSequencer {
        &self.combo
    }

    /// Mutable combo sequence.
    pub fn combo_mut(&mut self) -> &mut ComboSequencer {
        &mut self.combo
    }

    /// Status effects.
    #[must_use]
    pub const fn effects(&self) -> &StatusEffectRegistry {
        &self.effects
    }

    /// Mutable status effects.
    pub fn effects_mut(&mut self) -> &mut StatusEffectRegistry {
        &mut self.effects
    }

    /// Game time this actor has spent acting.
    #[must_use]
    pub const fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// Advances this actor's game time.
    pub fn add_elapsed_time(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.elapsed_time += seconds;
        }
    }

    /// Base attributes plus temporary effect bonuses and gear bonuses.
    ///
    /// Queued bonus groups are not included; they depend on the roll.
    #[must_use]
    pub fn effective_attributes(&self, gear: &dyn EquipmentBonusProvider) -> Attributes {
        let mut attributes = self.attributes + self.effects.stat_bonuses();
        for stat in StatKind::ALL {
            attributes.add_stat(stat, gear.stat_bonus(GearStat::from(stat)));
        }
        attributes
    }

    // -------------------------------------------------------------------------
    // Pool and combo
    // -------------------------------------------------------------------------

    /// Adds an innate action to the pool.
    ///
    /// # Errors
    ///
    /// See [`ActionPool::add`].
    pub fn add_action(&mut self, action: Action, weight: f64) -> Result<ActionInstanceId, PoolError> {
        self.pool.add(action, weight, ActionSource::Innate)
    }

    /// Removes an action from the pool and from the combo sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownInstance`] if `id` is not in the pool.
    pub fn remove_action(&mut self, id: ActionInstanceId) -> Result<PoolEntry, PoolError> {
        let entry = self.pool.remove(id)?;
        self.combo.remove(id);
        Ok(entry)
    }

    /// Appends a pool action to the combo sequence.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownInstance`] if `id` is not in the pool.
    pub fn add_to_combo(&mut self, id: ActionInstanceId) -> Result<(), PoolError> {
        if self.pool.get(id).is_none() {
            return Err(PoolError::UnknownInstance(id));
        }
        self.combo.push(id);
        Ok(())
    }

    /// Action under the combo pointer.
    #[must_use]
    pub fn combo_action(&self) -> Option<&ActionRef> {
        self.combo.current().and_then(|id| self.pool.get(id))
    }

    /// Action used on a Basic roll or an empty combo.
    ///
    /// The first non-combo damaging pool action, else the built-in strike.
    #[must_use]
    pub fn basic_action(&self) -> (Option<ActionInstanceId>, Action) {
        match self.pool.first_basic() {
            Some(aref) => (Some(aref.id), aref.action.clone()),
            None => (None, Action::basic_attack()),
        }
    }

    /// Weighted pick from the pool for AI-driven actors.
    ///
    /// Returns `None` while stunned or when nothing is selectable.
    pub fn select_action<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ActionRef> {
        if self.effects.is_stunned() {
            return None;
        }
        self.pool.select_weighted(rng)
    }

    /// Rebuilds gear-granted actions after an equipment change.
    ///
    /// Actions granted by removed tags leave the pool and the combo sequence.
    /// Actions in `catalog` carrying an added tag join the pool with weight
    /// 1.0; combo-eligible ones are appended to the combo sequence.
    ///
    /// # Errors
    ///
    /// Fails if a catalog action is malformed. Removals made before the
    /// failure are kept.
    pub fn apply_gear_change(
        &mut self,
        catalog: &dyn ActionCatalog,
        change: &GearChange,
    ) -> Result<GearChangeReport, CombatError> {
        let mut report = GearChangeReport::default();

        for tag in &change.removed {
            for id in self.pool.remove_gear(tag) {
                self.combo.remove(id);
                report.removed.push(id);
            }
        }

        for tag in &change.added {
            for action in catalog.tagged(tag) {
                let is_combo = action.is_combo;
                let id = self
                    .pool
                    .add(action.clone(), 1.0, ActionSource::Gear(tag.clone()))?;
                if is_combo {
                    self.combo.push(id);
                }
                report.added.push(id);
            }
        }

        debug!(
            actor = %self.id,
            removed = report.removed.len(),
            added = report.added.len(),
            "gear change applied"
        );
        Ok(report)
    }

    /// Clears effects and resets the combo chain at encounter end.
    pub fn end_encounter(&mut self) {
        self.effects.clear_all();
        self.combo.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, CatalogTable};
    use crate::effects::Effect;
    use crate::equipment::{Loadout, Unequipped};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hero() -> Actor {
        Actor::new(ActorId::new(1), "Hero", Attributes::new(10, 5, 5, 10), 30)
    }

    mod actor_id_tests {
        use super::*;

        #[test]
        fn formatting_and_conversion() {
            let id = ActorId::new(42);
            assert_eq!(format!("{id:?}"), "ActorId(42)");
            assert_eq!(id.to_string(), "42");
            let raw: u64 = id.into();
            assert_eq!(raw, 42);
            assert_eq!(ActorId::from(42), id);
        }

        #[test]
        fn ordering() {
            let mut ids = vec![ActorId::new(3), ActorId::new(1), ActorId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![ActorId::new(1), ActorId::new(2), ActorId::new(3)]);
        }
    }

    mod vitals_tests {
        use super::*;

        #[test]
        fn damage_floors_at_zero() {
            let mut vitals = Vitals::new(10);
            assert_eq!(vitals.take_damage(4), 4);
            assert_eq!(vitals.take_damage(50), 6);
            assert_eq!(vitals.current(), 0);
            assert!(!vitals.is_alive());
        }

        #[test]
        fn heal_caps_at_max() {
            let mut vitals = Vitals::new(10);
            vitals.take_damage(3);
            assert_eq!(vitals.heal(10), 3);
            assert_eq!(vitals.current(), vitals.max());
        }
    }

    mod pool_tests {
        use super::*;

        #[test]
        fn removing_action_strips_combo() {
            let mut actor = hero();
            let a = actor
                .add_action(Action::new("A", ActionKind::Attack).as_combo(), 1.0)
                .unwrap();
            let b = actor
                .add_action(Action::new("B", ActionKind::Attack).as_combo(), 1.0)
                .unwrap();
            actor.add_to_combo(a).unwrap();
            actor.add_to_combo(b).unwrap();

            actor.remove_action(a).unwrap();
            assert_eq!(actor.combo().slots(), &[b]);
            assert_eq!(actor.pool().len(), 1);
        }

        #[test]
        fn removing_repeated_combo_action_leaves_no_gaps() {
            let mut actor = hero();
            let a = actor
                .add_action(Action::new("A", ActionKind::Attack).as_combo(), 1.0)
                .unwrap();
            let b = actor
                .add_action(Action::new("B", ActionKind::Attack).as_combo(), 1.0)
                .unwrap();
            for id in [a, b, a] {
                actor.add_to_combo(id).unwrap();
            }

            actor.remove_action(a).unwrap();
            assert_eq!(actor.combo().slots(), &[b]);
            assert!(actor
                .combo()
                .slots()
                .iter()
                .all(|slot| actor.pool().get(*slot).is_some()));
            assert_eq!(actor.combo_action().map(|aref| aref.action.name.as_str()), Some("B"));
        }

        #[test]
        fn add_to_combo_requires_pool_entry() {
            let mut actor = hero();
            assert!(matches!(
                actor.add_to_combo(ActionInstanceId::new(3)),
                Err(PoolError::UnknownInstance(_))
            ));
        }

        #[test]
        fn basic_action_falls_back_to_strike() {
            let actor = hero();
            let (id, action) = actor.basic_action();
            assert_eq!(id, None);
            assert_eq!(action, Action::basic_attack());
        }

        #[test]
        fn stunned_actor_selects_nothing() {
            let mut actor = hero();
            actor
                .add_action(Action::new("A", ActionKind::Attack), 1.0)
                .unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            assert!(actor.select_action(&mut rng).is_some());

            actor
                .effects_mut()
                .apply(&Effect::Stun { turns: 1 }, 0.0)
                .unwrap();
            assert!(actor.select_action(&mut rng).is_none());
        }

        #[test]
        fn empty_pool_selects_nothing() {
            let actor = hero();
            let mut rng = ChaCha8Rng::seed_from_u64(3);
            assert!(actor.select_action(&mut rng).is_none());
        }
    }

    mod attribute_tests {
        use super::*;

        #[test]
        fn effective_attributes_layer_effects_and_gear() {
            let mut actor = hero();
            actor
                .effects_mut()
                .apply(
                    &Effect::StatBonus {
                        stat: StatKind::Strength,
                        amount: 3,
                        turns: 2,
                    },
                    0.0,
                )
                .unwrap();
            let gear = Loadout::new()
                .with_bonus(GearStat::Strength, 2)
                .with_bonus(GearStat::Intelligence, 5);

            let effective = actor.effective_attributes(&gear);
            assert_eq!(effective.strength, 15);
            assert_eq!(effective.intelligence, 15);
            assert_eq!(actor.effective_attributes(&Unequipped).strength, 13);
        }

        #[test]
        fn elapsed_time_ignores_bad_input() {
            let mut actor = hero();
            actor.add_elapsed_time(5.0);
            actor.add_elapsed_time(-3.0);
            actor.add_elapsed_time(f64::NAN);
            assert_eq!(actor.elapsed_time(), 5.0);
        }
    }

    mod gear_change_tests {
        use super::*;

        fn catalog() -> CatalogTable {
            let mut catalog = CatalogTable::new();
            catalog
                .insert(
                    Action::new("Arc Slash", ActionKind::Attack)
                        .as_combo()
                        .with_tag("sword"),
                )
                .unwrap();
            catalog
                .insert(Action::new("Pommel", ActionKind::Attack).with_tag("sword"))
                .unwrap();
            catalog
                .insert(
                    Action::new("Shield Bash", ActionKind::Attack)
                        .as_combo()
                        .with_tag("shield"),
                )
                .unwrap();
            catalog
        }

        #[test]
        fn equipping_appends_combo_actions() {
            let mut actor = hero();
            let report = actor
                .apply_gear_change(&catalog(), &GearChange::new().adding("sword"))
                .unwrap();
            assert_eq!(report.added.len(), 2);
            assert_eq!(actor.pool().len(), 2);
            assert_eq!(actor.combo().len(), 1);
            assert_eq!(
                actor.combo_action().map(|a| a.action.name.as_str()),
                Some("Arc Slash")
            );
        }

        #[test]
        fn swapping_gear_strips_old_actions() {
            let mut actor = hero();
            let innate = actor
                .add_action(Action::new("Kick", ActionKind::Attack).as_combo(), 1.0)
                .unwrap();
            actor.add_to_combo(innate).unwrap();
            actor
                .apply_gear_change(&catalog(), &GearChange::new().adding("sword"))
                .unwrap();
            actor.combo_mut().advance(crate::action::ComboRouting::Next);

            let report = actor
                .apply_gear_change(
                    &catalog(),
                    &GearChange::new().removing("sword").adding("shield"),
                )
                .unwrap();

            assert_eq!(report.removed.len(), 2);
            assert_eq!(report.added.len(), 1);
            let names: Vec<&str> = actor
                .combo()
                .slots()
                .iter()
                .filter_map(|id| actor.pool().get(*id))
                .map(|a| a.action.name.as_str())
                .collect();
            assert_eq!(names, vec!["Kick", "Shield Bash"]);
            assert_eq!(actor.combo().step(), 0);
        }
    }

    #[test]
    fn end_encounter_clears_state() {
        let mut actor = hero();
        let a = actor
            .add_action(Action::new("A", ActionKind::Attack).as_combo(), 1.0)
            .unwrap();
        actor.add_to_combo(a).unwrap();
        actor.add_to_combo(a).unwrap();
        actor.combo_mut().advance(crate::action::ComboRouting::Next);
        actor
            .effects_mut()
            .apply(&Effect::Weaken { turns: 3 }, 0.0)
            .unwrap();

        actor.end_encounter();
        assert!(actor.effects().is_empty());
        assert_eq!(actor.combo().step(), 0);
        assert_eq!(actor.combo().len(), 2);
    }
}
