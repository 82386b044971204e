//! # Diceforge Core
//!
//! Turn-based dice combat resolution for Diceforge.
//!
//! This crate decides what happens when an actor acts: a d20 roll picks a
//! tier, the tier picks an action, and the action deals damage, heals or
//! applies status effects. It performs no I/O and owns no UI, persistence
//! or AI policy.
//!
//! ## Architecture
//!
//! - **Effects**: [`effects::StatusEffectRegistry`] owns an actor's timed,
//!   stacked and one-shot effects
//! - **Rolls**: [`roll::RollResolver`] turns dice and bonuses into a tier
//! - **Combos**: [`combo::ComboSequencer`] walks an actor's combo sequence
//! - **Damage**: [`damage::DamageCalculator`] composes a hit in fixed order
//! - **Clock**: [`clock::TurnClock`] decays effects after each action
//!
//! [`engine::CombatEngine`] composes them; [`encounter::Encounter`] holds
//! the actors of one fight.
//!
//! ## Usage
//!
//! ```
//! use diceforge_core::action::{Action, ActionKind};
//! use diceforge_core::encounter::Encounter;
//! use diceforge_core::engine::CombatEngine;
//! use diceforge_core::stats::Attributes;
//!
//! let mut engine = CombatEngine::new(2024);
//! let mut encounter = Encounter::new();
//! let hero = encounter.spawn("Hero", Attributes::new(12, 6, 8, 20), 40);
//! let wolf = encounter.spawn("Wolf", Attributes::new(6, 9, 2, 0), 25);
//!
//! let actor = encounter.get_mut(hero).unwrap();
//! for name in ["Lunge", "Riposte", "Flurry"] {
//!     let id = actor
//!         .add_action(Action::new(name, ActionKind::Attack).as_combo(), 1.0)
//!         .unwrap();
//!     actor.add_to_combo(id).unwrap();
//! }
//!
//! encounter.begin(&engine);
//! while !encounter.is_decided() && encounter.current_turn() < 200 {
//!     encounter.take_turn(&mut engine, hero, wolf).unwrap();
//!     if encounter.is_decided() {
//!         break;
//!     }
//!     encounter.take_turn(&mut engine, wolf, hero).unwrap();
//! }
//! encounter.end();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod action;
pub mod actor;
pub mod clock;
pub mod combo;
pub mod config;
pub mod damage;
pub mod dice;
pub mod effects;
pub mod encounter;
pub mod engine;
pub mod equipment;
pub mod error;
pub mod roll;
pub mod stats;

pub use action::{Action, ActionCatalog, ActionInstanceId, ActionKind, CatalogTable};
pub use actor::{Actor, ActorId};
pub use config::CombatConfig;
pub use effects::{Effect, EffectKind, StatusEffectRegistry};
pub use encounter::Encounter;
pub use engine::{ActionResult, CombatEngine, Combatant, ComboPreview};
pub use equipment::{EquipmentBonusProvider, Loadout};
pub use error::{CombatError, Result};
pub use roll::RollTier;
pub use stats::Attributes;

#[cfg(test)]
mod tests;
