//! Test helpers: scripted dice and actor factories.

use std::collections::VecDeque;

use crate::action::{Action, ActionKind};
use crate::actor::{Actor, ActorId};
use crate::config::CombatConfig;
use crate::dice::DieRoller;
use crate::engine::CombatEngine;
use crate::stats::Attributes;

// =============================================================================
// Scripted dice
// =============================================================================

/// Dice that return a fixed sequence of faces.
///
/// Once the script runs out every roll returns 1, which is always a Fail
/// under the default bands.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    faces: VecDeque<u32>,
    rolled: usize,
}

impl ScriptedRolls {
    /// Creates dice that yield `faces` in order.
    pub fn new(faces: &[u32]) -> Self {
        Self {
            faces: faces.iter().copied().collect(),
            rolled: 0,
        }
    }

    /// Appends more faces.
    pub fn push(&mut self, face: u32) {
        self.faces.push_back(face);
    }

    /// Faces not yet rolled.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }

    /// Dice rolled so far.
    pub fn rolled(&self) -> usize {
        self.rolled
    }
}

impl DieRoller for ScriptedRolls {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rolled += 1;
        self.faces.pop_front().unwrap_or(1).clamp(1, sides.max(1))
    }
}

/// Engine with the default configuration rolling `faces`.
pub fn scripted_engine(faces: &[u32]) -> CombatEngine<ScriptedRolls> {
    CombatEngine::with_roller(CombatConfig::default(), ScriptedRolls::new(faces))
        .expect("default config is valid")
}

// =============================================================================
// Actor factories
// =============================================================================

/// Actor with the given attributes and 100 health.
pub fn spawn_fighter(id: u64, attributes: Attributes) -> Actor {
    Actor::new(ActorId::new(id), format!("Fighter {id}"), attributes, 100)
}

/// Actor whose combo sequence holds one attack per name, in order.
pub fn spawn_combo_fighter(id: u64, attributes: Attributes, names: &[&str]) -> Actor {
    let mut actor = spawn_fighter(id, attributes);
    for name in names {
        let instance = actor
            .add_action(Action::new(*name, ActionKind::Attack).as_combo(), 1.0)
            .expect("valid action");
        actor.add_to_combo(instance).expect("instance in pool");
    }
    actor
}

/// Names of the combo sequence in slot order.
pub fn combo_names(actor: &Actor) -> Vec<String> {
    actor
        .combo()
        .slots()
        .iter()
        .filter_map(|id| actor.pool().get(*id))
        .map(|aref| aref.action.name.clone())
        .collect()
}
