//! Combo sequencing.
//!
//! A [`ComboSequencer`] holds the player-curated order of combo actions as
//! instance ids into the actor's pool, plus a pointer to the slot that fires on
//! the next Combo-tier roll.
//!
//! # State machine
//!
//! - Fail or Basic roll: [`reset`](ComboSequencer::reset) returns the pointer
//!   to slot 0 and ends the chain.
//! - Combo roll: the slot under the pointer fires, then
//!   [`advance`](ComboSequencer::advance) applies the action's routing.
//!   Routing that would leave the pointer where it is instead completes a full
//!   lap, which is recorded in [`cycle`](ComboSequencer::cycle).
//! - Empty sequence: nothing fires; callers fall back to a basic action.
//!
//! # Invariants
//!
//! The pointer is always a valid index into a non-empty sequence, or zero
//! when the sequence is empty. Mutations keep the slots dense.
//!
//! # Example
//!
//! ```
//! use diceforge_core::action::{ActionInstanceId, ComboRouting};
//! use diceforge_core::combo::ComboSequencer;
//!
//! let mut combo = ComboSequencer::new();
//! for id in 0..3 {
//!     combo.push(ActionInstanceId::new(id));
//! }
//!
//! combo.advance(ComboRouting::Next);
//! assert_eq!(combo.step(), 1);
//! combo.advance(ComboRouting::Next);
//! combo.advance(ComboRouting::Next);
//! assert_eq!(combo.step(), 0);
//! assert_eq!(combo.cycle(), 1);
//! ```

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::action::{ActionInstanceId, ComboRouting};
use crate::config::ComboCurve;

/// Result of moving the combo pointer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboAdvance {
    /// The pointer moved.
    Moved {
        /// Slot before the move.
        from: usize,
        /// Slot after the move.
        to: usize,
        /// The move wrapped past the end or completed a full lap.
        wrapped: bool,
    },
    /// Routing ended the chain; the pointer is back at slot 0.
    Ended,
    /// The sequence is empty.
    Idle,
}

/// Ordered combo slots with a step pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComboSequencer {
    slots: Vec<ActionInstanceId>,
    step: usize,
    cycle: u32,
    active: bool,
}

impl ComboSequencer {
    /// Creates an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots in firing order.
    #[must_use]
    pub fn slots(&self) -> &[ActionInstanceId] {
        &self.slots
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot that fires on the next Combo roll.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Full laps completed in the current chain.
    #[must_use]
    pub const fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Returns `true` while a chain is in progress.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Instance under the pointer, if any.
    #[must_use]
    pub fn current(&self) -> Option<ActionInstanceId> {
        self.slots.get(self.step).copied()
    }

    /// Returns `true` if `id` occupies a slot.
    #[must_use]
    pub fn contains(&self, id: ActionInstanceId) -> bool {
        self.slots.contains(&id)
    }

    /// Appends a slot.
    pub fn push(&mut self, id: ActionInstanceId) {
        self.slots.push(id);
    }

    /// Removes every slot holding `id`.
    ///
    /// Removing the slot under the pointer resets the chain. Removing earlier
    /// slots shifts the pointer so it keeps its action.
    pub fn remove(&mut self, id: ActionInstanceId) -> bool {
        let before = self.slots.len();
        self.retain(|slot| slot != id);
        self.slots.len() != before
    }

    /// Keeps only the slots for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(ActionInstanceId) -> bool) {
        let step = self.step;
        let mut index = 0;
        let mut shift = 0;
        let mut hit_pointer = false;
        self.slots.retain(|slot| {
            let kept = keep(*slot);
            if !kept {
                if index == step {
                    hit_pointer = true;
                } else if index < step {
                    shift += 1;
                }
            }
            index += 1;
            kept
        });
        if hit_pointer || self.slots.is_empty() {
            self.reset();
        } else {
            self.step -= shift;
        }
        self.check_invariants();
    }

    /// Swaps two slots. The pointer stays on its slot index.
    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        if a >= self.slots.len() || b >= self.slots.len() {
            return false;
        }
        self.slots.swap(a, b);
        true
    }

    /// Drops every slot.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.reset();
    }

    /// Ends the chain and returns the pointer to slot 0.
    pub fn reset(&mut self) {
        self.step = 0;
        self.cycle = 0;
        self.active = false;
    }

    /// Moves the pointer after the current slot fired.
    ///
    /// Explicit routing targets are wrapped into range. If the target equals
    /// the current slot, the pointer completes a full lap instead of stalling.
    pub fn advance(&mut self, routing: ComboRouting) -> ComboAdvance {
        let len = self.slots.len();
        if len == 0 {
            return ComboAdvance::Idle;
        }
        let from = self.step;
        let raw = match routing {
            ComboRouting::Next => from + 1,
            ComboRouting::JumpTo(slot) => slot,
            ComboRouting::SkipNext => from + 2,
            ComboRouting::RepeatPrevious => from + len - 1,
            ComboRouting::LoopToStart => 0,
            ComboRouting::StopEarly => {
                trace!(from, "combo chain stopped early");
                self.reset();
                return ComboAdvance::Ended;
            }
        };
        let to = raw % len;
        let wrapped = to == from || raw >= len;
        if wrapped {
            self.cycle = self.cycle.saturating_add(1);
        }
        self.step = to;
        self.active = true;
        self.check_invariants();
        trace!(from, to, cycle = self.cycle, "combo pointer advanced");
        ComboAdvance::Moved { from, to, wrapped }
    }

    /// Damage amplification if the current slot fired now.
    ///
    /// Slot 0 is unamplified; slot `s` scales by `amplifier(technique)^s`
    /// times `multiplier` (the combo-amplifier effect).
    #[must_use]
    pub fn amplification(&self, curve: &ComboCurve, technique: i32, multiplier: f64) -> f64 {
        if self.step == 0 {
            return 1.0;
        }
        curve.amplification(technique, self.step) * multiplier
    }

    fn check_invariants(&self) {
        assert!(
            self.step < self.slots.len() || (self.slots.is_empty() && self.step == 0),
            "combo step {} out of range for {} slots",
            self.step,
            self.slots.len()
        );
    }
}
