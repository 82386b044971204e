//! Action definitions and the action catalog.
//!
//! An [`Action`] is plain data owned by an [`ActionCatalog`]. Actors copy the
//! actions they can use into their pool, where each copy is tagged with an
//! [`ActionInstanceId`] so duplicates stay distinguishable.
//!
//! # Example
//!
//! ```
//! use diceforge_core::action::{Action, ActionCatalog, ActionKind, CatalogTable, ComboRouting};
//!
//! let mut catalog = CatalogTable::new();
//! catalog
//!     .insert(
//!         Action::new("Riposte", ActionKind::Attack)
//!             .with_multiplier(1.4)
//!             .as_combo()
//!             .with_routing(ComboRouting::LoopToStart)
//!             .with_tag("sword"),
//!     )
//!     .unwrap();
//!
//! assert!(catalog.get("Riposte").is_some());
//! assert_eq!(catalog.tagged("sword").len(), 1);
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::effects::{BonusGroup, Effect};

// =============================================================================
// Identifiers
// =============================================================================

/// Identifier of one action copy inside an actor's pool.
///
/// Instance ids are assigned by the pool in increasing order and never reused
/// while the pool lives, so two copies of the same named action never compare
/// equal.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionInstanceId(u32);

impl ActionInstanceId {
    /// Wraps a raw id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw id value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ActionInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionInstanceId({})", self.0)
    }
}

impl fmt::Display for ActionInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ActionInstanceId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// Action
// =============================================================================

/// Broad behaviour class of an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionKind {
    /// Deals damage to the target.
    #[default]
    Attack,
    /// Restores the actor's health.
    Heal,
    /// Grants effects to the actor.
    Buff,
    /// Grants effects to the target.
    Debuff,
    /// Deals damage to the target.
    Spell,
    /// Environment interaction.
    Interact,
    /// Repositioning.
    Move,
    /// Item use.
    UseItem,
}

impl ActionKind {
    /// Returns `true` for kinds that go through the damage pipeline.
    #[must_use]
    pub const fn deals_damage(self) -> bool {
        matches!(self, Self::Attack | Self::Spell)
    }

    /// Returns `true` for kinds whose granted effects land on the target.
    #[must_use]
    pub const fn targets_opponent(self) -> bool {
        matches!(self, Self::Attack | Self::Spell | Self::Debuff)
    }
}

/// Where the combo pointer goes after this action executes as a combo step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ComboRouting {
    /// Advance by one slot.
    #[default]
    Next,
    /// Branch to a 0-based slot, wrapped into range.
    JumpTo(usize),
    /// Skip the following slot.
    SkipNext,
    /// Go back one slot.
    RepeatPrevious,
    /// Return to the first slot.
    LoopToStart,
    /// End the chain and reset to the first slot.
    StopEarly,
}

bitflags! {
    /// Status effects an action inflicts on a damaging hit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InflictFlags: u8 {
        /// Bleed (poison marked as bleeding).
        const BLEED = 1 << 0;
        /// Weaken.
        const WEAKEN = 1 << 1;
        /// Poison.
        const POISON = 1 << 2;
        /// Burn.
        const BURN = 1 << 3;
        /// Stun.
        const STUN = 1 << 4;
    }
}

impl Default for InflictFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A catalog action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    /// Display name; unique within a catalog.
    pub name: String,
    /// Behaviour class.
    pub kind: ActionKind,
    /// Base heal amount, or flat potency for non-damaging kinds.
    pub base_value: i32,
    /// Damage multiplier applied in the damage pipeline.
    pub damage_multiplier: f64,
    /// Turns the action consumes.
    pub length: f64,
    /// Eligible for combo sequences.
    pub is_combo: bool,
    /// Combo pointer movement after execution.
    pub routing: ComboRouting,
    /// Effects inflicted on a damaging hit.
    pub inflicts: InflictFlags,
    /// Effects granted on execution.
    pub grants: Vec<Effect>,
    /// Bonus groups queued on the actor after execution.
    pub bonus_groups: Vec<BonusGroup>,
    /// Weapon-type, class or environment tags.
    pub tags: Vec<String>,
}

impl Default for Action {
    fn default() -> Self {
        Self::basic_attack()
    }
}

impl Action {
    /// Creates an action with neutral numbers.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            base_value: 0,
            damage_multiplier: 1.0,
            length: 1.0,
            is_combo: false,
            routing: ComboRouting::Next,
            inflicts: InflictFlags::empty(),
            grants: Vec::new(),
            bonus_groups: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// The built-in non-combo attack used when nothing else is available.
    #[must_use]
    pub fn basic_attack() -> Self {
        Self::new("Strike", ActionKind::Attack)
    }

    /// Sets the base value.
    #[must_use]
    pub fn with_base_value(mut self, base_value: i32) -> Self {
        self.base_value = base_value;
        self
    }

    /// Sets the damage multiplier.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.damage_multiplier = multiplier;
        self
    }

    /// Sets the length in turns.
    #[must_use]
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }

    /// Marks the action as combo-eligible.
    #[must_use]
    pub fn as_combo(mut self) -> Self {
        self.is_combo = true;
        self
    }

    /// Sets combo routing.
    #[must_use]
    pub fn with_routing(mut self, routing: ComboRouting) -> Self {
        self.routing = routing;
        self
    }

    /// Adds inflicted effects.
    #[must_use]
    pub fn inflicting(mut self, flags: InflictFlags) -> Self {
        self.inflicts |= flags;
        self
    }

    /// Adds a granted effect.
    #[must_use]
    pub fn granting(mut self, effect: Effect) -> Self {
        self.grants.push(effect);
        self
    }

    /// Adds a bonus group queued after execution.
    #[must_use]
    pub fn queueing(mut self, group: BonusGroup) -> Self {
        self.bonus_groups.push(group);
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns `true` if the action carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Checks that the numeric fields are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Malformed`] for an empty name, a negative or
    /// non-finite multiplier, or a negative or non-finite length.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let reason = if self.name.trim().is_empty() {
            Some("name is empty")
        } else if !self.damage_multiplier.is_finite() || self.damage_multiplier < 0.0 {
            Some("damage multiplier must be finite and non-negative")
        } else if !self.length.is_finite() || self.length < 0.0 {
            Some("length must be finite and non-negative")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(CatalogError::Malformed {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// An action copy held in a pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRef {
    /// Instance id within the owning pool.
    pub id: ActionInstanceId,
    /// The action data.
    pub action: Action,
}

// =============================================================================
// Catalog
// =============================================================================

/// Catalog lookup failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog JSON could not be parsed.
    #[error("failed to parse action catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two actions share a name.
    #[error("duplicate action name {0:?}")]
    Duplicate(String),

    /// An action failed validation.
    #[error("malformed action {name:?}: {reason}")]
    Malformed {
        /// Action name.
        name: String,
        /// What is wrong.
        reason: &'static str,
    },

    /// A name lookup found nothing.
    #[error("unknown action {0:?}")]
    Unknown(String),
}

/// Read-only source of action definitions.
pub trait ActionCatalog {
    /// Looks up an action by name.
    fn get(&self, name: &str) -> Option<&Action>;

    /// Actions carrying `tag`, in a stable order.
    fn tagged(&self, tag: &str) -> Vec<&Action>;

    /// Looks up an action by name, failing if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Unknown`] when no action has that name.
    fn require(&self, name: &str) -> Result<&Action, CatalogError> {
        self.get(name)
            .ok_or_else(|| CatalogError::Unknown(name.to_owned()))
    }
}

/// Catalog backed by a name-ordered map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogTable {
    actions: BTreeMap<String, Action>,
}

impl CatalogTable {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of actions.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON, invalid actions or duplicate names.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let actions: Vec<Action> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for action in actions {
            table.insert(action)?;
        }
        Ok(table)
    }

    /// Adds an action.
    ///
    /// # Errors
    ///
    /// Fails if the action is invalid or its name is taken.
    pub fn insert(&mut self, action: Action) -> Result<(), CatalogError> {
        action.validate()?;
        if self.actions.contains_key(&action.name) {
            return Err(CatalogError::Duplicate(action.name));
        }
        self.actions.insert(action.name.clone(), action);
        Ok(())
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ActionCatalog for CatalogTable {
    fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    fn tagged(&self, tag: &str) -> Vec<&Action> {
        self.actions.values().filter(|a| a.has_tag(tag)).collect()
    }
}
