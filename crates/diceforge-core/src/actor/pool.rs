//! Weighted action pool.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::{Action, ActionInstanceId, ActionRef, CatalogError};

/// Rejected pool mutations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Selection weight negative or not finite.
    #[error("selection weight must be finite and non-negative (got {0})")]
    InvalidWeight(f64),

    /// No pool entry has this instance id.
    #[error("no action instance {0} in pool")]
    UnknownInstance(ActionInstanceId),

    /// The action failed validation.
    #[error(transparent)]
    Malformed(#[from] CatalogError),
}

/// Why an action is in the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionSource {
    /// Learned or class-granted.
    Innate,
    /// Granted by gear carrying this tag.
    Gear(String),
}

/// One pool entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    /// The action copy.
    pub action: ActionRef,
    /// Relative selection weight.
    pub weight: f64,
    /// Origin of the entry.
    pub source: ActionSource,
}

/// An actor's usable actions with selection weights.
///
/// Duplicates are allowed; each copy gets its own [`ActionInstanceId`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionPool {
    entries: Vec<PoolEntry>,
    next_instance: u32,
}

impl ActionPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a copy of `action`.
    ///
    /// # Errors
    ///
    /// Rejects invalid weights and malformed actions without changing the pool.
    pub fn add(
        &mut self,
        action: Action,
        weight: f64,
        source: ActionSource,
    ) -> Result<ActionInstanceId, PoolError> {
        if !weight.is_finite() || weight < 0.0 || !(self.total_weight() + weight).is_finite() {
            return Err(PoolError::InvalidWeight(weight));
        }
        action.validate()?;
        let id = ActionInstanceId::new(self.next_instance);
        self.next_instance += 1;
        self.entries.push(PoolEntry {
            action: ActionRef { id, action },
            weight,
            source,
        });
        Ok(id)
    }

    /// Removes an entry.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::UnknownInstance`] if `id` is not in the pool.
    pub fn remove(&mut self, id: ActionInstanceId) -> Result<PoolEntry, PoolError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.action.id == id)
            .ok_or(PoolError::UnknownInstance(id))?;
        Ok(self.entries.remove(index))
    }

    /// Removes every entry granted by gear tagged `tag`, returning their ids.
    pub fn remove_gear(&mut self, tag: &str) -> Vec<ActionInstanceId> {
        let mut removed = Vec::new();
        self.entries.retain(|entry| {
            let from_tag = matches!(&entry.source, ActionSource::Gear(t) if t == tag);
            if from_tag {
                removed.push(entry.action.id);
            }
            !from_tag
        });
        removed
    }

    /// Looks up an entry's action.
    #[must_use]
    pub fn get(&self, id: ActionInstanceId) -> Option<&ActionRef> {
        self.entries
            .iter()
            .find(|entry| entry.action.id == id)
            .map(|entry| &entry.action)
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[PoolEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First non-combo damaging action, used as the basic action.
    #[must_use]
    pub fn first_basic(&self) -> Option<&ActionRef> {
        self.entries
            .iter()
            .map(|entry| &entry.action)
            .find(|aref| !aref.action.is_combo && aref.action.kind.deals_damage())
    }

    /// Sum of all selection weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    /// Picks an entry at random in proportion to its weight.
    ///
    /// Returns `None` if the pool is empty or every weight is zero.
    pub fn select_weighted<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ActionRef> {
        // Weights are scaled by the largest one so the sum stays finite.
        let largest = self
            .entries
            .iter()
            .map(|entry| entry.weight)
            .filter(|weight| weight.is_finite())
            .fold(0.0_f64, f64::max);
        if largest <= 0.0 {
            return None;
        }
        let scaled = |weight: f64| if weight.is_finite() { weight / largest } else { 0.0 };
        let total: f64 = self.entries.iter().map(|entry| scaled(entry.weight)).sum();
        let mut pick = rng.gen_range(0.0..total);
        for entry in &self.entries {
            let weight = scaled(entry.weight);
            if pick < weight {
                return Some(&entry.action);
            }
            pick -= weight;
        }
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.weight > 0.0)
            .map(|entry| &entry.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn jab() -> Action {
        Action::new("Jab", ActionKind::Attack)
    }

    #[test]
    fn duplicates_get_distinct_ids() {
        let mut pool = ActionPool::new();
        let a = pool.add(jab(), 1.0, ActionSource::Innate).unwrap();
        let b = pool.add(jab(), 1.0, ActionSource::Innate).unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(a).unwrap().action.name, "Jab");
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut pool = ActionPool::new();
        let a = pool.add(jab(), 1.0, ActionSource::Innate).unwrap();
        pool.remove(a).unwrap();
        let b = pool.add(jab(), 1.0, ActionSource::Innate).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_weight_is_rejected() {
        let mut pool = ActionPool::new();
        assert!(matches!(
            pool.add(jab(), -0.5, ActionSource::Innate),
            Err(PoolError::InvalidWeight(_))
        ));
        assert!(matches!(
            pool.add(jab(), f64::NAN, ActionSource::Innate),
            Err(PoolError::InvalidWeight(_))
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn malformed_action_is_rejected() {
        let mut pool = ActionPool::new();
        let broken = jab().with_length(-1.0);
        assert!(matches!(
            pool.add(broken, 1.0, ActionSource::Innate),
            Err(PoolError::Malformed(_))
        ));
    }

    #[test]
    fn remove_unknown_fails() {
        let mut pool = ActionPool::new();
        assert!(matches!(
            pool.remove(ActionInstanceId::new(9)),
            Err(PoolError::UnknownInstance(_))
        ));
    }

    #[test]
    fn remove_gear_only_touches_that_tag() {
        let mut pool = ActionPool::new();
        pool.add(jab(), 1.0, ActionSource::Innate).unwrap();
        let sword = pool
            .add(jab(), 1.0, ActionSource::Gear("sword".into()))
            .unwrap();
        pool.add(jab(), 1.0, ActionSource::Gear("shield".into()))
            .unwrap();

        assert_eq!(pool.remove_gear("sword"), vec![sword]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn first_basic_skips_combo_and_support_actions() {
        let mut pool = ActionPool::new();
        pool.add(jab().as_combo(), 1.0, ActionSource::Innate).unwrap();
        pool.add(Action::new("Mend", ActionKind::Heal), 1.0, ActionSource::Innate)
            .unwrap();
        let kick = pool
            .add(Action::new("Kick", ActionKind::Attack), 1.0, ActionSource::Innate)
            .unwrap();
        assert_eq!(pool.first_basic().map(|a| a.id), Some(kick));
    }

    #[test]
    fn weighted_selection_respects_zero_weights() {
        let mut pool = ActionPool::new();
        pool.add(jab(), 0.0, ActionSource::Innate).unwrap();
        let heavy = pool
            .add(Action::new("Haymaker", ActionKind::Attack), 3.0, ActionSource::Innate)
            .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            assert_eq!(pool.select_weighted(&mut rng).map(|a| a.id), Some(heavy));
        }
    }

    #[test]
    fn huge_weights_are_capped_at_add() {
        let mut pool = ActionPool::new();
        pool.add(jab(), 1e308, ActionSource::Innate).unwrap();
        assert!(matches!(
            pool.add(jab(), 1e308, ActionSource::Innate),
            Err(PoolError::InvalidWeight(_))
        ));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn huge_weights_select_without_overflow() {
        // Entries loaded from a save skip the running-total check in `add`.
        let mut pool = ActionPool::new();
        let first = pool.add(jab(), 1e308, ActionSource::Innate).unwrap();
        pool.entries.push(PoolEntry {
            action: ActionRef {
                id: ActionInstanceId::new(99),
                action: Action::new("Haymaker", ActionKind::Attack),
            },
            weight: 1e308,
            source: ActionSource::Innate,
        });
        assert!(!pool.total_weight().is_finite());

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut seen = Vec::new();
        for _ in 0..64 {
            let picked = pool.select_weighted(&mut rng).map(|a| a.id);
            assert!(picked.is_some());
            seen.push(picked);
        }
        assert!(seen.contains(&Some(first)));
        assert!(seen.contains(&Some(ActionInstanceId::new(99))));
    }

    #[test]
    fn weighted_selection_on_empty_or_weightless_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pool = ActionPool::new();
        assert!(pool.select_weighted(&mut rng).is_none());
        pool.add(jab(), 0.0, ActionSource::Innate).unwrap();
        assert!(pool.select_weighted(&mut rng).is_none());
    }
}
