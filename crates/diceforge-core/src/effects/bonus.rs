//! Queued ACTION/ATTACK bonus groups.
//!
//! A bonus group grants a handful of bonuses for a limited number of uses.
//! Groups wait in a FIFO queue per keyword and only the front group of each
//! queue is active. The two keywords differ in when a use is spent:
//!
//! - [`BonusKeyword::Attack`]: spent by every roll attempt, hit or miss.
//! - [`BonusKeyword::Action`]: spent only by an action that succeeds.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::stats::{Attributes, StatKind};

/// When a bonus group's uses are spent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusKeyword {
    /// Spent only by successful actions.
    Action,
    /// Spent by every roll attempt.
    Attack,
}

/// What a single bonus modifies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusKind {
    /// Added to the roll total.
    Accuracy,
    /// Lowers the combo threshold.
    Combo,
    /// Raises an attribute.
    Stat(StatKind),
}

/// One bonus inside a group.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonus {
    /// What is modified.
    pub kind: BonusKind,
    /// By how much.
    pub value: i32,
}

impl Bonus {
    /// Creates a bonus.
    #[must_use]
    pub const fn new(kind: BonusKind, value: i32) -> Self {
        Self { kind, value }
    }
}

/// Bonuses granted together for `count` uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusGroup {
    /// Which queue the group joins.
    pub keyword: BonusKeyword,
    /// Uses remaining.
    pub count: u32,
    /// Bonuses granted while the group is at the front.
    pub bonuses: Vec<Bonus>,
}

impl BonusGroup {
    /// Creates a group with a single use.
    #[must_use]
    pub fn new(keyword: BonusKeyword, bonuses: Vec<Bonus>) -> Self {
        Self {
            keyword,
            count: 1,
            bonuses,
        }
    }

    /// Sets the number of uses.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Folds this group's bonuses into `totals`.
    fn accumulate(&self, totals: &mut BonusTotals) {
        for bonus in &self.bonuses {
            match bonus.kind {
                BonusKind::Accuracy => totals.accuracy = totals.accuracy.saturating_add(bonus.value),
                BonusKind::Combo => totals.combo = totals.combo.saturating_add(bonus.value),
                BonusKind::Stat(stat) => totals.stats.add_stat(stat, bonus.value),
            }
        }
    }
}

/// Sum of the bonuses currently in force.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusTotals {
    /// Roll bonus.
    pub accuracy: i32,
    /// Combo threshold reduction.
    pub combo: i32,
    /// Attribute bonuses.
    pub stats: Attributes,
}

/// FIFO of bonus groups sharing a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BonusQueue {
    groups: VecDeque<BonusGroup>,
}

impl BonusQueue {
    /// Appends a group. Groups with no uses are ignored.
    pub fn push(&mut self, group: BonusGroup) {
        if group.count > 0 {
            self.groups.push_back(group);
        }
    }

    /// The group currently in force.
    #[must_use]
    pub fn front(&self) -> Option<&BonusGroup> {
        self.groups.front()
    }

    /// Spends one use of the front group, dropping it when exhausted.
    ///
    /// Returns `true` if a use was spent.
    pub fn consume(&mut self) -> bool {
        let Some(front) = self.groups.front_mut() else {
            return false;
        };
        front.count = front.count.saturating_sub(1);
        if front.count == 0 {
            self.groups.pop_front();
        }
        true
    }

    /// Adds the front group's bonuses to `totals`.
    pub fn accumulate(&self, totals: &mut BonusTotals) {
        if let Some(front) = self.front() {
            front.accumulate(totals);
        }
    }

    /// Number of queued groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if no group is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drops every group.
    pub fn clear(&mut self) {
        self.groups.clear();
    }
}
