//! Seeded dice.
//!
//! [`Dice`] wraps a `ChaCha8Rng` so that every roll in an encounter is
//! reproducible from a single seed. Engine code rolls through the
//! [`DieRoller`] trait, which lets tests substitute a scripted sequence.
//!
//! # Example
//!
//! ```
//! use diceforge_core::dice::{Dice, DieRoller};
//!
//! let mut a = Dice::new(7);
//! let mut b = Dice::new(7);
//! assert_eq!(a.roll_die(20), b.roll_die(20));
//!
//! let total = a.roll(3, 6).unwrap();
//! assert!((3..=18).contains(&total));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

/// Invalid dice expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    /// Zero dice requested.
    #[error("at least one die is required")]
    NoDice,

    /// A die with fewer than two faces.
    #[error("a die needs at least two sides (got {0})")]
    TooFewSides(u32),
}

/// Source of single die results.
pub trait DieRoller {
    /// Rolls one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Deterministic dice backed by `ChaCha8Rng`.
#[derive(Debug, Clone)]
pub struct Dice {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Dice {
    /// Creates dice seeded with `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed these dice were created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Rewinds the generator to its initial state.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Rolls `count` dice with `sides` faces each and sums them.
    ///
    /// # Errors
    ///
    /// Returns [`DiceError::NoDice`] when `count` is zero and
    /// [`DiceError::TooFewSides`] when `sides` is below two.
    pub fn roll(&mut self, count: u32, sides: u32) -> Result<u32, DiceError> {
        if count == 0 {
            return Err(DiceError::NoDice);
        }
        if sides < 2 {
            return Err(DiceError::TooFewSides(sides));
        }
        let mut total = 0u32;
        for _ in 0..count {
            total = total.saturating_add(self.rng.gen_range(1..=sides));
        }
        Ok(total)
    }
}

impl DieRoller for Dice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.gen_range(1..=sides.max(2))
    }
}
