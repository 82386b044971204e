//! Crate-level error type.

use thiserror::Error;

use crate::action::CatalogError;
use crate::actor::PoolError;
use crate::config::ConfigError;
use crate::dice::DiceError;
use crate::effects::EffectError;
use crate::encounter::EncounterError;

/// Any error raised by the combat core.
#[derive(Debug, Error)]
pub enum CombatError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid or missing catalog action.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Rejected pool change.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Rejected status effect.
    #[error(transparent)]
    Effect(#[from] EffectError),

    /// Invalid dice expression.
    #[error(transparent)]
    Dice(#[from] DiceError),

    /// Invalid encounter request.
    #[error(transparent)]
    Encounter(#[from] EncounterError),
}

/// Result alias for [`CombatError`].
pub type Result<T> = std::result::Result<T, CombatError>;
