//! Cross-module tests for the combat core.
//!
//! # Test Structure
//!
//! - `determinism.rs`: same seed, same inputs, same fight
//! - `integration.rs`: end-to-end scenarios through the engine
//! - `properties.rs`: proptest invariants for effects, combos and damage
//! - `helpers.rs`: scripted dice and actor factories

mod determinism;
mod helpers;
mod properties;

// Re-export for convenience
pub use helpers::*;
