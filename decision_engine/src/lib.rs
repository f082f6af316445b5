#![forbid(unsafe_code)]

//! Deterministic rules kernel for a turn-based executive decision game.
//!
//! No file I/O. Randomness only through the injected RNG of the
//! consequence engine.

/// Ruleset v1. Bound into every canonical hash.
pub const RULESET_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod resources;
pub mod events;
pub mod cards;
pub mod eligibility;
pub mod characters;
pub mod consequence;
pub mod state;
pub mod invariants;
pub mod hashing;
pub mod engine;

pub use error::EngineError;
