#![forbid(unsafe_code)]

//! Decision Runtime v1
//!
//! Wraps the decision engine with configuration, card decks, save files,
//! sessions, replay and drift detection.
//!
//! No game rules live here. Every transition goes through the engine.

pub mod config;
pub mod deck;
pub mod snapshot;
pub mod snapshot_codec;
pub mod save_store;
pub mod session;
pub mod replay;
pub mod drift;
