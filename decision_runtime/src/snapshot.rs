//! Save snapshot: the persisted subset of a game.
//!
//! Not persisted: card pool state and RNG state. Restoring recomputes
//! the phase from the day.

use std::time::{SystemTime, UNIX_EPOCH};

use decision_engine::resources::{ResourceMap, ResourceStore, ResourceType};
use decision_engine::state::{DecisionRecord, GameState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSnapshot {
    pub current_day: u32,
    pub total_decisions: u32,
    pub chaos_score: i64,
    /// All four resources.
    pub resources: ResourceMap<i32>,
    pub history: Vec<DecisionRecord>,
    /// Unix seconds.
    pub saved_at: u64,
}

impl SaveSnapshot {
    /// Capture `state`, stamped with the current wall-clock time.
    pub fn capture(state: &GameState) -> Self {
        let saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::capture_at(state, saved_at)
    }

    pub fn capture_at(state: &GameState, saved_at: u64) -> Self {
        Self {
            current_day: state.current_day(),
            total_decisions: state.total_decisions(),
            chaos_score: state.chaos_score(),
            resources: state.resources().values(),
            history: state.history().to_vec(),
            saved_at,
        }
    }

    /// Rebuild a game state. Resources go through `set_value`, so trends
    /// start out `Stable`.
    pub fn restore(&self) -> GameState {
        let mut store = ResourceStore::new();
        for kind in ResourceType::ALL {
            if let Some(&value) = self.resources.get(kind) {
                store.set_value(kind, value);
            }
        }
        GameState::from_parts(
            self.current_day,
            self.total_decisions,
            self.chaos_score,
            self.history.clone(),
            store,
        )
    }
}
