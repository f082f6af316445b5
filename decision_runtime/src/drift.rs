//! Drift detection: determinism verification and state comparison.
//!
//! All deltas are i64, `b - a`.

use thiserror::Error;

use decision_engine::cards::CardSupplier;
use decision_engine::resources::{ResourceMap, ResourceType};
use decision_engine::state::{DecisionRecord, GameState};
use decision_engine::EngineError;

use crate::replay::{self, ScriptedDecision};

#[derive(Debug, Error)]
pub enum DriftError {
    #[error("replay failed: {0}")]
    Replay(#[from] EngineError),

    #[error("determinism failure: run 1 hashed {first}, run 2 hashed {second}")]
    HashMismatch { first: String, second: String },
}

/// Run `script` twice from the same seed and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism<S>(
    deck: &S,
    seed: u64,
    script: &[ScriptedDecision],
) -> Result<String, DriftError>
where
    S: CardSupplier + ?Sized,
{
    let first = replay::run_script(deck, seed, script)?.hash;
    let second = replay::run_script(deck, seed, script)?.hash;
    if first != second {
        return Err(DriftError::HashMismatch { first, second });
    }
    Ok(first)
}

/// Compare two states field by field.
pub fn compare_states(a: &GameState, b: &GameState) -> DriftReport {
    let mut resource_deltas = ResourceMap::new();
    for kind in ResourceType::ALL {
        let delta = i64::from(b.resources().value(kind)) - i64::from(a.resources().value(kind));
        resource_deltas.insert(kind, delta);
    }

    let health_a = i64::from(a.resources().overall_health());
    let health_b = i64::from(b.resources().overall_health());

    DriftReport {
        day_a: i64::from(a.current_day()),
        day_b: i64::from(b.current_day()),
        day_delta: i64::from(b.current_day()) - i64::from(a.current_day()),
        decisions_a: i64::from(a.total_decisions()),
        decisions_b: i64::from(b.total_decisions()),
        decisions_delta: i64::from(b.total_decisions()) - i64::from(a.total_decisions()),
        chaos_a: a.chaos_score(),
        chaos_b: b.chaos_score(),
        chaos_delta: b.chaos_score().saturating_sub(a.chaos_score()),
        resource_deltas,
        overall_health_a: health_a,
        overall_health_b: health_b,
        overall_health_delta: health_b - health_a,
        new_decisions: b.history().iter().skip(a.history().len()).cloned().collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub day_a: i64,
    pub day_b: i64,
    pub day_delta: i64,
    pub decisions_a: i64,
    pub decisions_b: i64,
    pub decisions_delta: i64,
    pub chaos_a: i64,
    pub chaos_b: i64,
    pub chaos_delta: i64,
    pub resource_deltas: ResourceMap<i64>,
    pub overall_health_a: i64,
    pub overall_health_b: i64,
    pub overall_health_delta: i64,
    /// History entries of `b` beyond the length of `a`'s history.
    pub new_decisions: Vec<DecisionRecord>,
}

impl DriftReport {
    /// True when no numeric field moved and `b` has no extra history.
    pub fn is_empty(&self) -> bool {
        self.day_delta == 0
            && self.decisions_delta == 0
            && self.chaos_delta == 0
            && self.resource_deltas.values().all(|&d| d == 0)
            && self.new_decisions.is_empty()
    }
}
