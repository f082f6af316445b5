//! Decision Engine v1: Invariant Checks
//!
//! `validate_invariants` panics on the first failure and is meant for tests
//! and debug assertions. Restore paths use `try_validate_invariants`.

use crate::arithmetic::is_valid_card_id;
use crate::state::GameState;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every check. Panics on the first failure.
pub fn validate_invariants(state: &GameState) {
    if let Err(message) = try_validate_invariants(state) {
        panic!("Invariant violation: {}", message);
    }
}

/// Non-panicking variant of `validate_invariants`.
/// Returns `Err(message)` on the first failure, `Ok(())` if all pass.
pub fn try_validate_invariants(state: &GameState) -> Result<(), String> {
    check_day_positive(state)?;
    check_resource_bounds(state)?;
    check_decision_count(state)?;
    check_history_days(state)?;
    check_history_card_ids(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn check_day_positive(state: &GameState) -> Result<(), String> {
    if state.current_day() < 1 {
        return Err(format!(
            "[INVARIANT:day_positive] current day is {}, must be >= 1",
            state.current_day()
        ));
    }
    Ok(())
}

fn check_resource_bounds(state: &GameState) -> Result<(), String> {
    for r in state.resources().iter() {
        if r.value() < r.min() || r.value() > r.max() {
            return Err(format!(
                "[INVARIANT:resource_bounds] {} is {}, outside [{}, {}]",
                r.kind(),
                r.value(),
                r.min(),
                r.max()
            ));
        }
    }
    Ok(())
}

fn check_decision_count(state: &GameState) -> Result<(), String> {
    let recorded = state.history().len();
    if state.total_decisions() as usize != recorded {
        return Err(format!(
            "[INVARIANT:decision_count] total_decisions={} but history has {} records",
            state.total_decisions(),
            recorded
        ));
    }
    Ok(())
}

/// Record days lie in [1, current_day] and never decrease.
fn check_history_days(state: &GameState) -> Result<(), String> {
    let mut previous = 1;
    for (i, record) in state.history().iter().enumerate() {
        if record.day < 1 || record.day > state.current_day() {
            return Err(format!(
                "[INVARIANT:history_days] record {} has day {}, outside [1, {}]",
                i,
                record.day,
                state.current_day()
            ));
        }
        if record.day < previous {
            return Err(format!(
                "[INVARIANT:history_days] record {} has day {} after day {}",
                i, record.day, previous
            ));
        }
        previous = record.day;
    }
    Ok(())
}

fn check_history_card_ids(state: &GameState) -> Result<(), String> {
    for (i, record) in state.history().iter().enumerate() {
        if !is_valid_card_id(&record.card_id) {
            return Err(format!(
                "[INVARIANT:card_id_format] record {} card id {:?} must match [A-Za-z0-9_-]+",
                i, record.card_id
            ));
        }
    }
    Ok(())
}
