//! Decision Engine v1: Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 hashing of a `GameState`.
//! Produces byte-identical output across platforms.
//!
//! Rules:
//!   - ruleset_version is always the first field
//!   - resources keyed by snake-case name, in fixed resource order
//!   - history as compact `day/card_id/choice_id` strings, in play order
//!   - UTF-8 JSON, no whitespace, no float

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::state::GameState;
use crate::RULESET_VERSION;

/// Canonical serialization of GameState to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &GameState) -> Vec<u8> {
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &GameState) -> String {
    hex_digest(&canonical_serialize(state))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Field order: ruleset_version, current_day, total_decisions, phase,
///              chaos_score, resources, history
fn build_canonical_value(state: &GameState) -> Value {
    let mut resources = Map::new();
    for r in state.resources().iter() {
        resources.insert(r.kind().key().to_string(), Value::Number(r.value().into()));
    }

    let history: Vec<Value> = state
        .history()
        .iter()
        .map(|r| Value::String(r.to_compact()))
        .collect();

    let mut root = Map::new();
    root.insert(
        "ruleset_version".to_string(),
        Value::Number(RULESET_VERSION.into()),
    );
    root.insert(
        "current_day".to_string(),
        Value::Number(state.current_day().into()),
    );
    root.insert(
        "total_decisions".to_string(),
        Value::Number(state.total_decisions().into()),
    );
    root.insert(
        "phase".to_string(),
        Value::String(format!("{:?}", state.phase())),
    );
    root.insert(
        "chaos_score".to_string(),
        Value::Number(state.chaos_score().into()),
    );
    root.insert("resources".to_string(), Value::Object(resources));
    root.insert("history".to_string(), Value::Array(history));

    Value::Object(root)
}
