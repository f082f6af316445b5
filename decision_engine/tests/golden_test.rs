//! Golden determinism test: plays a fixed decision script and asserts the
//! canonical form and hash match the permanent ruleset v1 values.
//!
//! If this fails, the ruleset has changed. Bump RULESET_VERSION instead of
//! editing the expected values.

use std::fs;

use decision_engine::cards::{CardCategory, CardChoice, DecisionCard};
use decision_engine::engine::GameEngine;
use decision_engine::hashing::{canonical_hash, canonical_serialize};
use decision_engine::resources::ResourceType;
use decision_engine::RULESET_VERSION;

const EXPECTED_CANONICAL: &str = concat!(
    r#"{"ruleset_version":1,"current_day":3,"total_decisions":3,"phase":"EarlyGame","#,
    r#""chaos_score":25,"resources":{"popularity":60,"stability":35,"media_trust":50,"economic_health":60},"#,
    r#""history":["1/CRISIS_003/2","2/NORMAL_001/1","3/CRISIS_003/1"]}"#
);

fn load_expected_hash(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e))
        .trim()
        .to_string()
}

fn alien_contact() -> DecisionCard {
    DecisionCard::new("CRISIS_003", "ALIEN CONTACT", "They come in peace. Probably.")
        .with_category(CardCategory::Crisis)
        .with_choice(CardChoice::new(1, "Fire the lasers").with_effect(ResourceType::Stability, -25))
        .with_choice(
            CardChoice::new(2, "Welcome them")
                .with_effect(ResourceType::Popularity, 10)
                .with_followup("ALIEN_ALLIANCE_001"),
        )
}

fn budget() -> DecisionCard {
    DecisionCard::new("NORMAL_001", "Budget Proposal", "Everybody hates something about it.")
        .with_choice(
            CardChoice::new(1, "Sign it")
                .with_effect(ResourceType::Stability, 10)
                .with_effect(ResourceType::EconomicHealth, 10),
        )
        .with_choice(CardChoice::new(2, "Veto").with_effect(ResourceType::Stability, -10))
}

fn play(seed: u64) -> GameEngine {
    let mut engine = GameEngine::with_seed(seed);
    engine.resolve_choice(&alien_contact(), 2).unwrap();
    engine.advance_day();
    engine.resolve_choice(&budget(), 1).unwrap();
    engine.add_chaos(25);
    engine.advance_day();
    engine.resolve_choice(&alien_contact(), 1).unwrap();
    engine
}

#[test]
fn golden_canonical_form_matches() {
    assert_eq!(RULESET_VERSION, 1);
    let engine = play(2024);
    let canonical = String::from_utf8(canonical_serialize(engine.state())).unwrap();
    assert_eq!(canonical, EXPECTED_CANONICAL);
}

#[test]
fn golden_hash_matches() {
    let engine = play(2024);
    let expected = load_expected_hash("tests/golden/expected_hash.txt");
    let hash = canonical_hash(engine.state());
    assert_eq!(
        hash, expected,
        "GOLDEN TEST FAILED: ruleset v1 script produced a different hash.\n\
         Got:      {}\n\
         Expected: {}",
        hash, expected
    );
}

#[test]
fn golden_hash_is_seed_independent() {
    // Headlines depend on the seed; state does not.
    assert_eq!(play(1).canonical_hash(), play(2).canonical_hash());
}
