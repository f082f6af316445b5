//! Replay orchestrator: play a recorded script on a fresh seeded engine.
//!
//! All game logic is delegated to the engine. Same deck, seed and script
//! give the same final state and hash.

use serde::{Deserialize, Serialize};

use decision_engine::cards::CardSupplier;
use decision_engine::engine::GameEngine;
use decision_engine::state::GameState;
use decision_engine::EngineError;

/// One scripted decision. `chaos` is added after resolving. `advance_day`
/// then ends the day, with the same depletion check a live session applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedDecision {
    pub card_id: String,
    pub choice_id: u32,
    #[serde(default)]
    pub chaos: i64,
    #[serde(default)]
    pub advance_day: bool,
}

impl ScriptedDecision {
    pub fn new(card_id: &str, choice_id: u32, advance_day: bool) -> Self {
        Self {
            card_id: card_id.to_string(),
            choice_id,
            chaos: 0,
            advance_day,
        }
    }

    pub fn with_chaos(mut self, chaos: i64) -> Self {
        self.chaos = chaos;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub state: GameState,
    pub hash: String,
    /// Every headline produced, in order.
    pub headlines: Vec<String>,
}

/// Run `script` against `deck` from a fresh game seeded with `seed`.
///
/// 1. Create a fresh engine
/// 2. Resolve each step, add its chaos, advance the day where it says so
/// 3. Return the final state, its canonical hash and the headlines
pub fn run_script<S>(
    deck: &S,
    seed: u64,
    script: &[ScriptedDecision],
) -> Result<ReplayOutcome, EngineError>
where
    S: CardSupplier + ?Sized,
{
    let mut engine = GameEngine::with_seed(seed);
    let mut headlines = Vec::new();

    for step in script {
        let card = deck
            .card(&step.card_id)
            .ok_or_else(|| EngineError::UnknownCard(step.card_id.clone()))?;
        let result = engine.resolve_choice(card, step.choice_id)?;
        headlines.extend(result.headlines);
        if step.chaos != 0 {
            engine.add_chaos(step.chaos);
        }
        if step.advance_day {
            engine.end_day();
        }
    }

    Ok(ReplayOutcome {
        state: engine.state().clone(),
        hash: engine.canonical_hash(),
        headlines,
    })
}

/// Rebuild a script from a state's history. A day boundary in the history
/// becomes `advance_day` on the last decision of the earlier day.
///
/// Days without decisions are not representable, and the history does not
/// say which decision added chaos. Only histories with a decision on every
/// day and no chaos replay exactly.
pub fn script_from_history(state: &GameState) -> Vec<ScriptedDecision> {
    let history = state.history();
    history
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let next_day = history
                .get(i + 1)
                .map_or(state.current_day(), |next| next.day);
            ScriptedDecision::new(&record.card_id, record.choice_id, next_day > record.day)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::CardDeck;
    use decision_engine::resources::ResourceType;
    use decision_engine::state::EndingType;

    fn script() -> Vec<ScriptedDecision> {
        vec![
            ScriptedDecision::new("NORMAL_001", 1, true),
            ScriptedDecision::new("ABSURD_001", 1, false),
            ScriptedDecision::new("CARD_001", 3, true),
        ]
    }

    #[test]
    fn script_applies_in_order() {
        let deck = CardDeck::bundled().unwrap();
        let outcome = run_script(&deck, 5, &script()).unwrap();

        assert_eq!(outcome.state.current_day(), 3);
        assert_eq!(outcome.state.total_decisions(), 3);
        // 50 + 5 + 20 - 10
        assert_eq!(outcome.state.resources().value(ResourceType::Popularity), 65);
        assert_eq!(outcome.state.history()[1].day, 2);
        assert!(outcome.headlines.len() >= 3);
    }

    #[test]
    fn same_seed_same_headlines() {
        let deck = CardDeck::bundled().unwrap();
        let a = run_script(&deck, 77, &script()).unwrap();
        let b = run_script(&deck, 77, &script()).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.headlines, b.headlines);
    }

    #[test]
    fn chaos_steps_reach_the_hash() {
        let deck = CardDeck::bundled().unwrap();
        let calm = run_script(&deck, 5, &script()).unwrap();

        let mut chaotic_script = script();
        chaotic_script[1] = chaotic_script[1].clone().with_chaos(600);
        chaotic_script[2] = chaotic_script[2].clone().with_chaos(400);
        let chaotic = run_script(&deck, 5, &chaotic_script).unwrap();

        assert_eq!(chaotic.state.chaos_score(), 1000);
        assert_ne!(chaotic.hash, calm.hash);
        assert_eq!(chaotic.state.determine_ending(), EndingType::TimeLoopParadox);
    }

    #[test]
    fn chaos_defaults_to_zero_in_json() {
        let step: ScriptedDecision =
            serde_json::from_str(r#"{ "card_id": "CARD_001", "choice_id": 2 }"#).unwrap();
        assert_eq!(step, ScriptedDecision::new("CARD_001", 2, false));
    }

    #[test]
    fn unknown_card_stops_the_script() {
        let deck = CardDeck::bundled().unwrap();
        let bad = vec![ScriptedDecision::new("NOPE_1", 1, false)];
        assert_eq!(
            run_script(&deck, 1, &bad).unwrap_err(),
            EngineError::UnknownCard("NOPE_1".to_string())
        );
    }

    #[test]
    fn history_round_trips_to_script() {
        let deck = CardDeck::bundled().unwrap();
        let outcome = run_script(&deck, 5, &script()).unwrap();
        assert_eq!(script_from_history(&outcome.state), script());
    }
}
