//! Decision Engine v1: Engine
//!
//! Top-level orchestrator. Owns the game state, the consequence engine and
//! the event bus, and runs the per-decision protocol in order:
//!   1. Validate the card and look up the choice
//!   2. Apply effects and build the consequence result
//!   3. Record the decision
//!   4. Deliver queued events to subscribers
//!
//! Every mutating call delivers its events before returning.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info};

use crate::cards::{CardChoice, CardSupplier, DecisionCard};
use crate::consequence::{ConsequenceEngine, ConsequenceResult};
use crate::eligibility::{is_eligible_in_scene, SceneContext};
use crate::error::EngineError;
use crate::events::{EventBus, GameEvent, SubscriptionId};
use crate::hashing::canonical_hash;
use crate::resources::CrisisLevel;
use crate::state::{EndingType, GamePhase, GameStats, GameState};

pub struct GameEngine<R: Rng = StdRng> {
    state: GameState,
    consequences: ConsequenceEngine<R>,
    bus: EventBus,
    pending: Vec<GameEvent>,
}

impl GameEngine<StdRng> {
    /// Fresh game with a seeded consequence engine.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(ConsequenceEngine::with_seed(seed))
    }
}

impl<R: Rng> GameEngine<R> {
    pub fn new(consequences: ConsequenceEngine<R>) -> Self {
        Self {
            state: GameState::new(),
            consequences,
            bus: EventBus::new(),
            pending: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn consequences(&self) -> &ConsequenceEngine<R> {
        &self.consequences
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Apply `choice` without recording it. The pairing with `card` is not
    /// checked.
    pub fn process_choice(&mut self, card: &DecisionCard, choice: &CardChoice) -> ConsequenceResult {
        let day = self.state.current_day();
        let result = self.consequences.process_choice(
            self.state.resources_mut(),
            day,
            card,
            choice,
            &mut self.pending,
        );
        self.flush();
        result
    }

    pub fn record_decision(&mut self, card_id: &str, choice_id: u32) {
        self.state.record_decision(card_id, choice_id);
    }

    /// Validate, apply, record, then notify.
    pub fn resolve_choice(
        &mut self,
        card: &DecisionCard,
        choice_id: u32,
    ) -> Result<ConsequenceResult, EngineError> {
        card.validate()?;
        let choice = card.choice(choice_id).ok_or_else(|| EngineError::UnknownChoice {
            card_id: card.id.clone(),
            choice_id,
        })?;

        let day = self.state.current_day();
        let result = self.consequences.process_choice(
            self.state.resources_mut(),
            day,
            card,
            choice,
            &mut self.pending,
        );
        self.state.record_decision(&card.id, choice_id);
        debug!(
            day,
            card_id = %card.id,
            choice_id,
            decisions = self.state.total_decisions(),
            "decision recorded"
        );
        self.flush();
        Ok(result)
    }

    pub fn advance_day(&mut self) {
        self.state.advance_day(&mut self.pending);
        info!(day = self.state.current_day(), phase = ?self.state.phase(), "day advanced");
        self.flush();
    }

    /// Advance the day, then fall if any resource is depleted. Returns
    /// true when the game is over.
    pub fn end_day(&mut self) -> bool {
        self.state.advance_day(&mut self.pending);
        if self.state.resources().crisis_level() == CrisisLevel::GameOver {
            self.state.mark_game_over(&mut self.pending);
        }
        info!(day = self.state.current_day(), phase = ?self.state.phase(), "day ended");
        self.flush();
        self.state.phase() == GamePhase::GameOver
    }

    pub fn add_chaos(&mut self, amount: i64) {
        self.state.add_chaos(amount);
    }

    pub fn mark_game_over(&mut self) {
        self.state.mark_game_over(&mut self.pending);
        self.flush();
    }

    pub fn determine_ending(&self) -> EndingType {
        self.state.determine_ending()
    }

    pub fn stats(&self) -> GameStats {
        self.state.stats()
    }

    /// Cards from `supplier` that may be shown now, in supplier order.
    pub fn eligible_cards<'a, S>(
        &self,
        supplier: &'a S,
        scene: &dyn SceneContext,
    ) -> Vec<&'a DecisionCard>
    where
        S: CardSupplier + ?Sized,
    {
        supplier
            .cards()
            .iter()
            .filter(|card| is_eligible_in_scene(card, &self.state, scene))
            .collect()
    }

    /// Replace the game state. Subscribers and consequence history stay.
    /// A state with a depleted resource comes back as `GameOver`.
    pub fn restore(&mut self, state: GameState) {
        info!(
            day = state.current_day(),
            decisions = state.total_decisions(),
            "state restored"
        );
        self.state = state;
        if self.state.resources().crisis_level() == CrisisLevel::GameOver {
            self.state.mark_game_over(&mut self.pending);
        }
        self.flush();
    }

    pub fn canonical_hash(&self) -> String {
        canonical_hash(&self.state)
    }

    fn flush(&mut self) {
        self.bus.dispatch(&mut self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardCategory, CardRequirements};
    use crate::eligibility::OpenScene;
    use crate::resources::ResourceType;
    use std::sync::{Arc, Mutex};

    fn crisis_card() -> DecisionCard {
        DecisionCard::new("CRISIS_003", "ALIEN CONTACT", "They come in peace. Probably.")
            .with_category(CardCategory::Crisis)
            .with_choice(CardChoice::new(1, "Fire the lasers").with_effect(ResourceType::Stability, -25))
            .with_choice(
                CardChoice::new(2, "Welcome them")
                    .with_effect(ResourceType::Popularity, 10)
                    .with_followup("ALIEN_ALLIANCE_001"),
            )
    }

    fn recorder(engine: &mut GameEngine) -> Arc<Mutex<Vec<GameEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        seen
    }

    #[test]
    fn resolve_choice_records_and_notifies_in_order() {
        let mut engine = GameEngine::with_seed(1);
        let seen = recorder(&mut engine);

        let result = engine.resolve_choice(&crisis_card(), 1).unwrap();

        assert_eq!(engine.state().total_decisions(), 1);
        assert_eq!(engine.state().resources().value(ResourceType::Stability), 25);
        assert!(result.cascade_triggered);
        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0],
            GameEvent::ResourceChanged {
                kind: ResourceType::Stability,
                new_value: 25,
                change: -25
            }
        );
        assert!(matches!(seen.last(), Some(GameEvent::ConsequenceGenerated(_))));
    }

    #[test]
    fn resolve_choice_rejects_unknown_choice() {
        let mut engine = GameEngine::with_seed(1);
        let err = engine.resolve_choice(&crisis_card(), 9).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownChoice {
                card_id: "CRISIS_003".to_string(),
                choice_id: 9
            }
        );
        assert_eq!(engine.state().total_decisions(), 0);
    }

    #[test]
    fn resolve_choice_rejects_invalid_card() {
        let mut engine = GameEngine::with_seed(1);
        let card = DecisionCard::new("EMPTY", "Nothing", "No options");
        assert_eq!(
            engine.resolve_choice(&card, 1),
            Err(EngineError::CardHasNoChoices("EMPTY".to_string()))
        );
    }

    #[test]
    fn process_choice_does_not_record() {
        let mut engine = GameEngine::with_seed(1);
        let card = crisis_card();
        let result = engine.process_choice(&card, &card.choices[1]);
        assert_eq!(result.followup_cards, vec!["ALIEN_ALLIANCE_001".to_string()]);
        assert_eq!(engine.state().total_decisions(), 0);
        engine.record_decision(&card.id, 2);
        assert_eq!(engine.state().history().len(), 1);
    }

    #[test]
    fn advance_day_notifies_day_and_phase() {
        let mut engine = GameEngine::with_seed(1);
        let seen = recorder(&mut engine);
        engine.advance_day();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                GameEvent::DayChanged { day: 2 },
                GameEvent::PhaseChanged {
                    old: GamePhase::Introduction,
                    new: GamePhase::EarlyGame
                },
            ]
        );
    }

    #[test]
    fn end_day_falls_on_depleted_resource() {
        let mut engine = GameEngine::with_seed(1);
        assert!(!engine.end_day());
        assert_eq!(engine.state().phase(), GamePhase::EarlyGame);

        let mut state = GameState::new();
        state.resources_mut().set_value(ResourceType::EconomicHealth, 0);
        engine.restore(state);
        assert!(engine.end_day());
        assert_eq!(engine.state().phase(), GamePhase::GameOver);
        assert!(engine.end_day());
    }

    #[test]
    fn restore_of_depleted_state_is_game_over() {
        let mut engine = GameEngine::with_seed(1);
        let seen = recorder(&mut engine);
        let mut state = GameState::new();
        state.resources_mut().set_value(ResourceType::Popularity, 0);
        engine.restore(state);

        assert_eq!(engine.state().phase(), GamePhase::GameOver);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![GameEvent::PhaseChanged {
                old: GamePhase::Introduction,
                new: GamePhase::GameOver
            }]
        );
    }

    #[test]
    fn depletion_emits_crisis_then_game_over() {
        let mut engine = GameEngine::with_seed(1);
        let seen = recorder(&mut engine);
        let card = DecisionCard::new("SCANDAL_9", "Leak", "Everything leaks")
            .with_choice(CardChoice::new(1, "Shrug").with_effect(ResourceType::MediaTrust, -80));
        engine.resolve_choice(&card, 1).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(
            &seen[..3],
            &[
                GameEvent::ResourceChanged {
                    kind: ResourceType::MediaTrust,
                    new_value: 0,
                    change: -50
                },
                GameEvent::CrisisTriggered {
                    kind: ResourceType::MediaTrust,
                    level: CrisisLevel::Critical
                },
                GameEvent::GameOver,
            ]
        );
    }

    #[test]
    fn eligible_cards_filters_by_history() {
        let mut engine = GameEngine::with_seed(1);
        let followup = DecisionCard::new("ALIEN_ALLIANCE_001", "Alliance", "Sign the treaty?")
            .with_choice(CardChoice::new(1, "Sign"))
            .with_requirements(CardRequirements {
                required_previous_cards: Some(vec!["CRISIS_003".to_string()]),
                ..Default::default()
            });
        let deck = vec![crisis_card(), followup];

        let ids: Vec<&str> = engine
            .eligible_cards(&deck, &OpenScene)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["CRISIS_003"]);

        engine.resolve_choice(&deck[0], 2).unwrap();
        assert_eq!(engine.eligible_cards(&deck, &OpenScene).len(), 2);
    }

    #[test]
    fn same_seed_same_hash() {
        let play = || {
            let mut engine = GameEngine::with_seed(99);
            engine.resolve_choice(&crisis_card(), 2).unwrap();
            engine.advance_day();
            engine.add_chaos(15);
            engine.canonical_hash()
        };
        assert_eq!(play(), play());
    }

    #[test]
    fn restore_replaces_state() {
        let mut engine = GameEngine::with_seed(1);
        engine.resolve_choice(&crisis_card(), 1).unwrap();
        engine.restore(GameState::new());
        assert_eq!(engine.state(), &GameState::new());
        assert_eq!(engine.consequences().history().len(), 1);
    }
}
