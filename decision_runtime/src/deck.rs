//! Card deck: card definitions loaded from JSON, plus played-card tracking
//! for random draws.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use rand::Rng;
use thiserror::Error;
use tracing::debug;

use decision_engine::cards::{CardSupplier, DecisionCard};
use decision_engine::characters::{Character, CharacterRoster};
use decision_engine::eligibility::{is_eligible_in_scene, SceneContext};
use decision_engine::state::GameState;
use decision_engine::EngineError;

/// Sample deck shipped with the crate.
pub const BUNDLED_DECK: &str = include_str!("../data/cards.json");
/// Sample cast shipped with the crate.
pub const BUNDLED_CHARACTERS: &str = include_str!("../data/characters.json");

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("invalid card JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid card: {0}")]
    InvalidCard(#[from] EngineError),

    #[error("card {0:?} defined more than once")]
    DuplicateCard(String),

    #[error("deck has no cards")]
    Empty,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone)]
pub struct CardDeck {
    cards: Vec<DecisionCard>,
    played: BTreeSet<String>,
}

impl CardDeck {
    /// Every card is validated; ids must be unique.
    pub fn new(cards: Vec<DecisionCard>) -> Result<Self, DeckError> {
        if cards.is_empty() {
            return Err(DeckError::Empty);
        }
        let mut seen = BTreeSet::new();
        for card in &cards {
            card.validate()?;
            if !seen.insert(card.id.as_str()) {
                return Err(DeckError::DuplicateCard(card.id.clone()));
            }
        }
        Ok(Self {
            cards,
            played: BTreeSet::new(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, DeckError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DeckError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn bundled() -> Result<Self, DeckError> {
        Self::from_json_str(BUNDLED_DECK)
    }

    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn played_cards(&self) -> usize {
        self.played.len()
    }

    pub fn is_played(&self, id: &str) -> bool {
        self.played.contains(id)
    }

    /// Returns false for ids not in the deck.
    pub fn mark_played(&mut self, id: &str) -> bool {
        if self.card(id).is_none() {
            return false;
        }
        self.played.insert(id.to_string());
        true
    }

    pub fn reset_played(&mut self) {
        self.played.clear();
    }

    /// Uniform draw over unplayed cards. Once every card has been played,
    /// draws from the whole deck again.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> &DecisionCard {
        let unplayed: Vec<&DecisionCard> = self
            .cards
            .iter()
            .filter(|c| !self.played.contains(&c.id))
            .collect();
        if unplayed.is_empty() {
            debug!(total = self.cards.len(), "all cards played, reshuffling");
            return &self.cards[rng.gen_range(0..self.cards.len())];
        }
        unplayed[rng.gen_range(0..unplayed.len())]
    }

    /// Uniform draw over unplayed cards eligible right now. `None` if there
    /// are none.
    pub fn draw_eligible<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        scene: &dyn SceneContext,
        rng: &mut R,
    ) -> Option<&DecisionCard> {
        let candidates = self.eligible_unplayed(state, scene);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    /// Unplayed cards eligible right now, in deck order.
    pub fn eligible_unplayed(&self, state: &GameState, scene: &dyn SceneContext) -> Vec<&DecisionCard> {
        self.cards
            .iter()
            .filter(|c| !self.played.contains(&c.id))
            .filter(|c| is_eligible_in_scene(c, state, scene))
            .collect()
    }
}

impl CardSupplier for CardDeck {
    fn card(&self, id: &str) -> Option<&DecisionCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn cards(&self) -> &[DecisionCard] {
        &self.cards
    }
}

/// Build a roster from a JSON array of characters.
pub fn roster_from_json_str(json: &str) -> Result<CharacterRoster, DeckError> {
    let characters: Vec<Character> = serde_json::from_str(json)?;
    let mut roster = CharacterRoster::new();
    for character in characters {
        roster.add(character);
    }
    Ok(roster)
}

pub fn bundled_roster() -> Result<CharacterRoster, DeckError> {
    roster_from_json_str(BUNDLED_CHARACTERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use decision_engine::cards::{CardChoice, UrgencyLevel};
    use decision_engine::characters::DialogueType;
    use decision_engine::eligibility::OpenScene;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(id: &str) -> DecisionCard {
        DecisionCard::new(id, id, "test").with_choice(CardChoice::new(1, "ok"))
    }

    #[test]
    fn bundled_deck_loads_and_validates() {
        let deck = CardDeck::bundled().unwrap();
        assert!(deck.total_cards() >= 10);
        assert!(deck.card("CRISIS_003").is_some());
        assert!(deck.card("ALIEN_ALLIANCE_001").is_some());
        assert_eq!(deck.played_cards(), 0);
    }

    #[test]
    fn bundled_roster_loads() {
        let roster = bundled_roster().unwrap();
        let rex = roster.get("IGUANA_KING").unwrap();
        assert_eq!(rex.name, "Rex Scaleston III");
        assert_eq!(rex.loyalty(), 50);
        assert_eq!(rex.dialogue[&DialogueType::Greeting].len(), 3);
        assert!(roster.get("EXECUTIVE_45").is_some());
    }

    #[test]
    fn bundled_deck_has_full_catalogue() {
        let deck = CardDeck::bundled().unwrap();
        assert_eq!(deck.total_cards(), 17);
        for id in ["CHARACTER_002", "SCANDAL_002", "ABSURD_002", "CHARACTER_003", "NORMAL_002", "NORMAL_003"] {
            assert!(deck.card(id).is_some(), "{id} missing");
        }
        let resignation = deck.card("SCANDAL_002").unwrap();
        assert_eq!(resignation.urgency, UrgencyLevel::Elevated);
        assert_eq!(resignation.choices.len(), 3);
    }

    #[test]
    fn character_cards_wait_for_their_character() {
        let deck = CardDeck::bundled().unwrap();
        let mut roster = bundled_roster().unwrap();
        let state = GameState::new();
        let ids = |roster: &CharacterRoster| -> Vec<String> {
            deck.eligible_unplayed(&state, roster).iter().map(|c| c.id.clone()).collect()
        };

        let before = ids(&roster);
        assert!(!before.contains(&"CHARACTER_002".to_string()));
        assert!(!before.contains(&"CHARACTER_003".to_string()));

        assert!(roster.enter_scene("MASCOT_BOT"));
        let after = ids(&roster);
        assert!(after.contains(&"CHARACTER_003".to_string()));
        assert!(!after.contains(&"CHARACTER_002".to_string()));

        assert!(roster.enter_scene("EXECUTIVE_45"));
        assert!(ids(&roster).contains(&"CHARACTER_002".to_string()));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = CardDeck::new(vec![card("A_1"), card("A_1")]).unwrap_err();
        assert!(matches!(err, DeckError::DuplicateCard(id) if id == "A_1"));
    }

    #[test]
    fn invalid_card_rejected() {
        let empty = DecisionCard::new("EMPTY_1", "Empty", "no choices");
        assert!(matches!(
            CardDeck::new(vec![empty]),
            Err(DeckError::InvalidCard(EngineError::CardHasNoChoices(_)))
        ));
        assert!(matches!(CardDeck::new(Vec::new()), Err(DeckError::Empty)));
    }

    #[test]
    fn bad_json_rejected() {
        assert!(matches!(CardDeck::from_json_str("[{]"), Err(DeckError::Json(_))));
    }

    #[test]
    fn draw_prefers_unplayed_then_reshuffles() {
        let mut deck = CardDeck::new(vec![card("A_1"), card("B_1")]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        assert!(deck.mark_played("A_1"));
        for _ in 0..10 {
            assert_eq!(deck.draw(&mut rng).id, "B_1");
        }
        deck.mark_played("B_1");
        assert_eq!(deck.played_cards(), 2);
        let drawn = deck.draw(&mut rng).id.clone();
        assert!(drawn == "A_1" || drawn == "B_1");
        assert!(!deck.mark_played("Z_9"));
    }

    #[test]
    fn draw_eligible_respects_requirements() {
        let deck = CardDeck::bundled().unwrap();
        let state = GameState::new();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let drawn = deck.draw_eligible(&state, &OpenScene, &mut rng).unwrap();
            assert_ne!(drawn.id, "ALIEN_ALLIANCE_001");
            assert_ne!(drawn.id, "CRISIS_003");
        }
    }

    #[test]
    fn draw_eligible_none_when_exhausted() {
        let mut deck = CardDeck::new(vec![card("A_1")]).unwrap();
        deck.mark_played("A_1");
        let mut rng = StdRng::seed_from_u64(3);
        assert!(deck.draw_eligible(&GameState::new(), &OpenScene, &mut rng).is_none());
    }
}
