//! Decision Engine v1: Card Eligibility
//!
//! Pure predicate over a card's requirements and the current state.
//! Cost is proportional to the requirement lists; history lookups go through
//! the played-card index on `GameState`.

use crate::cards::{CardRequirements, DecisionCard};
use crate::resources::ResourceMap;
use crate::state::GameState;

/// Answers "is this character in the current scene?".
pub trait SceneContext {
    fn is_present(&self, character_id: &str) -> bool;
}

/// Scene that treats every character as present.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenScene;

impl SceneContext for OpenScene {
    fn is_present(&self, _character_id: &str) -> bool {
        true
    }
}

/// Eligibility without a scene collaborator. `required_character_present`
/// is not evaluated and counts as satisfied.
pub fn is_eligible(card: &DecisionCard, state: &GameState) -> bool {
    is_eligible_in_scene(card, state, &OpenScene)
}

pub fn is_eligible_in_scene(
    card: &DecisionCard,
    state: &GameState,
    scene: &dyn SceneContext,
) -> bool {
    if !card.is_presentable() {
        return false;
    }
    match &card.requirements {
        None => true,
        Some(req) => requirements_hold(req, state, scene),
    }
}

fn requirements_hold(req: &CardRequirements, state: &GameState, scene: &dyn SceneContext) -> bool {
    let day = state.current_day();
    if req.min_day.is_some_and(|min| day < min) {
        return false;
    }
    if req.max_day.is_some_and(|max| day > max) {
        return false;
    }

    let values = state.resources().values();
    if let Some(mins) = &req.min_resource_values {
        if !bounds_hold(mins, &values, |current, bound| current >= bound) {
            return false;
        }
    }
    if let Some(maxes) = &req.max_resource_values {
        if !bounds_hold(maxes, &values, |current, bound| current <= bound) {
            return false;
        }
    }

    if let Some(required) = &req.required_previous_cards {
        if !required.iter().all(|id| state.has_played(id)) {
            return false;
        }
    }
    if let Some(blocked) = &req.blocked_by_cards {
        if blocked.iter().any(|id| state.has_played(id)) {
            return false;
        }
    }

    match &req.required_character_present {
        Some(character_id) => scene.is_present(character_id),
        None => true,
    }
}

fn bounds_hold(
    bounds: &ResourceMap<i32>,
    values: &ResourceMap<i32>,
    holds: impl Fn(i32, i32) -> bool,
) -> bool {
    bounds.iter().all(|(kind, &bound)| {
        values
            .get(kind)
            .is_some_and(|&current| holds(current, bound))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardChoice;
    use crate::resources::{ResourceStore, ResourceType};

    struct NobodyHere;

    impl SceneContext for NobodyHere {
        fn is_present(&self, _character_id: &str) -> bool {
            false
        }
    }

    fn card(requirements: Option<CardRequirements>) -> DecisionCard {
        let mut card = DecisionCard::new("TEST_1", "Test", "A test card")
            .with_choice(CardChoice::new(1, "Yes"));
        card.requirements = requirements;
        card
    }

    #[test]
    fn no_requirements_is_eligible() {
        assert!(is_eligible(&card(None), &GameState::new()));
        assert!(is_eligible(&card(Some(CardRequirements::default())), &GameState::new()));
    }

    #[test]
    fn zero_choices_never_eligible() {
        let empty = DecisionCard::new("EMPTY_1", "Nothing", "No options");
        assert!(!is_eligible(&empty, &GameState::new()));
    }

    #[test]
    fn day_window() {
        let req = CardRequirements {
            min_day: Some(2),
            max_day: Some(3),
            ..Default::default()
        };
        let c = card(Some(req));
        let mut state = GameState::new();
        assert!(!is_eligible(&c, &state));
        state.advance_day(&mut Vec::new());
        assert!(is_eligible(&c, &state));
        state.advance_day(&mut Vec::new());
        assert!(is_eligible(&c, &state));
        state.advance_day(&mut Vec::new());
        assert!(!is_eligible(&c, &state));
    }

    #[test]
    fn resource_bounds() {
        let req = CardRequirements {
            min_resource_values: Some(ResourceMap::new().with(ResourceType::Popularity, 40)),
            max_resource_values: Some(ResourceMap::new().with(ResourceType::Stability, 30)),
            ..Default::default()
        };
        let c = card(Some(req));
        assert!(!is_eligible(&c, &GameState::new()));

        let state = GameState::from_parts(1, 0, 0, Vec::new(), ResourceStore::with_values([40, 30, 50, 50]));
        assert!(is_eligible(&c, &state));

        let state = GameState::from_parts(1, 0, 0, Vec::new(), ResourceStore::with_values([39, 30, 50, 50]));
        assert!(!is_eligible(&c, &state));
    }

    #[test]
    fn required_and_blocked_cards() {
        let req = CardRequirements {
            required_previous_cards: Some(vec!["CRISIS_003".to_string()]),
            blocked_by_cards: Some(vec!["NORMAL_001".to_string()]),
            ..Default::default()
        };
        let c = card(Some(req));
        let mut state = GameState::new();
        assert!(!is_eligible(&c, &state));

        state.record_decision("CRISIS_003", 2);
        assert!(is_eligible(&c, &state));

        state.record_decision("NORMAL_001", 1);
        assert!(!is_eligible(&c, &state));
    }

    #[test]
    fn character_presence_uses_scene() {
        let req = CardRequirements {
            required_character_present: Some("IGUANA_KING".to_string()),
            ..Default::default()
        };
        let c = card(Some(req));
        let state = GameState::new();
        assert!(is_eligible(&c, &state));
        assert!(!is_eligible_in_scene(&c, &state, &NobodyHere));
    }
}
