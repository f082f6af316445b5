//! Property tests over the resource store and the decision protocol.

use proptest::prelude::*;

use decision_engine::cards::{CardChoice, DecisionCard};
use decision_engine::engine::GameEngine;
use decision_engine::invariants::try_validate_invariants;
use decision_engine::resources::{
    Resource, ResourceStore, ResourceType, Trend, DEFAULT_MAX, DEFAULT_MIN,
};

fn any_resource_type() -> impl Strategy<Value = ResourceType> {
    prop::sample::select(ResourceType::ALL.to_vec())
}

proptest! {
    #[test]
    fn modify_stays_in_bounds_and_reports_actual_delta(
        kind in any_resource_type(),
        start in DEFAULT_MIN..=DEFAULT_MAX,
        amount in any::<i32>(),
    ) {
        let mut r = Resource::new(kind, start);
        let old = r.value();
        let actual = r.modify(amount);
        prop_assert!(r.value() >= DEFAULT_MIN && r.value() <= DEFAULT_MAX);
        prop_assert_eq!(actual, r.value() - old);
        prop_assert_eq!(r.trend(), Trend::from_delta(actual));
    }

    #[test]
    fn zero_modify_is_stable(kind in any_resource_type(), start in DEFAULT_MIN..=DEFAULT_MAX) {
        let mut r = Resource::new(kind, start);
        prop_assert_eq!(r.modify(0), 0);
        prop_assert_eq!(r.value(), start);
        prop_assert_eq!(r.trend(), Trend::Stable);
    }

    #[test]
    fn overall_health_is_truncated_mean(values in prop::array::uniform4(DEFAULT_MIN..=DEFAULT_MAX)) {
        let store = ResourceStore::with_values(values);
        let health = store.overall_health();
        prop_assert!((0..=100).contains(&health));
        prop_assert_eq!(health, values.iter().sum::<i32>() / 4);
    }

    #[test]
    fn random_play_keeps_invariants(
        steps in prop::collection::vec((any_resource_type(), -60i32..=60, any::<bool>()), 1..40),
        seed in any::<u64>(),
    ) {
        let mut engine = GameEngine::with_seed(seed);
        for (i, (kind, amount, end_day)) in steps.into_iter().enumerate() {
            let card = DecisionCard::new(&format!("PROP_{}", i), "Prop", "generated")
                .with_choice(CardChoice::new(1, "Go").with_effect(kind, amount));
            engine.resolve_choice(&card, 1).unwrap();
            if end_day {
                engine.advance_day();
            }
            prop_assert_eq!(try_validate_invariants(engine.state()), Ok(()));
        }
    }
}
