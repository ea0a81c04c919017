//! Property-based tests for the parameter store and evaluator.

use animstate_core::{
    CompareMode, Condition, CoreError, ParamValue, Parameter, ParameterStore, RecordingAnimator,
    StateMachine,
};
use proptest::prelude::*;

prop_compose! {
    fn arbitrary_value()(variant in 0..3u8, f in -1000.0f32..1000.0, i in any::<i32>(), b in any::<bool>()) -> ParamValue {
        match variant {
            0 => ParamValue::Scalar(f),
            1 => ParamValue::Integer(i),
            _ => ParamValue::Boolean(b),
        }
    }
}

fn arbitrary_mode() -> impl Strategy<Value = CompareMode> {
    prop_oneof![
        Just(CompareMode::Less),
        Just(CompareMode::LessOrEqual),
        Just(CompareMode::Equal),
        Just(CompareMode::GreaterOrEqual),
        Just(CompareMode::Greater),
        Just(CompareMode::NotEqual),
    ]
}

/// A value of the same kind as `value`, derived from `seed`.
fn same_kind(value: ParamValue, seed: i32) -> ParamValue {
    match value {
        ParamValue::Scalar(_) => ParamValue::Scalar(seed as f32 / 7.0),
        ParamValue::Integer(_) => ParamValue::Integer(seed),
        ParamValue::Boolean(_) => ParamValue::Boolean(seed % 2 == 0),
    }
}

proptest! {
    #[test]
    fn set_then_get_roundtrips(initial in arbitrary_value(), seed in any::<i32>()) {
        let mut store = ParameterStore::new();
        store.add("p", initial).unwrap();

        let next = same_kind(initial, seed);
        store.set("p", next).unwrap();
        prop_assert_eq!(store.get("p").unwrap().value(), next);
    }

    #[test]
    fn duplicate_add_never_overwrites(first in arbitrary_value(), second in arbitrary_value()) {
        let mut store = ParameterStore::new();
        store.add("p", first).unwrap();

        let result = store.add("p", second);
        prop_assert!(matches!(result, Err(CoreError::DuplicateKey { .. })), "duplicate add should fail");
        prop_assert_eq!(store.get("p").unwrap().value(), first);
    }

    #[test]
    fn set_with_other_kind_is_rejected(initial in arbitrary_value(), other in arbitrary_value()) {
        prop_assume!(initial.kind() != other.kind());
        let mut store = ParameterStore::new();
        store.add("p", initial).unwrap();

        let result = store.set("p", other);
        prop_assert!(matches!(result, Err(CoreError::KindMismatch { .. })), "kind mismatch should fail");
        prop_assert_eq!(store.get("p").unwrap().value(), initial);
    }

    #[test]
    fn evaluate_is_pure(mode in arbitrary_mode(), lhs in any::<i32>(), rhs in any::<i32>()) {
        let cond = Condition::integer("p", mode, rhs);
        let param = Parameter::new("p", lhs);
        let first = cond.evaluate(&param).unwrap();
        let second = cond.evaluate(&param).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn integer_modes_match_std_ordering(lhs in any::<i32>(), rhs in any::<i32>()) {
        let param = Parameter::new("p", lhs);
        let check = |mode| Condition::integer("p", mode, rhs).evaluate(&param).unwrap();
        prop_assert_eq!(check(CompareMode::Less), lhs < rhs);
        prop_assert_eq!(check(CompareMode::LessOrEqual), lhs <= rhs);
        prop_assert_eq!(check(CompareMode::Equal), lhs == rhs);
        prop_assert_eq!(check(CompareMode::GreaterOrEqual), lhs >= rhs);
        prop_assert_eq!(check(CompareMode::Greater), lhs > rhs);
        prop_assert_eq!(check(CompareMode::NotEqual), lhs != rhs);
    }

    #[test]
    fn mismatched_kinds_never_evaluate(cond_value in arbitrary_value(), param_value in arbitrary_value()) {
        prop_assume!(cond_value.kind() != param_value.kind());
        let cond = match cond_value {
            ParamValue::Scalar(v) => Condition::scalar("p", CompareMode::Equal, v),
            ParamValue::Integer(v) => Condition::integer("p", CompareMode::Equal, v),
            ParamValue::Boolean(v) => Condition::boolean("p", v),
        };
        let result = cond.evaluate(&Parameter::new("p", param_value));
        prop_assert!(matches!(result, Err(CoreError::KindMismatch { .. })), "expected kind mismatch");
    }

    #[test]
    fn tick_is_stable_without_mutation(speed in -50.0f32..50.0, moving in any::<bool>(), extra_ticks in 1usize..8) {
        let mut machine = StateMachine::new("Idle", RecordingAnimator::new());
        machine.add_param("Speed", speed).unwrap();
        machine.add_param("IsMoving", moving).unwrap();
        for name in ["Idle", "Walk", "Run"] {
            machine.add_state(name);
        }
        machine.add_transition("Idle", "Walk").unwrap().add_boolean_condition("IsMoving", true);
        machine.add_transition("Walk", "Run").unwrap().add_scalar_condition("Speed", CompareMode::Greater, 10.0);
        machine.add_transition("Run", "Walk").unwrap().add_scalar_condition("Speed", CompareMode::LessOrEqual, 10.0);
        machine.add_transition("Walk", "Idle").unwrap().add_boolean_condition("IsMoving", false);

        // Settle: the chain is at most three hops long
        for _ in 0..3 {
            machine.tick();
        }
        machine.tick();
        let settled = machine.current_state_name().map(str::to_string);

        for _ in 0..extra_ticks {
            prop_assert!(machine.tick().is_none());
            prop_assert_eq!(machine.current_state_name().map(str::to_string), settled.clone());
        }
    }

    #[test]
    fn first_registered_transition_wins(count in 2usize..6, speed in 11.0f32..100.0) {
        let mut machine = StateMachine::headless("Idle");
        machine.add_param("Speed", speed).unwrap();
        machine.add_state("Idle");
        for i in 0..count {
            let target = format!("Target{}", i);
            machine.add_state(target.clone());
            // Later transitions have tighter thresholds but all are satisfied
            machine
                .add_transition("Idle", target)
                .unwrap()
                .add_scalar_condition("Speed", CompareMode::Greater, i as f32);
        }

        machine.tick();
        prop_assert_eq!(machine.tick().unwrap().to, "Target0");
    }
}
