//! Membership in a list of possibilities.

use super::MatchOutcome;
use crate::value::Value;

/// Passes iff `received` equals at least one of `possibilities`
///
/// Equality follows [`Value::loose_eq`]: composites compare structurally,
/// NaN matches NaN, everything else compares by value or identity. An
/// empty possibility list never matches.
#[must_use]
pub fn to_be_one_of(received: &Value, possibilities: &[Value]) -> MatchOutcome {
    let passed = possibilities.iter().any(|p| received.loose_eq(p));
    let expected = format!("one of {}", Value::list(possibilities.iter().cloned()));
    let outcome = MatchOutcome::new("to_be_one_of", passed, expected, received.to_string());
    if possibilities.is_empty() {
        outcome.with_detail("the list of possibilities is empty")
    } else {
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_primitive_membership() {
        let options = [Value::from(1), Value::from("a"), Value::Null];
        assert!(to_be_one_of(&Value::from("a"), &options).passed);
        assert!(to_be_one_of(&Value::Null, &options).passed);
        assert!(!to_be_one_of(&Value::Undefined, &options).passed);
    }

    #[test]
    fn test_nan_matches_nan() {
        let options = [Value::from(1), Value::from(f64::NAN)];
        assert!(to_be_one_of(&Value::from(f64::NAN), &options).passed);
    }

    #[test]
    fn test_deep_equality() {
        let options = [Value::from(json!({"id": 1, "tags": ["x"]}))];
        let received = Value::from(json!({"tags": ["x"], "id": 1}));
        assert!(to_be_one_of(&received, &options).passed);
    }

    #[test]
    fn test_cyclic_received_uses_identity() {
        let cyclic = Value::object([("id", Value::from(1))]);
        cyclic.insert("parent", cyclic.clone());
        let twin = Value::object([("id", Value::from(1))]);
        twin.insert("parent", twin.clone());

        assert!(to_be_one_of(&cyclic, &[twin.clone(), cyclic.clone()]).passed);
        assert!(!to_be_one_of(&cyclic, &[twin]).passed);
    }

    #[test]
    fn test_empty_possibilities_fail() {
        let outcome = to_be_one_of(&Value::from(1), &[]);
        assert!(!outcome.passed);
        assert!(outcome.detail.is_some());
    }

    #[test]
    fn test_message_lists_possibilities() {
        let outcome = to_be_one_of(&Value::from(3), &[Value::from(1), Value::from(2)]);
        assert_eq!(outcome.expected, "one of [1, 2]");
        assert_eq!(outcome.received, "3");
    }

    #[test]
    fn test_idempotent() {
        let options = [Value::from(json!([1, 2]))];
        let received = Value::from(json!([1, 2]));
        assert_eq!(
            to_be_one_of(&received, &options),
            to_be_one_of(&received, &options)
        );
    }

    proptest! {
        #[test]
        fn prop_contained_value_passes(
            items in prop::collection::vec(any::<i64>(), 1..8),
            pick in any::<prop::sample::Index>(),
        ) {
            let options: Vec<Value> = items.iter().map(|&n| Value::from(n)).collect();
            let received = Value::from(items[pick.index(items.len())]);
            prop_assert!(to_be_one_of(&received, &options).passed);
        }

        #[test]
        fn prop_absent_value_fails(
            items in prop::collection::vec(0i64..1000, 0..8),
            probe in 1000i64..2000,
        ) {
            let options: Vec<Value> = items.iter().map(|&n| Value::from(n)).collect();
            prop_assert!(!to_be_one_of(&Value::from(probe), &options).passed);
        }
    }
}
