//! Name-keyed matcher table for dynamic dispatch.
//!
//! Hosts that receive matcher names at runtime (for example from a
//! JavaScript-style `expect(...).toBeOneOf(...)` call) look them up here.
//! Registration is explicit; nothing is installed into a global `expect`.

use crate::assertion::text;
use crate::assertion::{any_of, date, kind, MatchOutcome};
use crate::clock::SystemClock;
use crate::result::{MatcherError, MatcherResult};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// A matcher callable by name
pub type MatcherFn = fn(&Value, &[Value]) -> MatcherResult<MatchOutcome>;

/// Matchers keyed by name
#[derive(Clone, Default)]
pub struct MatcherRegistry {
    matchers: HashMap<&'static str, MatcherFn>,
}

impl fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl MatcherRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in value and date matcher
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("toBeOneOf", to_be_one_of);
        registry.register("toBeNil", |v, _| Ok(kind::to_be_nil(v)));
        registry.register("toBeInteger", |v, _| Ok(kind::to_be_integer(v)));
        registry.register("toBeFloat", |v, _| Ok(kind::to_be_float(v)));
        registry.register("toBePrimitive", |v, _| Ok(kind::to_be_primitive(v)));
        registry.register("toBeArray", |v, _| Ok(kind::to_be_array(v)));
        registry.register("toBeObject", |v, _| Ok(kind::to_be_object(v)));
        registry.register("toBeBefore", to_be_before);
        registry.register("toBeAfter", to_be_after);
        registry.register("toBeBetween", to_be_between);
        registry.register("toBeSameDay", to_be_same_day);
        registry.register("toBeSameMonth", to_be_same_month);
        registry.register("toBeSameYear", to_be_same_year);
        registry.register("toBeLeapYear", to_be_leap_year);
        registry.register("toBeStartOfMonth", to_be_start_of_month);
        registry.register("toBeEndOfMonth", to_be_end_of_month);
        registry.register("toBeWeekday", to_be_weekday);
        registry.register("toBeWeekend", to_be_weekend);
        registry.register("toBeValidISODate", to_be_valid_iso_date);
        registry.register("toBeUUID", to_be_uuid);
        registry
    }

    /// Add or replace a matcher; returns the one it replaced
    pub fn register(&mut self, name: &'static str, matcher: MatcherFn) -> Option<MatcherFn> {
        self.matchers.insert(name, matcher)
    }

    /// Look up a matcher
    #[must_use]
    pub fn get(&self, name: &str) -> Option<MatcherFn> {
        self.matchers.get(name).copied()
    }

    /// Whether `name` is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.matchers.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.matchers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run a matcher by name and apply negation
    ///
    /// # Errors
    ///
    /// Returns a usage error for an unknown name or unusable arguments, and
    /// `AssertionFailed` when the assertion does not hold
    pub fn evaluate(
        &self,
        name: &str,
        actual: &Value,
        args: &[Value],
        negated: bool,
    ) -> MatcherResult<()> {
        let matcher = self.get(name).ok_or_else(|| {
            MatcherError::usage("registry", format!("no matcher named {name:?}"))
        })?;
        matcher(actual, args)?.into_result(negated)
    }
}

fn arg<'a>(matcher: &'static str, args: &'a [Value], index: usize) -> MatcherResult<&'a Value> {
    args.get(index).ok_or_else(|| {
        MatcherError::usage(matcher, format!("missing argument {}", index + 1))
    })
}

fn date_arg(matcher: &'static str, args: &[Value], index: usize) -> MatcherResult<DateTime<Utc>> {
    let value = arg(matcher, args, index)?;
    value.as_date().ok_or_else(|| {
        MatcherError::usage(
            matcher,
            format!("argument {} must be a date, got {}", index + 1, value.type_name()),
        )
    })
}

fn not_a(matcher: &'static str, wanted: &str, actual: &Value) -> MatchOutcome {
    MatchOutcome::new(matcher, false, wanted, format!("{actual} ({})", actual.type_name()))
}

fn to_be_one_of(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "toBeOneOf";
    match arg(NAME, args, 0)? {
        Value::List(items) => Ok(any_of::to_be_one_of(actual, &items.borrow())),
        other => Err(MatcherError::usage(
            NAME,
            format!("expected an array of possibilities, got {}", other.type_name()),
        )),
    }
}

fn with_date(
    matcher: &'static str,
    actual: &Value,
    evaluate: impl FnOnce(DateTime<Utc>) -> MatcherResult<MatchOutcome>,
) -> MatcherResult<MatchOutcome> {
    match actual.as_date() {
        Some(at) => evaluate(at),
        None => Ok(not_a(matcher, "a date", actual)),
    }
}

fn to_be_before(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    let other = date_arg("toBeBefore", args, 0)?;
    with_date("toBeBefore", actual, |at| Ok(date::to_be_before(at, other)))
}

fn to_be_after(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    let other = date_arg("toBeAfter", args, 0)?;
    with_date("toBeAfter", actual, |at| Ok(date::to_be_after(at, other)))
}

fn to_be_between(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    let start = date_arg("toBeBetween", args, 0)?;
    let end = date_arg("toBeBetween", args, 1)?;
    with_date("toBeBetween", actual, |at| Ok(date::to_be_between(at, start, end)))
}

fn to_be_same_day(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    let other = date_arg("toBeSameDay", args, 0)?;
    with_date("toBeSameDay", actual, |at| {
        Ok(date::to_be_same_day(at, other, &SystemClock))
    })
}

fn to_be_same_month(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    let other = date_arg("toBeSameMonth", args, 0)?;
    with_date("toBeSameMonth", actual, |at| {
        Ok(date::to_be_same_month(at, other, &SystemClock))
    })
}

fn to_be_same_year(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    let other = date_arg("toBeSameYear", args, 0)?;
    with_date("toBeSameYear", actual, |at| {
        Ok(date::to_be_same_year(at, other, &SystemClock))
    })
}

fn to_be_leap_year(actual: &Value, _: &[Value]) -> MatcherResult<MatchOutcome> {
    with_date("toBeLeapYear", actual, |at| {
        Ok(date::to_be_leap_year(at, &SystemClock))
    })
}

fn to_be_start_of_month(actual: &Value, _: &[Value]) -> MatcherResult<MatchOutcome> {
    with_date("toBeStartOfMonth", actual, |at| {
        Ok(date::to_be_start_of_month(at, &SystemClock))
    })
}

fn to_be_end_of_month(actual: &Value, _: &[Value]) -> MatcherResult<MatchOutcome> {
    with_date("toBeEndOfMonth", actual, |at| {
        Ok(date::to_be_end_of_month(at, &SystemClock))
    })
}

fn to_be_weekday(actual: &Value, _: &[Value]) -> MatcherResult<MatchOutcome> {
    with_date("toBeWeekday", actual, |at| {
        Ok(date::to_be_weekday(at, &SystemClock))
    })
}

fn to_be_weekend(actual: &Value, _: &[Value]) -> MatcherResult<MatchOutcome> {
    with_date("toBeWeekend", actual, |at| {
        Ok(date::to_be_weekend(at, &SystemClock))
    })
}

fn to_be_valid_iso_date(actual: &Value, _: &[Value]) -> MatcherResult<MatchOutcome> {
    Ok(match actual.as_str() {
        Some(s) => date::to_be_valid_iso_date(s),
        None => not_a("toBeValidISODate", "an ISO 8601 date string", actual),
    })
}

fn to_be_uuid(actual: &Value, args: &[Value]) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "toBeUUID";
    let version = match args.first() {
        None | Some(Value::Undefined) => None,
        Some(Value::Number(n)) if n.fract() == 0.0 && (0.0..=255.0).contains(n) => Some(*n as u8),
        Some(other) => {
            return Err(MatcherError::usage(
                NAME,
                format!("version must be a number, got {other}"),
            ))
        }
    };
    text::check_uuid_version(version)?;
    Ok(match actual.as_str() {
        Some(s) => text::to_be_uuid(s, version)?,
        None => not_a(NAME, "a UUID string", actual),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> Value {
        Value::Date(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    #[test]
    fn test_builtin_names() {
        let registry = MatcherRegistry::builtin();
        let names = registry.names();
        assert_eq!(names.len(), 20);
        for name in ["toBeOneOf", "toBeNil", "toBeBetween", "toBeUUID", "toBeValidISODate"] {
            assert!(registry.contains(name), "{name} missing");
        }
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_unknown_name_is_usage_error() {
        let err = MatcherRegistry::builtin()
            .evaluate("toBeShiny", &Value::Null, &[], false)
            .unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = MatcherRegistry::new();
        assert!(registry.register("toBeNil", |v, _| Ok(kind::to_be_nil(v))).is_none());
        assert!(registry.register("toBeNil", |v, _| Ok(kind::to_be_array(v))).is_some());
        assert!(registry.evaluate("toBeNil", &Value::list([]), &[], false).is_ok());
    }

    mod dispatch {
        use super::*;

        #[test]
        fn test_one_of() {
            let registry = MatcherRegistry::builtin();
            let options = Value::list([Value::from(1), Value::from(2)]);
            assert!(registry
                .evaluate("toBeOneOf", &Value::from(2), &[options.clone()], false)
                .is_ok());
            assert!(registry
                .evaluate("toBeOneOf", &Value::from(3), &[options], true)
                .is_ok());
            let err = registry
                .evaluate("toBeOneOf", &Value::from(3), &[Value::from(3)], false)
                .unwrap_err();
            assert!(err.is_usage());
        }

        #[test]
        fn test_dates() {
            let registry = MatcherRegistry::builtin();
            let jan = date("2024-01-10T00:00:00Z");
            let feb = date("2024-02-10T00:00:00Z");
            assert!(registry.evaluate("toBeBefore", &jan, &[feb.clone()], false).is_ok());
            assert!(registry.evaluate("toBeAfter", &jan, &[feb.clone()], true).is_ok());
            assert!(registry
                .evaluate("toBeBetween", &jan, &[jan.clone(), feb.clone()], false)
                .is_ok());
            assert!(registry.evaluate("toBeLeapYear", &jan, &[], false).is_ok());
        }

        #[test]
        fn test_non_date_actual_fails() {
            let registry = MatcherRegistry::builtin();
            let err = registry
                .evaluate("toBeWeekday", &Value::from("monday"), &[], false)
                .unwrap_err();
            assert!(err.is_assertion_failure());
        }

        #[test]
        fn test_bad_arguments() {
            let registry = MatcherRegistry::builtin();
            let jan = date("2024-01-10T00:00:00Z");
            assert!(registry
                .evaluate("toBeBefore", &jan, &[], false)
                .unwrap_err()
                .is_usage());
            assert!(registry
                .evaluate("toBeBefore", &jan, &[Value::from("2024")], false)
                .unwrap_err()
                .is_usage());
        }

        #[test]
        fn test_uuid() {
            let registry = MatcherRegistry::builtin();
            let id = Value::from("550e8400-e29b-41d4-a716-446655440000");
            assert!(registry.evaluate("toBeUUID", &id, &[], false).is_ok());
            assert!(registry.evaluate("toBeUUID", &id, &[Value::from(4)], false).is_ok());
            assert!(registry.evaluate("toBeUUID", &id, &[Value::from(1)], true).is_ok());
            assert!(registry
                .evaluate("toBeUUID", &id, &[Value::from(2)], false)
                .unwrap_err()
                .is_usage());
        }

        #[test]
        fn test_iso_date() {
            let registry = MatcherRegistry::builtin();
            assert!(registry
                .evaluate("toBeValidISODate", &Value::from("2024-02-30T00:00:00Z"), &[], true)
                .is_ok());
            assert!(registry
                .evaluate("toBeValidISODate", &Value::from(20240101), &[], true)
                .is_ok());
        }
    }
}
