//! Type and shape predicates over dynamic values.

use super::MatchOutcome;
use crate::value::{Kind, Value};
use std::fmt;

fn received(value: &Value) -> String {
    format!("{value} ({})", value.type_name())
}

/// Passes iff the value is `null` or `undefined`
#[must_use]
pub fn to_be_nil(value: &Value) -> MatchOutcome {
    let passed = matches!(value, Value::Null | Value::Undefined);
    MatchOutcome::new("to_be_nil", passed, "null or undefined", received(value))
}

/// Passes iff the value is a finite whole number
#[must_use]
pub fn to_be_integer(value: &Value) -> MatchOutcome {
    let outcome =
        |passed| MatchOutcome::new("to_be_integer", passed, "an integer", received(value));
    match value {
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => outcome(true),
        Value::Number(n) if n.is_nan() => outcome(false).with_detail("received NaN"),
        Value::Number(n) if n.is_infinite() => {
            outcome(false).with_detail("received an infinite number")
        }
        Value::Number(_) => outcome(false).with_detail("received a number with a fractional part"),
        other => outcome(false).with_detail(format!("received a {}", other.type_name())),
    }
}

/// Why a value is not a float
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatRejection {
    /// Not a number at all
    WrongType,
    /// NaN
    NaN,
    /// Positive or negative infinity
    Infinite,
    /// Finite but whole
    WholeNumber,
}

impl fmt::Display for FloatRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::WrongType => "value is not a number",
            Self::NaN => "value is NaN",
            Self::Infinite => "value is infinite",
            Self::WholeNumber => "value is a whole number",
        };
        write!(f, "{reason}")
    }
}

/// Classify a value for `to_be_float`; `None` means it is a float
#[must_use]
pub fn float_rejection(value: &Value) -> Option<FloatRejection> {
    match value {
        Value::Number(n) if n.is_nan() => Some(FloatRejection::NaN),
        Value::Number(n) if n.is_infinite() => Some(FloatRejection::Infinite),
        Value::Number(n) if n.fract() == 0.0 => Some(FloatRejection::WholeNumber),
        Value::Number(_) => None,
        _ => Some(FloatRejection::WrongType),
    }
}

/// Passes iff the value is a finite number with a fractional part
#[must_use]
pub fn to_be_float(value: &Value) -> MatchOutcome {
    let rejection = float_rejection(value);
    let outcome = MatchOutcome::new(
        "to_be_float",
        rejection.is_none(),
        "a floating point number",
        received(value),
    );
    match rejection {
        Some(reason) => outcome.with_detail(reason.to_string()),
        None => outcome,
    }
}

/// Passes iff the value is a primitive (absent, boolean, number, string,
/// big integer or symbol)
#[must_use]
pub fn to_be_primitive(value: &Value) -> MatchOutcome {
    MatchOutcome::new(
        "to_be_primitive",
        value.kind().is_primitive(),
        "a primitive value",
        received(value),
    )
}

/// Passes iff the value is a list
#[must_use]
pub fn to_be_array(value: &Value) -> MatchOutcome {
    MatchOutcome::new(
        "to_be_array",
        value.kind() == Kind::List,
        "an array",
        received(value),
    )
}

/// Passes iff the value is a non-null, non-list composite
///
/// Class instances, dates and regexes count as objects.
#[must_use]
pub fn to_be_object(value: &Value) -> MatchOutcome {
    let passed = matches!(value.kind(), Kind::PlainObject | Kind::Other);
    MatchOutcome::new("to_be_object", passed, "an object", received(value))
}
