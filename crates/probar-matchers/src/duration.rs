//! Duration specifications for date tolerances, ranges and gaps.
//!
//! Days, hours, minutes and seconds are a fixed number of milliseconds.
//! Months and years are calendar fields: they move the month of a local
//! date instead of adding an average month length, so one month after
//! January 1st is February 1st.

use crate::clock::Clock;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Additive combination of independent time units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationSpec {
    /// Calendar years
    pub years: i64,
    /// Calendar months
    pub months: i64,
    /// Days (24 hours each)
    pub days: i64,
    /// Hours
    pub hours: i64,
    /// Minutes
    pub minutes: i64,
    /// Seconds
    pub seconds: i64,
}

impl DurationSpec {
    /// Empty duration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            years: 0,
            months: 0,
            days: 0,
            hours: 0,
            minutes: 0,
            seconds: 0,
        }
    }

    /// Set years
    #[must_use]
    pub const fn years(mut self, years: i64) -> Self {
        self.years = years;
        self
    }

    /// Set months
    #[must_use]
    pub const fn months(mut self, months: i64) -> Self {
        self.months = months;
        self
    }

    /// Set days
    #[must_use]
    pub const fn days(mut self, days: i64) -> Self {
        self.days = days;
        self
    }

    /// Set hours
    #[must_use]
    pub const fn hours(mut self, hours: i64) -> Self {
        self.hours = hours;
        self
    }

    /// Set minutes
    #[must_use]
    pub const fn minutes(mut self, minutes: i64) -> Self {
        self.minutes = minutes;
        self
    }

    /// Set seconds
    #[must_use]
    pub const fn seconds(mut self, seconds: i64) -> Self {
        self.seconds = seconds;
        self
    }

    /// Milliseconds contributed by days, hours, minutes and seconds
    ///
    /// Returns `None` if the total does not fit in an `i64`.
    #[must_use]
    pub fn fixed_millis(&self) -> Option<i64> {
        [
            (self.days, MS_PER_DAY),
            (self.hours, MS_PER_HOUR),
            (self.minutes, MS_PER_MINUTE),
            (self.seconds, MS_PER_SECOND),
        ]
        .into_iter()
        .try_fold(0i64, |total, (n, unit)| total.checked_add(n.checked_mul(unit)?))
    }

    /// Total calendar months contributed by years and months
    ///
    /// Returns `None` if the total does not fit in an `i64`.
    #[must_use]
    pub const fn calendar_months(&self) -> Option<i64> {
        match self.years.checked_mul(12) {
            Some(months) => months.checked_add(self.months),
            None => None,
        }
    }

    /// Whether every field is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.years == 0
            && self.months == 0
            && self.days == 0
            && self.hours == 0
            && self.minutes == 0
            && self.seconds == 0
    }

    /// Advance `at` by this duration in the clock's local calendar
    ///
    /// Month arithmetic clamps to the last day of the target month
    /// (January 31st plus one month is the last day of February). Returns
    /// `None` if the result is out of range.
    pub fn add_to(&self, at: DateTime<Utc>, clock: &dyn Clock) -> Option<DateTime<Utc>> {
        let months = self.calendar_months()?;
        let shifted = if months == 0 {
            at
        } else {
            let local = clock.to_local(at);
            let count = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
            let moved = if months > 0 {
                local.checked_add_months(count)?
            } else {
                local.checked_sub_months(count)?
            };
            clock.resolve_local(moved)
        };
        shifted.checked_add_signed(chrono::Duration::try_milliseconds(self.fixed_millis()?)?)
    }

    /// Length in milliseconds of this duration when started at `anchor`
    pub fn span_from(&self, anchor: DateTime<Utc>, clock: &dyn Clock) -> Option<i64> {
        let end = self.add_to(anchor, clock)?;
        Some((end - anchor).num_milliseconds())
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.years, "year"),
            (self.months, "month"),
            (self.days, "day"),
            (self.hours, "hour"),
            (self.minutes, "minute"),
            (self.seconds, "second"),
        ]
        .iter()
        .filter(|(n, _)| *n != 0)
        .map(|(n, unit)| {
            if n.abs() == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

        if parts.is_empty() {
            write!(f, "0 seconds")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::at(instant("2024-01-01T00:00:00Z"))
    }

    #[test]
    fn test_fixed_millis() {
        let spec = DurationSpec::new().days(1).hours(2).minutes(3).seconds(4);
        assert_eq!(spec.fixed_millis(), Some(86_400_000 + 7_200_000 + 180_000 + 4_000));
    }

    #[test]
    fn test_months_are_calendar_fields() {
        let start = instant("2023-01-01T00:00:00Z");
        let spec = DurationSpec::new().months(1);
        assert_eq!(
            spec.add_to(start, &clock()),
            Some(instant("2023-02-01T00:00:00Z"))
        );
        assert_eq!(spec.span_from(start, &clock()), Some(31 * 86_400_000));

        let feb = instant("2023-02-01T00:00:00Z");
        assert_eq!(spec.span_from(feb, &clock()), Some(28 * 86_400_000));
    }

    #[test]
    fn test_month_end_clamps() {
        let start = instant("2024-01-31T10:00:00Z");
        let end = DurationSpec::new().months(1).add_to(start, &clock()).unwrap();
        assert_eq!(end, instant("2024-02-29T10:00:00Z"));
    }

    #[test]
    fn test_years_and_negative() {
        let start = instant("2020-06-15T00:00:00Z");
        let spec = DurationSpec::new().years(1).months(-2);
        assert_eq!(
            spec.add_to(start, &clock()),
            Some(instant("2021-04-15T00:00:00Z"))
        );
    }

    #[test]
    fn test_overflow_is_none() {
        let huge = DurationSpec::new().days(i64::MAX / 1000);
        assert_eq!(huge.fixed_millis(), None);
        assert_eq!(huge.add_to(instant("2024-01-01T00:00:00Z"), &clock()), None);

        let years = DurationSpec::new().years(i64::MAX);
        assert_eq!(years.calendar_months(), None);
        assert_eq!(years.span_from(instant("2024-01-01T00:00:00Z"), &clock()), None);
        assert!(!years.is_zero());
    }

    #[test]
    fn test_overflow_from_yaml() {
        let spec: DurationSpec =
            serde_yaml_ng::from_str("seconds: 9223372036854775807\n").unwrap();
        assert_eq!(spec.fixed_millis(), None);
    }

    #[test]
    fn test_deserialize_partial() {
        let spec: DurationSpec = serde_json::from_str(r#"{"months": 1, "days": 2}"#).unwrap();
        assert_eq!(spec, DurationSpec::new().months(1).days(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(DurationSpec::new().to_string(), "0 seconds");
        assert_eq!(
            DurationSpec::new().months(1).seconds(30).to_string(),
            "1 month, 30 seconds"
        );
    }
}
