//! Predicates over lists of dates.

use super::date::fmt_instant;
use super::MatchOutcome;
use crate::clock::Clock;
use crate::duration::DurationSpec;
use crate::result::{MatcherError, MatcherResult};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

fn fmt_list(dates: &[DateTime<Utc>]) -> String {
    let items: Vec<String> = dates.iter().map(|d| fmt_instant(*d)).collect();
    format!("[{}]", items.join(", "))
}

fn sorted(dates: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
    let mut out = dates.to_vec();
    out.sort_unstable();
    out
}

fn order_outcome(
    matcher: &'static str,
    dates: &[DateTime<Utc>],
    expected: &str,
    in_order: impl Fn(&DateTime<Utc>, &DateTime<Utc>) -> bool,
) -> MatchOutcome {
    let broken = dates
        .windows(2)
        .position(|pair| !in_order(&pair[0], &pair[1]))
        .map(|i| i + 1);
    let outcome = MatchOutcome::new(matcher, broken.is_none(), expected, fmt_list(dates));
    match broken {
        Some(index) => outcome.with_detail(format!("order broken at index {index}")),
        None => outcome,
    }
}

/// Passes iff every date is at or after its predecessor
#[must_use]
pub fn to_be_in_ascending_order(dates: &[DateTime<Utc>]) -> MatchOutcome {
    order_outcome(
        "to_be_in_ascending_order",
        dates,
        "dates in ascending order",
        |a, b| a <= b,
    )
}

/// Passes iff every date is at or before its predecessor
#[must_use]
pub fn to_be_in_descending_order(dates: &[DateTime<Utc>]) -> MatchOutcome {
    order_outcome(
        "to_be_in_descending_order",
        dates,
        "dates in descending order",
        |a, b| a >= b,
    )
}

/// Passes iff `max - min` equals the span of `spec` started at `min`
///
/// # Errors
///
/// Returns a usage error for an empty list or an out-of-range duration
pub fn to_have_date_range(
    dates: &[DateTime<Utc>],
    spec: &DurationSpec,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "to_have_date_range";
    let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
        return Err(MatcherError::usage(NAME, "requires at least one date"));
    };
    let expected_ms = spec
        .span_from(*min, clock)
        .ok_or_else(|| MatcherError::usage(NAME, format!("duration {spec} is out of range")))?;
    let actual_ms = (*max - *min).num_milliseconds();
    Ok(MatchOutcome::new(
        NAME,
        actual_ms == expected_ms,
        format!("a range of {spec} ({expected_ms} ms)"),
        format!(
            "a range of {actual_ms} ms, from {} to {}",
            fmt_instant(*min),
            fmt_instant(*max)
        ),
    ))
}

/// Calendar granularity for [`to_have_consecutive_dates`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateUnit {
    /// Calendar days
    Day,
    /// Calendar months
    Month,
    /// Calendar years
    Year,
}

impl DateUnit {
    fn follows(self, prev: NaiveDate, next: NaiveDate) -> bool {
        match self {
            Self::Day => prev.succ_opt() == Some(next),
            Self::Month => {
                let index = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
                index(next) == index(prev) + 1
            }
            Self::Year => next.year() == prev.year() + 1,
        }
    }
}

impl fmt::Display for DateUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DateUnit {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "days" => Ok(Self::Day),
            "month" | "months" => Ok(Self::Month),
            "year" | "years" => Ok(Self::Year),
            other => Err(MatcherError::usage(
                "to_have_consecutive_dates",
                format!("unknown unit {other:?} (expected day, month or year)"),
            )),
        }
    }
}

/// Passes iff, once sorted, each date is exactly one `unit` after the last
///
/// # Errors
///
/// Returns a usage error for fewer than two dates
pub fn to_have_consecutive_dates(
    dates: &[DateTime<Utc>],
    unit: DateUnit,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "to_have_consecutive_dates";
    if dates.len() < 2 {
        return Err(MatcherError::usage(NAME, "requires at least two dates"));
    }
    let ordered = sorted(dates);
    let gap = ordered
        .windows(2)
        .position(|pair| !unit.follows(clock.local_date(pair[0]), clock.local_date(pair[1])))
        .map(|i| i + 1);
    let outcome = MatchOutcome::new(
        NAME,
        gap.is_none(),
        format!("consecutive dates one {unit} apart"),
        fmt_list(&ordered),
    );
    Ok(match gap {
        Some(index) => outcome.with_detail(format!("gap found at index {index}")),
        None => outcome,
    })
}

/// Passes iff every date lies within `start..=end`
///
/// # Errors
///
/// Returns a usage error for an empty list
pub fn to_all_be_within_range(
    dates: &[DateTime<Utc>],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "to_all_be_within_range";
    if dates.is_empty() {
        return Err(MatcherError::usage(NAME, "requires at least one date"));
    }
    let outside: Vec<DateTime<Utc>> = dates
        .iter()
        .copied()
        .filter(|d| *d < start || *d > end)
        .collect();
    let outcome = MatchOutcome::new(
        NAME,
        outside.is_empty(),
        format!(
            "all dates between {} and {}",
            fmt_instant(start),
            fmt_instant(end)
        ),
        fmt_list(dates),
    );
    Ok(if outside.is_empty() {
        outcome
    } else {
        outcome.with_detail(format!("dates out of range: {}", fmt_list(&outside)))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum DateKey {
    Instant(i64),
    Day(NaiveDate),
}

/// Passes iff no two dates share an instant (or a local day when
/// `ignore_time` is set)
///
/// # Errors
///
/// Returns a usage error for an empty list
pub fn to_have_unique_dates(
    dates: &[DateTime<Utc>],
    ignore_time: bool,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "to_have_unique_dates";
    if dates.is_empty() {
        return Err(MatcherError::usage(NAME, "requires at least one date"));
    }
    let mut seen = HashSet::new();
    let duplicates: Vec<DateTime<Utc>> = dates
        .iter()
        .copied()
        .filter(|d| {
            let key = if ignore_time {
                DateKey::Day(clock.local_date(*d))
            } else {
                DateKey::Instant(d.timestamp_millis())
            };
            !seen.insert(key)
        })
        .collect();
    let expected = if ignore_time {
        "dates on distinct days"
    } else {
        "distinct dates"
    };
    let outcome = MatchOutcome::new(NAME, duplicates.is_empty(), expected, fmt_list(dates));
    Ok(if duplicates.is_empty() {
        outcome
    } else {
        outcome.with_detail(format!("duplicates: {}", fmt_list(&duplicates)))
    })
}

/// Passes iff, once sorted, some consecutive pair is further apart than `spec`
///
/// # Errors
///
/// Returns a usage error if `spec` cannot be applied to one of the dates
pub fn to_have_gaps_larger_than(
    dates: &[DateTime<Utc>],
    spec: &DurationSpec,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "to_have_gaps_larger_than";
    let ordered = sorted(dates);
    let mut found = None;
    for (i, pair) in ordered.windows(2).enumerate() {
        let limit = spec
            .span_from(pair[0], clock)
            .ok_or_else(|| MatcherError::usage(NAME, format!("duration {spec} is out of range")))?;
        if (pair[1] - pair[0]).num_milliseconds() > limit {
            found = Some(i + 1);
            break;
        }
    }
    let outcome = MatchOutcome::new(
        NAME,
        found.is_some(),
        format!("a gap larger than {spec}"),
        fmt_list(&ordered),
    );
    Ok(match found {
        Some(index) => outcome.with_detail(format!("gap found at index {index}")),
        None => outcome.with_detail("no gap exceeds the threshold"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::Months;
    use proptest::prelude::*;

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::at(instant("2024-06-01T00:00:00Z"))
    }

    mod ordering {
        use super::*;

        #[test]
        fn test_ascending() {
            let dates = [
                instant("2024-01-01T00:00:00Z"),
                instant("2024-01-01T00:00:00Z"),
                instant("2024-02-01T00:00:00Z"),
            ];
            assert!(to_be_in_ascending_order(&dates).passed);
            assert!(!to_be_in_descending_order(&dates).passed);
        }

        #[test]
        fn test_reports_index() {
            let dates = [
                instant("2024-01-01T00:00:00Z"),
                instant("2024-03-01T00:00:00Z"),
                instant("2024-02-01T00:00:00Z"),
            ];
            let outcome = to_be_in_ascending_order(&dates);
            assert_eq!(outcome.detail.as_deref(), Some("order broken at index 2"));
        }

        #[test]
        fn test_trivial_lists() {
            assert!(to_be_in_ascending_order(&[]).passed);
            assert!(to_be_in_descending_order(&[instant("2024-01-01T00:00:00Z")]).passed);
        }

        proptest! {
            #[test]
            fn prop_sorted_lists(mut secs in prop::collection::vec(0i64..2_000_000_000, 0..12)) {
                secs.sort_unstable();
                let dates: Vec<_> = secs
                    .iter()
                    .map(|s| DateTime::from_timestamp(*s, 0).unwrap())
                    .collect();
                prop_assert!(to_be_in_ascending_order(&dates).passed);
                let all_equal = dates.windows(2).all(|p| p[0] == p[1]);
                prop_assert_eq!(to_be_in_descending_order(&dates).passed, all_equal);
            }
        }
    }

    mod range {
        use super::*;

        #[test]
        fn test_month_range() {
            let dates = [
                instant("2023-02-01T00:00:00Z"),
                instant("2023-01-01T00:00:00Z"),
            ];
            let clock = clock();
            assert!(to_have_date_range(&dates, &DurationSpec::new().months(1), &clock)
                .unwrap()
                .passed);
            assert!(to_have_date_range(&dates, &DurationSpec::new().days(31), &clock)
                .unwrap()
                .passed);
            assert!(!to_have_date_range(&dates, &DurationSpec::new().days(28), &clock)
                .unwrap()
                .passed);
        }

        #[test]
        fn test_empty_is_usage_error() {
            let err = to_have_date_range(&[], &DurationSpec::new().days(1), &clock()).unwrap_err();
            assert!(err.is_usage());
        }

        #[test]
        fn test_overflowing_duration_is_usage_error() {
            let dates = [instant("2024-01-01T00:00:00Z")];
            let huge = DurationSpec::new().hours(i64::MAX);
            assert!(to_have_date_range(&dates, &huge, &clock()).unwrap_err().is_usage());
        }

        #[test]
        fn test_within_range() {
            let start = instant("2024-01-01T00:00:00Z");
            let end = instant("2024-01-31T00:00:00Z");
            let inside = [start, end, instant("2024-01-15T00:00:00Z")];
            assert!(to_all_be_within_range(&inside, start, end).unwrap().passed);

            let outlier = instant("2024-02-02T00:00:00Z");
            let outcome = to_all_be_within_range(&[start, outlier], start, end).unwrap();
            assert!(!outcome.passed);
            assert!(outcome.detail.unwrap().contains("2024-02-02T00:00:00.000Z"));

            assert!(to_all_be_within_range(&[], start, end).unwrap_err().is_usage());
        }
    }

    mod consecutive {
        use super::*;

        #[test]
        fn test_days_unsorted() {
            let dates = [
                instant("2024-01-03T09:00:00Z"),
                instant("2024-01-01T18:00:00Z"),
                instant("2024-01-02T00:00:00Z"),
            ];
            assert!(to_have_consecutive_dates(&dates, DateUnit::Day, &clock())
                .unwrap()
                .passed);
        }

        #[test]
        fn test_gap_index() {
            let dates = [
                instant("2024-01-01T00:00:00Z"),
                instant("2024-02-01T00:00:00Z"),
                instant("2024-04-01T00:00:00Z"),
            ];
            let outcome = to_have_consecutive_dates(&dates, DateUnit::Month, &clock()).unwrap();
            assert!(!outcome.passed);
            assert_eq!(outcome.detail.as_deref(), Some("gap found at index 2"));
        }

        #[test]
        fn test_years_across_boundary() {
            let dates = [
                instant("2023-12-31T00:00:00Z"),
                instant("2024-01-01T00:00:00Z"),
            ];
            assert!(to_have_consecutive_dates(&dates, DateUnit::Year, &clock())
                .unwrap()
                .passed);
            assert!(to_have_consecutive_dates(&dates, DateUnit::Month, &clock())
                .unwrap()
                .passed);
        }

        #[test]
        fn test_needs_two_dates() {
            let single = [instant("2024-01-01T00:00:00Z")];
            let err = to_have_consecutive_dates(&single, DateUnit::Day, &clock()).unwrap_err();
            assert!(err.is_usage());
        }

        #[test]
        fn test_unit_parsing() {
            assert_eq!("Days".parse::<DateUnit>().unwrap(), DateUnit::Day);
            assert_eq!("month".parse::<DateUnit>().unwrap(), DateUnit::Month);
            assert!("week".parse::<DateUnit>().unwrap_err().is_usage());
        }

        fn unit_strategy() -> impl Strategy<Value = DateUnit> {
            prop_oneof![
                Just(DateUnit::Day),
                Just(DateUnit::Month),
                Just(DateUnit::Year)
            ]
        }

        proptest! {
            #[test]
            fn prop_generated_sequence_passes_in_any_order(
                start in 0i64..1_500_000_000,
                unit in unit_strategy(),
                keys in prop::collection::vec(any::<u32>(), 2..10),
            ) {
                let first = DateTime::from_timestamp(start, 0).unwrap();
                let dates: Vec<DateTime<Utc>> = (0..keys.len())
                    .map(|i| {
                        let step = u32::try_from(i).unwrap();
                        match unit {
                            DateUnit::Day => first + chrono::Duration::days(i64::from(step)),
                            DateUnit::Month => {
                                first.checked_add_months(Months::new(step)).unwrap()
                            }
                            DateUnit::Year => {
                                first.checked_add_months(Months::new(step * 12)).unwrap()
                            }
                        }
                    })
                    .collect();

                let mut order: Vec<usize> = (0..dates.len()).collect();
                order.sort_by_key(|&i| keys[i]);
                let shuffled: Vec<DateTime<Utc>> = order.into_iter().map(|i| dates[i]).collect();

                let outcome = to_have_consecutive_dates(&shuffled, unit, &clock()).unwrap();
                prop_assert!(outcome.passed, "{:?}", outcome.detail);
            }
        }
    }

    mod uniqueness {
        use super::*;

        #[test]
        fn test_exact_instants() {
            let a = instant("2024-01-01T08:00:00Z");
            let b = instant("2024-01-01T20:00:00Z");
            assert!(to_have_unique_dates(&[a, b], false, &clock()).unwrap().passed);

            let outcome = to_have_unique_dates(&[a, b], true, &clock()).unwrap();
            assert!(!outcome.passed);
            assert!(outcome.detail.unwrap().contains("2024-01-01T20:00:00.000Z"));
        }

        #[test]
        fn test_duplicate_instant() {
            let a = instant("2024-01-01T08:00:00Z");
            assert!(!to_have_unique_dates(&[a, a], false, &clock()).unwrap().passed);
        }

        #[test]
        fn test_empty_is_usage_error() {
            assert!(to_have_unique_dates(&[], false, &clock()).unwrap_err().is_usage());
        }
    }

    mod gaps {
        use super::*;

        #[test]
        fn test_gap_detection() {
            let dates = [
                instant("2024-01-10T00:00:00Z"),
                instant("2024-01-01T00:00:00Z"),
                instant("2024-01-02T00:00:00Z"),
            ];
            let spec = DurationSpec::new().days(3);
            let outcome = to_have_gaps_larger_than(&dates, &spec, &clock()).unwrap();
            assert!(outcome.passed);
            assert_eq!(outcome.detail.as_deref(), Some("gap found at index 2"));

            let tight = DurationSpec::new().days(8);
            assert!(!to_have_gaps_larger_than(&dates, &tight, &clock()).unwrap().passed);
        }

        #[test]
        fn test_exact_gap_is_not_larger() {
            let dates = [
                instant("2024-01-01T00:00:00Z"),
                instant("2024-01-02T00:00:00Z"),
            ];
            let spec = DurationSpec::new().days(1);
            assert!(!to_have_gaps_larger_than(&dates, &spec, &clock()).unwrap().passed);
        }

        #[test]
        fn test_overflowing_threshold_is_usage_error() {
            let dates = [
                instant("2024-01-01T00:00:00Z"),
                instant("2024-01-02T00:00:00Z"),
            ];
            let huge = DurationSpec::new().years(i64::MAX);
            let err = to_have_gaps_larger_than(&dates, &huge, &clock()).unwrap_err();
            assert!(err.is_usage());
        }
    }
}
