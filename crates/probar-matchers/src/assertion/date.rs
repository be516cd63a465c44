//! Date comparison and calendar predicates.
//!
//! Ordering predicates work on instants. Calendar predicates (same day,
//! weekday, start of month, ...) resolve instants to local dates through a
//! [`Clock`].

use super::MatchOutcome;
use crate::clock::Clock;
use crate::duration::DurationSpec;
use crate::result::{MatcherError, MatcherResult};
use chrono::{
    DateTime, Datelike, Duration, Month, NaiveDate, NaiveDateTime, SecondsFormat, Utc, Weekday,
};
use regex::Regex;
use std::sync::OnceLock;

/// Render an instant for messages
#[must_use]
pub fn fmt_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn fmt_seconds(ms: i64) -> String {
    let secs = ms as f64 / 1000.0;
    format!("{secs} seconds")
}

/// Passes iff `actual` is within `tolerance` of `expected` (inclusive)
///
/// Only the fixed units (days, hours, minutes, seconds) of `tolerance`
/// count towards the allowed deviation.
///
/// # Errors
///
/// Returns a usage error if the tolerance does not fit in milliseconds
pub fn to_be_close_to(
    actual: DateTime<Utc>,
    expected: DateTime<Utc>,
    tolerance: &DurationSpec,
) -> MatcherResult<MatchOutcome> {
    const NAME: &str = "to_be_close_to";
    let allowed = tolerance
        .fixed_millis()
        .and_then(i64::checked_abs)
        .ok_or_else(|| {
            MatcherError::usage(NAME, format!("tolerance {tolerance} is out of range"))
        })?;
    let diff = (actual - expected).num_milliseconds();
    let direction = if diff < 0 { "earlier" } else { "later" };
    Ok(MatchOutcome::new(
        NAME,
        diff.abs() <= allowed,
        format!("{} ± {}", fmt_instant(expected), fmt_seconds(allowed)),
        fmt_instant(actual),
    )
    .with_detail(format!(
        "Received date is {} {direction} than expected; allowed deviation is {}",
        fmt_seconds(diff.abs()),
        fmt_seconds(allowed)
    )))
}

/// Passes iff `actual` is strictly before `other`
#[must_use]
pub fn to_be_before(actual: DateTime<Utc>, other: DateTime<Utc>) -> MatchOutcome {
    MatchOutcome::new(
        "to_be_before",
        actual < other,
        format!("a date before {}", fmt_instant(other)),
        fmt_instant(actual),
    )
}

/// Passes iff `actual` is strictly after `other`
#[must_use]
pub fn to_be_after(actual: DateTime<Utc>, other: DateTime<Utc>) -> MatchOutcome {
    MatchOutcome::new(
        "to_be_after",
        actual > other,
        format!("a date after {}", fmt_instant(other)),
        fmt_instant(actual),
    )
}

/// Passes iff `start <= actual <= end`
#[must_use]
pub fn to_be_between(
    actual: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> MatchOutcome {
    MatchOutcome::new(
        "to_be_between",
        start <= actual && actual <= end,
        format!("a date between {} and {}", fmt_instant(start), fmt_instant(end)),
        fmt_instant(actual),
    )
}

/// Passes iff both instants fall on the same local calendar day
#[must_use]
pub fn to_be_same_day(
    actual: DateTime<Utc>,
    other: DateTime<Utc>,
    clock: &dyn Clock,
) -> MatchOutcome {
    let (a, b) = (clock.local_date(actual), clock.local_date(other));
    MatchOutcome::new(
        "to_be_same_day",
        a == b,
        format!("a date on {b}"),
        format!("{} ({a})", fmt_instant(actual)),
    )
}

/// Passes iff both instants fall in the same local year and month
#[must_use]
pub fn to_be_same_month(
    actual: DateTime<Utc>,
    other: DateTime<Utc>,
    clock: &dyn Clock,
) -> MatchOutcome {
    let (a, b) = (clock.local_date(actual), clock.local_date(other));
    MatchOutcome::new(
        "to_be_same_month",
        a.year() == b.year() && a.month() == b.month(),
        format!("a date in {}-{:02}", b.year(), b.month()),
        format!("{} ({}-{:02})", fmt_instant(actual), a.year(), a.month()),
    )
}

/// Passes iff both instants fall in the same local year
#[must_use]
pub fn to_be_same_year(
    actual: DateTime<Utc>,
    other: DateTime<Utc>,
    clock: &dyn Clock,
) -> MatchOutcome {
    let (a, b) = (clock.local_date(actual), clock.local_date(other));
    MatchOutcome::new(
        "to_be_same_year",
        a.year() == b.year(),
        format!("a date in {}", b.year()),
        format!("{} ({})", fmt_instant(actual), a.year()),
    )
}

fn relative_day(
    matcher: &'static str,
    actual: DateTime<Utc>,
    offset_days: i64,
    clock: &dyn Clock,
) -> MatchOutcome {
    let target = clock.today() + Duration::days(offset_days);
    let day = clock.local_date(actual);
    MatchOutcome::new(
        matcher,
        day == target,
        format!("a date on {target}"),
        format!("{} ({day})", fmt_instant(actual)),
    )
}

/// Passes iff `actual` falls on the clock's current local day
#[must_use]
pub fn to_be_today(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    relative_day("to_be_today", actual, 0, clock)
}

/// Passes iff `actual` falls on the local day before today
#[must_use]
pub fn to_be_yesterday(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    relative_day("to_be_yesterday", actual, -1, clock)
}

/// Passes iff `actual` falls on the local day after today
#[must_use]
pub fn to_be_tomorrow(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    relative_day("to_be_tomorrow", actual, 1, clock)
}

fn is_weekend_day(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Passes iff `actual` falls Monday to Friday in the local calendar
#[must_use]
pub fn to_be_weekday(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let day = clock.local_date(actual).weekday();
    MatchOutcome::new(
        "to_be_weekday",
        !is_weekend_day(day),
        "a weekday (Monday to Friday)",
        format!("{} ({day})", fmt_instant(actual)),
    )
}

/// Passes iff `actual` falls on Saturday or Sunday in the local calendar
#[must_use]
pub fn to_be_weekend(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let day = clock.local_date(actual).weekday();
    MatchOutcome::new(
        "to_be_weekend",
        is_weekend_day(day),
        "a weekend day (Saturday or Sunday)",
        format!("{} ({day})", fmt_instant(actual)),
    )
}

/// Passes iff `actual` is strictly before the clock's current instant
#[must_use]
pub fn to_be_in_past(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let now = clock.now();
    MatchOutcome::new(
        "to_be_in_past",
        actual < now,
        format!("a date before now ({})", fmt_instant(now)),
        fmt_instant(actual),
    )
}

/// Passes iff `actual` is strictly after the clock's current instant
#[must_use]
pub fn to_be_in_future(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let now = clock.now();
    MatchOutcome::new(
        "to_be_in_future",
        actual > now,
        format!("a date after now ({})", fmt_instant(now)),
        fmt_instant(actual),
    )
}

/// Gregorian leap-year rule
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Passes iff the local year of `actual` is a leap year
#[must_use]
pub fn to_be_leap_year(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let year = clock.local_date(actual).year();
    MatchOutcome::new(
        "to_be_leap_year",
        is_leap_year(year),
        "a date in a leap year",
        format!("{} ({year})", fmt_instant(actual)),
    )
}

fn iso_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
            .expect("ISO date pattern compiles")
    })
}

/// Whether `s` is an extended ISO-8601 date-time naming a real instant
#[must_use]
pub fn is_valid_iso_date(s: &str) -> bool {
    let Some(caps) = iso_pattern().captures(s) else {
        return false;
    };
    if caps.get(2).is_some() {
        DateTime::parse_from_rfc3339(s).is_ok()
    } else {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
    }
}

/// Passes iff `s` is a valid ISO-8601 date-time string
#[must_use]
pub fn to_be_valid_iso_date(s: &str) -> MatchOutcome {
    MatchOutcome::new(
        "to_be_valid_iso_date",
        is_valid_iso_date(s),
        "a valid ISO 8601 date string (YYYY-MM-DDTHH:MM:SS[.sss][Z|±HH:MM])",
        format!("{s:?}"),
    )
}

/// UTC offset argument for [`to_match_time_zone`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TzOffset {
    /// Minutes east of UTC
    Minutes(i32),
    /// `"+HH:MM"`, `"-HH:MM"`, `"UTC"` or `"Z"`
    Text(String),
}

impl From<i32> for TzOffset {
    fn from(minutes: i32) -> Self {
        Self::Minutes(minutes)
    }
}

impl From<&str> for TzOffset {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl TzOffset {
    /// Offset in minutes east of UTC
    ///
    /// # Errors
    ///
    /// Returns `InvalidOffset` for text that is not `±HH:MM` or `UTC`
    pub fn minutes(&self) -> MatcherResult<i32> {
        match self {
            Self::Minutes(m) => Ok(*m),
            Self::Text(text) => parse_offset(text),
        }
    }
}

/// Parse `"+HH:MM"`, `"-HH:MM"`, `"UTC"` or `"Z"` into minutes east of UTC
///
/// # Errors
///
/// Returns `InvalidOffset` if the text has any other shape
pub fn parse_offset(text: &str) -> MatcherResult<i32> {
    let invalid = || MatcherError::InvalidOffset {
        offset: text.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(0);
    }
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(sign * (hours * 60 + minutes))
}

fn fmt_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

/// Passes iff the local UTC offset in effect at `actual` equals `offset`
///
/// # Errors
///
/// Returns `InvalidOffset` if `offset` is unparseable text
pub fn to_match_time_zone(
    actual: DateTime<Utc>,
    offset: &TzOffset,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    let expected = offset.minutes()?;
    let observed = clock.offset_at(actual).local_minus_utc() / 60;
    Ok(MatchOutcome::new(
        "to_match_time_zone",
        observed == expected,
        format!("UTC offset {}", fmt_offset(expected)),
        format!("{} (UTC offset {})", fmt_instant(actual), fmt_offset(observed)),
    ))
}

/// Last valid day of a month
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Passes iff `actual` is on the first day of its local month
#[must_use]
pub fn to_be_start_of_month(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let day = clock.local_date(actual);
    MatchOutcome::new(
        "to_be_start_of_month",
        day.day() == 1,
        "the first day of a month",
        format!("{} ({day})", fmt_instant(actual)),
    )
}

/// Passes iff `actual` is on the last day of its local month
#[must_use]
pub fn to_be_end_of_month(actual: DateTime<Utc>, clock: &dyn Clock) -> MatchOutcome {
    let day = clock.local_date(actual);
    let last = days_in_month(day.year(), day.month());
    MatchOutcome::new(
        "to_be_end_of_month",
        day.day() == last,
        format!("the last day of the month (day {last})"),
        format!("{} ({day})", fmt_instant(actual)),
    )
}

/// Passes iff `actual`'s local month falls in quarter `quarter` (1 to 4)
///
/// # Errors
///
/// Returns a usage error for a quarter outside 1..=4
pub fn to_be_in_quarter(
    actual: DateTime<Utc>,
    quarter: u32,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    if !(1..=4).contains(&quarter) {
        return Err(MatcherError::usage(
            "to_be_in_quarter",
            format!("quarter must be between 1 and 4, got {quarter}"),
        ));
    }
    let day = clock.local_date(actual);
    let observed = (day.month() - 1) / 3 + 1;
    Ok(MatchOutcome::new(
        "to_be_in_quarter",
        observed == quarter,
        format!("a date in Q{quarter}"),
        format!("{} (Q{observed})", fmt_instant(actual)),
    ))
}

/// Day-of-week argument: index with 0 = Sunday, or an English name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOfWeek {
    /// 0 (Sunday) to 6 (Saturday)
    Index(u32),
    /// Full or three-letter English name, any case
    Name(String),
}

impl From<u32> for DayOfWeek {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for DayOfWeek {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        Self::Index(day.num_days_from_sunday())
    }
}

impl DayOfWeek {
    /// Resolve to a weekday
    ///
    /// # Errors
    ///
    /// Returns a usage error for an index above 6 or an unknown name
    pub fn resolve(&self) -> MatcherResult<Weekday> {
        const ORDER: [Weekday; 7] = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];
        match self {
            Self::Index(i) => ORDER.get(*i as usize).copied().ok_or_else(|| {
                MatcherError::usage(
                    "to_be_day_of_week",
                    format!("day index must be between 0 (Sunday) and 6 (Saturday), got {i}"),
                )
            }),
            Self::Name(name) => name.trim().parse::<Weekday>().map_err(|_| {
                MatcherError::usage("to_be_day_of_week", format!("unknown day name {name:?}"))
            }),
        }
    }
}

/// Passes iff `actual` falls on `day` in the local calendar
///
/// # Errors
///
/// Returns a usage error if `day` cannot be resolved
pub fn to_be_day_of_week(
    actual: DateTime<Utc>,
    day: &DayOfWeek,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    let expected = day.resolve()?;
    let observed = clock.local_date(actual).weekday();
    Ok(MatchOutcome::new(
        "to_be_day_of_week",
        observed == expected,
        format!("a {expected}"),
        format!("{} ({observed})", fmt_instant(actual)),
    ))
}

/// Month argument: index 1 to 12, or an English name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthSpec {
    /// 1 (January) to 12 (December)
    Index(u32),
    /// Full or three-letter English name, any case
    Name(String),
}

impl From<u32> for MonthSpec {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for MonthSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl MonthSpec {
    /// Resolve to a month number (1 to 12)
    ///
    /// # Errors
    ///
    /// Returns a usage error for an index outside 1..=12 or an unknown name
    pub fn resolve(&self) -> MatcherResult<u32> {
        match self {
            Self::Index(i) if (1..=12).contains(i) => Ok(*i),
            Self::Index(i) => Err(MatcherError::usage(
                "to_be_in_month",
                format!("month index must be between 1 and 12, got {i}"),
            )),
            Self::Name(name) => name
                .trim()
                .parse::<Month>()
                .map(|m| m.number_from_month())
                .map_err(|_| {
                    MatcherError::usage("to_be_in_month", format!("unknown month name {name:?}"))
                }),
        }
    }
}

fn month_name(number: u32) -> &'static str {
    u8::try_from(number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .map_or("?", |m| m.name())
}

/// Passes iff `actual` falls in `month` in the local calendar
///
/// # Errors
///
/// Returns a usage error if `month` cannot be resolved
pub fn to_be_in_month(
    actual: DateTime<Utc>,
    month: &MonthSpec,
    clock: &dyn Clock,
) -> MatcherResult<MatchOutcome> {
    let expected = month.resolve()?;
    let observed = clock.local_date(actual).month();
    Ok(MatchOutcome::new(
        "to_be_in_month",
        observed == expected,
        format!("a date in {}", month_name(expected)),
        format!("{} ({})", fmt_instant(actual), month_name(observed)),
    ))
}
