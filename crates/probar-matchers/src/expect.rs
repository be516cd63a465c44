//! Typed `expect` builders.
//!
//! Each builder wraps the value under test, optionally negates, and exposes
//! the matchers that apply to it. A matcher method returns `Ok(())` when the
//! assertion holds and `MatcherError::AssertionFailed` with a rendered
//! message when it does not. Usage and substrate errors pass through
//! unchanged and are never affected by negation.
//!
//! ```ignore
//! expect_value(3).not().to_be_float()?;
//! expect_date(deadline).with_clock(FixedClock::at(now)).to_be_tomorrow()?;
//! expect_locator(&toasts).with_timeout(Duration::from_secs(2)).to_have_visible_count(1).await?;
//! ```

use crate::assertion::date::{self, DayOfWeek, MonthSpec, TzOffset};
use crate::assertion::retry::{poll_until, poll_visible_count_with, StopWhen};
use crate::assertion::text::{self, TextShape};
use crate::assertion::{any_of, date_list, kind, MatchOutcome};
use crate::clock::{Clock, SystemClock};
use crate::config::ExpectConfig;
use crate::duration::DurationSpec;
use crate::locator::{self, ElementSet, TextMatch};
use crate::result::MatcherResult;
use crate::value::Value;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn settle(outcome: MatcherResult<MatchOutcome>, negated: bool) -> MatcherResult<()> {
    match outcome {
        Ok(outcome) => outcome.into_result(negated),
        Err(err) => {
            if err.is_usage() {
                warn!(error = %err, "matcher called with unusable arguments");
            }
            Err(err)
        }
    }
}

/// Start an expectation on a dynamic value
pub fn expect_value(value: impl Into<Value>) -> ValueExpectation {
    ValueExpectation {
        value: value.into(),
        negated: false,
    }
}

/// Expectation on a dynamic value
#[derive(Debug, Clone)]
pub struct ValueExpectation {
    value: Value,
    negated: bool,
}

impl ValueExpectation {
    /// Invert the next matcher
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    fn check(&self, outcome: MatchOutcome) -> MatcherResult<()> {
        settle(Ok(outcome), self.negated)
    }

    /// Equal to at least one of `possibilities`
    pub fn to_be_one_of(&self, possibilities: &[Value]) -> MatcherResult<()> {
        self.check(any_of::to_be_one_of(&self.value, possibilities))
    }

    /// `null` or `undefined`
    pub fn to_be_nil(&self) -> MatcherResult<()> {
        self.check(kind::to_be_nil(&self.value))
    }

    /// A finite whole number
    pub fn to_be_integer(&self) -> MatcherResult<()> {
        self.check(kind::to_be_integer(&self.value))
    }

    /// A finite number with a fractional part
    pub fn to_be_float(&self) -> MatcherResult<()> {
        self.check(kind::to_be_float(&self.value))
    }

    /// A primitive
    pub fn to_be_primitive(&self) -> MatcherResult<()> {
        self.check(kind::to_be_primitive(&self.value))
    }

    /// A list
    pub fn to_be_array(&self) -> MatcherResult<()> {
        self.check(kind::to_be_array(&self.value))
    }

    /// A non-list composite
    pub fn to_be_object(&self) -> MatcherResult<()> {
        self.check(kind::to_be_object(&self.value))
    }
}

/// Start an expectation on a string
pub fn expect_str(s: &str) -> StrExpectation<'_> {
    StrExpectation { s, negated: false }
}

/// Expectation on a string
#[derive(Debug, Clone, Copy)]
pub struct StrExpectation<'a> {
    s: &'a str,
    negated: bool,
}

impl StrExpectation<'_> {
    /// Invert the next matcher
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    fn shape(&self, shape: TextShape) -> MatcherResult<()> {
        settle(Ok(shape.evaluate(self.s)), self.negated)
    }

    /// Starts with `prefix`
    pub fn to_start_with(&self, prefix: &str) -> MatcherResult<()> {
        self.shape(TextShape::StartsWith(prefix.to_string()))
    }

    /// Ends with `suffix`
    pub fn to_end_with(&self, suffix: &str) -> MatcherResult<()> {
        self.shape(TextShape::EndsWith(suffix.to_string()))
    }

    /// Matches `pattern`
    pub fn to_match(&self, pattern: &Regex) -> MatcherResult<()> {
        settle(Ok(text::to_match_pattern(self.s, pattern)), self.negated)
    }

    /// An email address
    pub fn to_be_email(&self) -> MatcherResult<()> {
        self.shape(TextShape::Email)
    }

    /// A URL
    pub fn to_be_url(&self) -> MatcherResult<()> {
        self.shape(TextShape::Url)
    }

    /// ASCII letters and digits only
    pub fn to_be_alphanumeric(&self) -> MatcherResult<()> {
        self.shape(TextShape::Alphanumeric)
    }

    /// ASCII digits only
    pub fn to_be_numeric(&self) -> MatcherResult<()> {
        self.shape(TextShape::Numeric)
    }

    /// Unchanged by upper-casing
    pub fn to_be_uppercase(&self) -> MatcherResult<()> {
        self.shape(TextShape::Uppercase)
    }

    /// Unchanged by lower-casing
    pub fn to_be_lowercase(&self) -> MatcherResult<()> {
        self.shape(TextShape::Lowercase)
    }

    /// Every word capitalised
    pub fn to_be_title_case(&self) -> MatcherResult<()> {
        self.shape(TextShape::TitleCase)
    }

    /// A UUID, of `version` if given
    pub fn to_be_uuid(&self, version: Option<u8>) -> MatcherResult<()> {
        settle(text::to_be_uuid(self.s, version), self.negated)
    }

    /// An ISO 8601 date-time
    pub fn to_be_valid_iso_date(&self) -> MatcherResult<()> {
        settle(Ok(date::to_be_valid_iso_date(self.s)), self.negated)
    }
}

/// Start an expectation on an instant
pub fn expect_date(at: DateTime<Utc>) -> DateExpectation {
    DateExpectation {
        at,
        negated: false,
        clock: Arc::new(SystemClock),
    }
}

/// Expectation on an instant
#[derive(Clone)]
pub struct DateExpectation {
    at: DateTime<Utc>,
    negated: bool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for DateExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateExpectation")
            .field("at", &self.at)
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}

impl DateExpectation {
    /// Invert the next matcher
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Resolve calendar questions through `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn check(&self, outcome: MatchOutcome) -> MatcherResult<()> {
        settle(Ok(outcome), self.negated)
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Within `tolerance` of `expected`, inclusive
    pub fn to_be_close_to(
        &self,
        expected: DateTime<Utc>,
        tolerance: &DurationSpec,
    ) -> MatcherResult<()> {
        settle(date::to_be_close_to(self.at, expected, tolerance), self.negated)
    }

    /// Strictly before `other`
    pub fn to_be_before(&self, other: DateTime<Utc>) -> MatcherResult<()> {
        self.check(date::to_be_before(self.at, other))
    }

    /// Strictly after `other`
    pub fn to_be_after(&self, other: DateTime<Utc>) -> MatcherResult<()> {
        self.check(date::to_be_after(self.at, other))
    }

    /// Within `[start, end]`
    pub fn to_be_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> MatcherResult<()> {
        self.check(date::to_be_between(self.at, start, end))
    }

    /// Same local calendar day as `other`
    pub fn to_be_same_day(&self, other: DateTime<Utc>) -> MatcherResult<()> {
        self.check(date::to_be_same_day(self.at, other, self.clock()))
    }

    /// Same local year and month as `other`
    pub fn to_be_same_month(&self, other: DateTime<Utc>) -> MatcherResult<()> {
        self.check(date::to_be_same_month(self.at, other, self.clock()))
    }

    /// Same local year as `other`
    pub fn to_be_same_year(&self, other: DateTime<Utc>) -> MatcherResult<()> {
        self.check(date::to_be_same_year(self.at, other, self.clock()))
    }

    /// On the current local day
    pub fn to_be_today(&self) -> MatcherResult<()> {
        self.check(date::to_be_today(self.at, self.clock()))
    }

    /// On the previous local day
    pub fn to_be_yesterday(&self) -> MatcherResult<()> {
        self.check(date::to_be_yesterday(self.at, self.clock()))
    }

    /// On the next local day
    pub fn to_be_tomorrow(&self) -> MatcherResult<()> {
        self.check(date::to_be_tomorrow(self.at, self.clock()))
    }

    /// Monday to Friday
    pub fn to_be_weekday(&self) -> MatcherResult<()> {
        self.check(date::to_be_weekday(self.at, self.clock()))
    }

    /// Saturday or Sunday
    pub fn to_be_weekend(&self) -> MatcherResult<()> {
        self.check(date::to_be_weekend(self.at, self.clock()))
    }

    /// Before now
    pub fn to_be_in_past(&self) -> MatcherResult<()> {
        self.check(date::to_be_in_past(self.at, self.clock()))
    }

    /// After now
    pub fn to_be_in_future(&self) -> MatcherResult<()> {
        self.check(date::to_be_in_future(self.at, self.clock()))
    }

    /// In a leap year
    pub fn to_be_leap_year(&self) -> MatcherResult<()> {
        self.check(date::to_be_leap_year(self.at, self.clock()))
    }

    /// Local offset equals `offset`
    pub fn to_match_time_zone(&self, offset: impl Into<TzOffset>) -> MatcherResult<()> {
        let offset = offset.into();
        settle(
            date::to_match_time_zone(self.at, &offset, self.clock()),
            self.negated,
        )
    }

    /// First day of its local month
    pub fn to_be_start_of_month(&self) -> MatcherResult<()> {
        self.check(date::to_be_start_of_month(self.at, self.clock()))
    }

    /// Last day of its local month
    pub fn to_be_end_of_month(&self) -> MatcherResult<()> {
        self.check(date::to_be_end_of_month(self.at, self.clock()))
    }

    /// In quarter 1 to 4
    pub fn to_be_in_quarter(&self, quarter: u32) -> MatcherResult<()> {
        settle(
            date::to_be_in_quarter(self.at, quarter, self.clock()),
            self.negated,
        )
    }

    /// On the given weekday
    pub fn to_be_day_of_week(&self, day: impl Into<DayOfWeek>) -> MatcherResult<()> {
        let day = day.into();
        settle(
            date::to_be_day_of_week(self.at, &day, self.clock()),
            self.negated,
        )
    }

    /// In the given month
    pub fn to_be_in_month(&self, month: impl Into<MonthSpec>) -> MatcherResult<()> {
        let month = month.into();
        settle(
            date::to_be_in_month(self.at, &month, self.clock()),
            self.negated,
        )
    }
}

/// Start an expectation on a list of instants
pub fn expect_dates(dates: &[DateTime<Utc>]) -> DatesExpectation<'_> {
    DatesExpectation {
        dates,
        negated: false,
        clock: Arc::new(SystemClock),
    }
}

/// Expectation on a list of instants
#[derive(Clone)]
pub struct DatesExpectation<'a> {
    dates: &'a [DateTime<Utc>],
    negated: bool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for DatesExpectation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatesExpectation")
            .field("dates", &self.dates)
            .field("negated", &self.negated)
            .finish_non_exhaustive()
    }
}

impl DatesExpectation<'_> {
    /// Invert the next matcher
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Resolve calendar questions through `clock`
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Non-decreasing
    pub fn to_be_in_ascending_order(&self) -> MatcherResult<()> {
        settle(Ok(date_list::to_be_in_ascending_order(self.dates)), self.negated)
    }

    /// Non-increasing
    pub fn to_be_in_descending_order(&self) -> MatcherResult<()> {
        settle(Ok(date_list::to_be_in_descending_order(self.dates)), self.negated)
    }

    /// Latest minus earliest equals `spec`
    pub fn to_have_date_range(&self, spec: &DurationSpec) -> MatcherResult<()> {
        settle(
            date_list::to_have_date_range(self.dates, spec, self.clock.as_ref()),
            self.negated,
        )
    }

    /// Sorted, each one `unit` after the previous
    pub fn to_have_consecutive_dates(&self, unit: date_list::DateUnit) -> MatcherResult<()> {
        settle(
            date_list::to_have_consecutive_dates(self.dates, unit, self.clock.as_ref()),
            self.negated,
        )
    }

    /// Every date within `[start, end]`
    pub fn to_all_be_within_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> MatcherResult<()> {
        settle(
            date_list::to_all_be_within_range(self.dates, start, end),
            self.negated,
        )
    }

    /// No duplicates, comparing local days when `ignore_time`
    pub fn to_have_unique_dates(&self, ignore_time: bool) -> MatcherResult<()> {
        settle(
            date_list::to_have_unique_dates(self.dates, ignore_time, self.clock.as_ref()),
            self.negated,
        )
    }

    /// Some gap between neighbours exceeds `spec`
    pub fn to_have_gaps_larger_than(&self, spec: &DurationSpec) -> MatcherResult<()> {
        settle(
            date_list::to_have_gaps_larger_than(self.dates, spec, self.clock.as_ref()),
            self.negated,
        )
    }
}

/// Start an expectation on an element set
pub fn expect_locator<S: ElementSet + ?Sized>(set: &S) -> LocatorExpectation<'_, S> {
    LocatorExpectation {
        set,
        negated: false,
        timeout: None,
        config: None,
    }
}

/// Expectation on an element set
pub struct LocatorExpectation<'a, S: ElementSet + ?Sized> {
    set: &'a S,
    negated: bool,
    timeout: Option<Duration>,
    config: Option<ExpectConfig>,
}

impl<S: ElementSet + ?Sized> fmt::Debug for LocatorExpectation<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorExpectation")
            .field("selector", &self.set.selector())
            .field("negated", &self.negated)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<S: ElementSet + ?Sized> LocatorExpectation<'_, S> {
    /// Invert the next matcher
    #[must_use]
    pub fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Override the polling timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use `config` instead of [`ExpectConfig::global`]
    #[must_use]
    pub fn with_config(mut self, config: ExpectConfig) -> Self {
        self.config = Some(config);
        self
    }

    fn config(&self) -> &ExpectConfig {
        self.config.as_ref().unwrap_or_else(|| ExpectConfig::global())
    }

    fn timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| self.config().timeout())
    }

    /// Re-read until the (possibly negated) verdict holds or time runs out
    async fn eventually<F, Fut>(&self, read: F) -> MatcherResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = MatcherResult<MatchOutcome>>,
    {
        let negated = self.negated;
        let schedule = self.config().schedule();
        let polled = poll_until(&schedule, self.timeout(), read, |o| o.passed != negated).await;
        settle(polled.map(|p| p.last), negated)
    }

    /// Exactly `expected` elements visible within the timeout
    ///
    /// Negated, this still polls for equality but never stops early: a
    /// count that matches only briefly is ignored, and the assertion fails
    /// if the count equals `expected` at the deadline.
    pub async fn to_have_visible_count(&self, expected: usize) -> MatcherResult<()> {
        let stop = if self.negated {
            StopWhen::Deadline
        } else {
            StopWhen::Matched
        };
        let schedule = self.config().schedule();
        let count =
            poll_visible_count_with(self.set, expected, self.timeout(), &schedule, stop).await?;
        settle(Ok(count.outcome(expected)), self.negated)
    }

    /// `placeholder` attribute
    pub async fn to_have_placeholder(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_placeholder(self.set, &expected)).await
    }

    /// `href` attribute
    pub async fn to_have_href(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_href(self.set, &expected)).await
    }

    /// `src` attribute
    pub async fn to_have_src(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_src(self.set, &expected)).await
    }

    /// `alt` attribute
    pub async fn to_have_alt(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_alt(self.set, &expected)).await
    }

    /// `title` attribute
    pub async fn to_have_title(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_title(self.set, &expected)).await
    }

    /// `aria-label` attribute
    pub async fn to_have_aria_label(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_aria_label(self.set, &expected)).await
    }

    /// `target` attribute
    pub async fn to_have_target(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_target(self.set, &expected)).await
    }

    /// Data attribute present, with the given value if any
    pub async fn to_have_data_attribute(
        &self,
        name: &str,
        expected: Option<TextMatch>,
    ) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_data_attribute(self.set, name, expected.as_ref()))
            .await
    }

    /// Text starts with `prefix`
    pub async fn to_have_text_starting_with(&self, prefix: &str) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_text_starting_with(self.set, prefix)).await
    }

    /// Text ends with `suffix`
    pub async fn to_have_text_ending_with(&self, suffix: &str) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_text_ending_with(self.set, suffix)).await
    }

    /// Text matches `pattern`
    pub async fn to_have_text_matching(&self, pattern: &Regex) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_text_matching(self.set, pattern)).await
    }

    /// Text is an email address
    pub async fn to_have_email_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_email_text(self.set)).await
    }

    /// Text is a URL
    pub async fn to_have_url_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_url_text(self.set)).await
    }

    /// Text is letters and digits
    pub async fn to_have_alphanumeric_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_alphanumeric_text(self.set)).await
    }

    /// Text is digits
    pub async fn to_have_numeric_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_numeric_text(self.set)).await
    }

    /// Text is upper case
    pub async fn to_have_uppercase_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_uppercase_text(self.set)).await
    }

    /// Text is lower case
    pub async fn to_have_lowercase_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_lowercase_text(self.set)).await
    }

    /// Text is title case
    pub async fn to_have_title_case_text(&self) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_title_case_text(self.set)).await
    }

    /// Text is a UUID
    pub async fn to_have_uuid_text(&self, version: Option<u8>) -> MatcherResult<()> {
        self.eventually(|| locator::to_have_uuid_text(self.set, version)).await
    }

    /// Own text, excluding descendants
    pub async fn to_have_direct_text(&self, expected: impl Into<TextMatch>) -> MatcherResult<()> {
        let expected = expected.into();
        self.eventually(|| locator::to_have_direct_text(self.set, &expected)).await
    }
}
