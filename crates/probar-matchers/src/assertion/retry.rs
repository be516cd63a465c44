//! Polling assertions for eventually-consistent UI state.
//!
//! [`poll_until`] re-observes a value on a [`PollSchedule`] until it
//! matches or the timeout elapses. [`poll_to_deadline`] keeps observing
//! until the timeout regardless and judges the last observation.
//! Observation errors are never retried.

use super::MatchOutcome;
use crate::locator::{Element, ElementSet};
use crate::result::MatcherResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Default delays between attempts, in milliseconds
pub const DEFAULT_POLL_INTERVALS_MS: [u64; 5] = [0, 20, 50, 100, 200];

/// Default polling timeout, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Delays between polling attempts
///
/// The n-th delay is waited after the n-th failed attempt; once the list is
/// exhausted its last delay repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    intervals: Vec<Duration>,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from_millis(&DEFAULT_POLL_INTERVALS_MS)
    }
}

impl PollSchedule {
    /// Create a schedule; an empty list falls back to the default
    #[must_use]
    pub fn new(intervals: impl IntoIterator<Item = Duration>) -> Self {
        let intervals: Vec<Duration> = intervals.into_iter().collect();
        if intervals.is_empty() {
            Self::default()
        } else {
            Self { intervals }
        }
    }

    /// Create a schedule from millisecond delays
    #[must_use]
    pub fn from_millis(intervals_ms: &[u64]) -> Self {
        Self::new(intervals_ms.iter().map(|&ms| Duration::from_millis(ms)))
    }

    /// Delay to wait after the attempt with zero-based index `attempt`
    #[must_use]
    pub fn delay(&self, attempt: usize) -> Duration {
        self.intervals
            .get(attempt)
            .or_else(|| self.intervals.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }

    /// The configured delays
    #[must_use]
    pub fn intervals(&self) -> &[Duration] {
        &self.intervals
    }
}

/// Result of a polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome<T> {
    /// Whether an observation matched before the timeout
    pub passed: bool,
    /// The last observation made
    pub last: T,
    /// Number of observations
    pub attempts: usize,
    /// Time from the first observation to the last
    pub elapsed: Duration,
}

/// When a polling loop may end before its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopWhen {
    /// At the first matching observation
    #[default]
    Matched,
    /// Only at the deadline; the last observation decides `passed`
    Deadline,
}

/// Observe until `matches` holds or `timeout` elapses
///
/// The first observation is made immediately. After each non-matching
/// observation the loop sleeps for the next scheduled delay, cut short so
/// as not to overrun the deadline, and observes again. A non-matching
/// observation made at or past the deadline ends the loop.
///
/// # Errors
///
/// Returns the first error raised by `observe`, without retrying
pub async fn poll_until<T, F, Fut, M>(
    schedule: &PollSchedule,
    timeout: Duration,
    observe: F,
    matches: M,
) -> MatcherResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MatcherResult<T>>,
    M: Fn(&T) -> bool,
{
    poll(schedule, timeout, StopWhen::Matched, observe, matches).await
}

/// Observe on the schedule until `timeout`, ignoring intermediate matches
///
/// A match seen along the way does not end the loop; `passed` reflects
/// only the observation made at the deadline.
///
/// # Errors
///
/// Returns the first error raised by `observe`, without retrying
pub async fn poll_to_deadline<T, F, Fut, M>(
    schedule: &PollSchedule,
    timeout: Duration,
    observe: F,
    matches: M,
) -> MatcherResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MatcherResult<T>>,
    M: Fn(&T) -> bool,
{
    poll(schedule, timeout, StopWhen::Deadline, observe, matches).await
}

async fn poll<T, F, Fut, M>(
    schedule: &PollSchedule,
    timeout: Duration,
    stop: StopWhen,
    mut observe: F,
    matches: M,
) -> MatcherResult<PollOutcome<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = MatcherResult<T>>,
    M: Fn(&T) -> bool,
{
    let start = Instant::now();
    let mut attempts = 0;
    loop {
        let last = observe().await?;
        attempts += 1;
        let elapsed = start.elapsed();
        let matched = matches(&last);

        if (matched && stop == StopWhen::Matched) || elapsed >= timeout {
            return Ok(PollOutcome {
                passed: matched,
                last,
                attempts,
                elapsed,
            });
        }

        let delay = schedule.delay(attempts - 1).min(timeout - elapsed);
        trace!(attempts, matched, ?delay, "polling again");
        tokio::time::sleep(delay).await;
    }
}

/// Count the elements of `set` that are currently visible
///
/// # Errors
///
/// Propagates resolution and visibility query errors
pub async fn count_visible<S: ElementSet + ?Sized>(set: &S) -> MatcherResult<usize> {
    let mut count = 0;
    for element in set.resolve().await? {
        if element.is_visible().await? {
            count += 1;
        }
    }
    Ok(count)
}

/// Result of polling a visible-element count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleCount {
    /// Whether the count equalled the expectation before the timeout
    pub passed: bool,
    /// Count at the last observation
    pub observed_count: usize,
    /// Number of observations
    pub attempts: usize,
    /// Time spent polling
    pub elapsed: Duration,
}

impl VisibleCount {
    /// Render as a matcher outcome
    #[must_use]
    pub fn outcome(&self, expected: usize) -> MatchOutcome {
        MatchOutcome::new(
            "to_have_visible_count",
            self.passed,
            format!("{expected} visible element(s)"),
            format!("{} visible element(s)", self.observed_count),
        )
        .with_detail(format!(
            "polled {} time(s) over {}ms",
            self.attempts,
            self.elapsed.as_millis()
        ))
    }
}

/// Poll until exactly `expected` elements of `set` are visible, using the
/// default schedule
///
/// # Errors
///
/// Propagates the first resolution or visibility query error
pub async fn poll_visible_count<S: ElementSet + ?Sized>(
    set: &S,
    expected: usize,
    timeout: Duration,
) -> MatcherResult<VisibleCount> {
    poll_visible_count_with(
        set,
        expected,
        timeout,
        &PollSchedule::default(),
        StopWhen::Matched,
    )
    .await
}

/// Poll the visible count of `set` for equality with `expected`
///
/// With [`StopWhen::Deadline`] a transient match does not end the loop;
/// the count observed at the deadline decides the verdict.
///
/// # Errors
///
/// Propagates the first resolution or visibility query error
pub async fn poll_visible_count_with<S: ElementSet + ?Sized>(
    set: &S,
    expected: usize,
    timeout: Duration,
    schedule: &PollSchedule,
    stop: StopWhen,
) -> MatcherResult<VisibleCount> {
    debug!(
        selector = set.selector(),
        expected,
        ?timeout,
        ?stop,
        "polling visible element count"
    );
    let outcome = poll(schedule, timeout, stop, || count_visible(set), |&n| n == expected).await?;
    debug!(
        selector = set.selector(),
        expected,
        observed = outcome.last,
        attempts = outcome.attempts,
        elapsed = ?outcome.elapsed,
        passed = outcome.passed,
        "visible element count polling finished"
    );
    Ok(VisibleCount {
        passed: outcome.passed,
        observed_count: outcome.last,
        attempts: outcome.attempts,
        elapsed: outcome.elapsed,
    })
}
