//! Clock abstraction for calendar-dependent matchers.
//!
//! Date values are instants with no embedded zone. "Today", "weekday" and
//! the other calendar predicates resolve them through a [`Clock`], which
//! supplies the current instant and the local UTC offset. Tests install a
//! [`FixedClock`] to make those predicates deterministic.

use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};

/// Source of "now" and of the local calendar
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;

    /// Local UTC offset in effect at `at`
    fn offset_at(&self, at: DateTime<Utc>) -> FixedOffset;

    /// Map a local wall-clock time back to an instant
    fn resolve_local(&self, local: NaiveDateTime) -> DateTime<Utc>;

    /// Resolve an instant to local wall-clock time
    fn to_local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.offset_at(at)).naive_local()
    }

    /// Local calendar date of an instant
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        self.to_local(at).date()
    }

    /// Local calendar date of the current instant
    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }
}

/// The process's real clock and local zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset_at(&self, at: DateTime<Utc>) -> FixedOffset {
        Local.offset_from_utc_datetime(&at.naive_utc()).fix()
    }

    fn resolve_local(&self, local: NaiveDateTime) -> DateTime<Utc> {
        match Local.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            // Wall-clock time skipped by a DST jump; use the offset before it
            LocalResult::None => {
                let offset = Local.offset_from_utc_datetime(&local).fix();
                (local - offset).and_utc()
            }
        }
    }
}

/// A clock frozen at one instant with a constant offset
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Frozen at `now`, local zone is UTC
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }

    /// Set the local offset (east of UTC)
    #[must_use]
    pub const fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn offset_at(&self, _at: DateTime<Utc>) -> FixedOffset {
        self.offset
    }

    fn resolve_local(&self, local: NaiveDateTime) -> DateTime<Utc> {
        (local - self.offset).and_utc()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_fixed_clock_now() {
        let clock = FixedClock::at(instant("2024-03-10T12:00:00Z"));
        assert_eq!(clock.now(), instant("2024-03-10T12:00:00Z"));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_offset_moves_calendar_day() {
        let clock = FixedClock::at(instant("2024-03-10T23:30:00Z"))
            .with_offset(FixedOffset::east_opt(2 * 3600).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_local_round_trip() {
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let clock = FixedClock::at(Utc::now()).with_offset(west);
        let at = instant("2024-01-31T03:15:00Z");
        assert_eq!(clock.resolve_local(clock.to_local(at)), at);
    }

    #[test]
    fn test_system_clock_round_trip() {
        let clock = SystemClock;
        let at = instant("2024-06-15T12:00:00Z");
        assert_eq!(clock.resolve_local(clock.to_local(at)), at);
    }
}
