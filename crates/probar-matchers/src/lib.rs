//! Probar Matchers: extended `expect` assertions
//!
//! Predicates over dynamic values, dates, lists of dates, strings and page
//! elements. Every predicate except the visible-count poll is a pure
//! function producing a [`MatchOutcome`]; the [`expect`] builders turn
//! outcomes into `Result`s and apply negation.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   probar-matchers                             │
//! ├───────────────────────────────────────────────────────────────┤
//! │  expect_*()  ──►  assertion::{any_of, kind, date, date_list,  │
//! │  registry         text}        (pure, return MatchOutcome)    │
//! │       │                                                       │
//! │       └──────►  locator ──► Element / ElementSet (async)      │
//! │                 assertion::retry (tokio poll loop)            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use probar_matchers::prelude::*;
//!
//! expect_value(Value::from(2.5)).to_be_float()?;
//! expect_str("550e8400-e29b-41d4-a716-446655440000").to_be_uuid(Some(4))?;
//! expect_locator(&rows).to_have_visible_count(3).await?;
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

pub mod assertion;
pub mod clock;
pub mod config;
pub mod duration;
pub mod expect;
pub mod locator;
pub mod logging;
pub mod mock;
pub mod registry;
pub mod result;
pub mod value;

pub use assertion::date::{DayOfWeek, MonthSpec, TzOffset};
pub use assertion::date_list::DateUnit;
pub use assertion::retry::{
    poll_to_deadline, poll_until, poll_visible_count, PollOutcome, PollSchedule, StopWhen,
    VisibleCount,
};
pub use assertion::MatchOutcome;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ExpectConfig;
pub use duration::DurationSpec;
pub use expect::{expect_date, expect_dates, expect_locator, expect_str, expect_value};
pub use locator::{Element, ElementSet, TextMatch};
pub use registry::{MatcherFn, MatcherRegistry};
pub use result::{MatcherError, MatcherResult};
pub use value::{Kind, Value};

/// Common imports
pub mod prelude {
    pub use crate::assertion::MatchOutcome;
    pub use crate::clock::{Clock, FixedClock, SystemClock};
    pub use crate::config::ExpectConfig;
    pub use crate::duration::DurationSpec;
    pub use crate::expect::{expect_date, expect_dates, expect_locator, expect_str, expect_value};
    pub use crate::locator::{Element, ElementSet, TextMatch};
    pub use crate::result::{MatcherError, MatcherResult};
    pub use crate::value::Value;
    pub use crate::DateUnit;
}
