//! Expectation defaults: polling timeout and schedule.
//!
//! Defaults can be overridden from the environment or a YAML file:
//!
//! ```yaml
//! timeout_ms: 2000
//! poll_intervals_ms: [0, 50, 100]
//! ```

use crate::assertion::retry::{PollSchedule, DEFAULT_POLL_INTERVALS_MS, DEFAULT_TIMEOUT_MS};
use crate::result::{MatcherError, MatcherResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable overriding [`ExpectConfig::timeout_ms`]
pub const TIMEOUT_ENV: &str = "PROBAR_EXPECT_TIMEOUT_MS";

/// Environment variable overriding [`ExpectConfig::poll_intervals_ms`]
pub const POLL_INTERVALS_ENV: &str = "PROBAR_EXPECT_POLL_INTERVALS_MS";

/// Defaults applied by polling expectations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectConfig {
    /// How long a polling assertion waits, in milliseconds
    pub timeout_ms: u64,
    /// Delays between attempts, in milliseconds; the last one repeats
    pub poll_intervals_ms: Vec<u64>,
}

impl Default for ExpectConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_intervals_ms: DEFAULT_POLL_INTERVALS_MS.to_vec(),
        }
    }
}

impl ExpectConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the poll intervals
    #[must_use]
    pub fn with_poll_intervals(mut self, intervals_ms: impl Into<Vec<u64>>) -> Self {
        self.poll_intervals_ms = intervals_ms.into();
        self
    }

    /// Timeout as a duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll schedule built from the intervals
    #[must_use]
    pub fn schedule(&self) -> PollSchedule {
        PollSchedule::from_millis(&self.poll_intervals_ms)
    }

    /// Check the configuration is usable
    ///
    /// # Errors
    ///
    /// Returns a config error when the interval list is empty
    pub fn validate(&self) -> MatcherResult<()> {
        if self.poll_intervals_ms.is_empty() {
            return Err(MatcherError::Config {
                message: "poll_intervals_ms must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults overlaid with [`TIMEOUT_ENV`] and [`POLL_INTERVALS_ENV`]
    ///
    /// Values that fail to parse are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(timeout) = lookup(TIMEOUT_ENV).and_then(|v| v.trim().parse().ok()) {
            config.timeout_ms = timeout;
        }
        if let Some(intervals) = lookup(POLL_INTERVALS_ENV).and_then(|v| parse_intervals(&v)) {
            config.poll_intervals_ms = intervals;
        }
        config
    }

    /// Parse from YAML; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error on malformed YAML or an invalid configuration
    pub fn from_yaml_str(yaml: &str) -> MatcherResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_yaml_file(path: impl AsRef<Path>) -> MatcherResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Process-wide defaults, read from the environment on first use
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<ExpectConfig> = OnceLock::new();
        GLOBAL.get_or_init(Self::from_env)
    }
}

fn parse_intervals(raw: &str) -> Option<Vec<u64>> {
    let intervals: Vec<u64> = raw
        .split(',')
        .map(|part| part.trim().parse().ok())
        .collect::<Option<_>>()?;
    (!intervals.is_empty()).then_some(intervals)
}
