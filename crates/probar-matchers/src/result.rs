//! Result and error types for probar-matchers.

use thiserror::Error;

/// Result type for matcher operations
pub type MatcherResult<T> = Result<T, MatcherError>;

/// Errors that can occur while evaluating a matcher
///
/// The variants fall into three classes that callers must not confuse:
/// usage errors (a mistake in the test itself), assertion failures, and
/// substrate errors raised by the element-set being inspected.
#[derive(Debug, Error)]
pub enum MatcherError {
    /// Matcher called with arguments it cannot evaluate
    #[error("{matcher}: {message}")]
    Usage {
        /// Matcher name
        matcher: &'static str,
        /// Error message
        message: String,
    },

    /// Time-zone offset string could not be parsed
    #[error("Invalid time zone offset: {offset:?} (expected \"+HH:MM\", \"-HH:MM\" or \"UTC\")")]
    InvalidOffset {
        /// The offending offset string
        offset: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Rendered failure message
        message: String,
    },

    /// Element or visibility query failed
    #[error("Element query failed: {message}")]
    Substrate {
        /// Error message
        message: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl MatcherError {
    /// Shorthand for a usage error
    pub fn usage(matcher: &'static str, message: impl Into<String>) -> Self {
        Self::Usage {
            matcher,
            message: message.into(),
        }
    }

    /// Shorthand for a substrate error
    pub fn substrate(message: impl Into<String>) -> Self {
        Self::Substrate {
            message: message.into(),
        }
    }

    /// Whether this is a programming error in the test
    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage { .. } | Self::InvalidOffset { .. })
    }

    /// Whether the assertion itself evaluated to the wrong result
    #[must_use]
    pub const fn is_assertion_failure(&self) -> bool {
        matches!(self, Self::AssertionFailed { .. })
    }

    /// Whether the element-set query failed
    #[must_use]
    pub const fn is_substrate(&self) -> bool {
        matches!(self, Self::Substrate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_classification() {
        let err = MatcherError::usage("to_have_date_range", "requires at least one date");
        assert!(err.is_usage());
        assert!(!err.is_assertion_failure());
        assert_eq!(
            err.to_string(),
            "to_have_date_range: requires at least one date"
        );
    }

    #[test]
    fn test_invalid_offset_is_usage() {
        let err = MatcherError::InvalidOffset {
            offset: "GMT+2".into(),
        };
        assert!(err.is_usage());
        assert!(err.to_string().contains("GMT+2"));
    }

    #[test]
    fn test_substrate_is_distinct() {
        let err = MatcherError::substrate("page closed");
        assert!(err.is_substrate());
        assert!(!err.is_usage());
        assert!(!err.is_assertion_failure());
    }
}
