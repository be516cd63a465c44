//! Matcher outcomes and failure-message rendering.
//!
//! Every matcher is a plain function returning a [`MatchOutcome`]. The
//! outcome records what was expected and what was observed; whether it
//! counts as a failure depends on negation, which only the caller knows.

use crate::result::MatcherError;

pub mod any_of;
pub mod date;
pub mod date_list;
pub mod kind;
pub mod retry;
pub mod text;

/// Result of evaluating one matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Matcher name, as shown in the failure hint
    pub matcher: &'static str,
    /// Whether the predicate held
    pub passed: bool,
    /// Rendered expectation
    pub expected: String,
    /// Rendered observation
    pub received: String,
    /// Extra explanation for the failure, if any
    pub detail: Option<String>,
}

impl MatchOutcome {
    /// Create an outcome
    #[must_use]
    pub fn new(
        matcher: &'static str,
        passed: bool,
        expected: impl Into<String>,
        received: impl Into<String>,
    ) -> Self {
        Self {
            matcher,
            passed,
            expected: expected.into(),
            received: received.into(),
            detail: None,
        }
    }

    /// Attach an explanation
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Whether the assertion succeeds once negation is applied
    #[must_use]
    pub const fn succeeds(&self, negated: bool) -> bool {
        self.passed != negated
    }

    /// Render the failure message
    #[must_use]
    pub fn message(&self, negated: bool) -> String {
        let not = if negated { "not " } else { "" };
        let mut message = format!(
            "{}\n\nExpected: {not}{}\nReceived: {}",
            matcher_hint(self.matcher, negated),
            self.expected,
            self.received
        );
        if let Some(ref detail) = self.detail {
            message.push_str("\n\n");
            message.push_str(detail);
        }
        message
    }

    /// Convert into `Ok(())` or an assertion failure
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` if the outcome does not succeed under
    /// the given negation
    pub fn into_result(self, negated: bool) -> Result<(), MatcherError> {
        if self.succeeds(negated) {
            Ok(())
        } else {
            Err(MatcherError::AssertionFailed {
                message: self.message(negated),
            })
        }
    }
}

/// `expect(received).not.matcher(expected)` style header
#[must_use]
pub fn matcher_hint(matcher: &str, negated: bool) -> String {
    let not = if negated { ".not" } else { "" };
    format!("expect(received){not}.{matcher}(expected)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint() {
        assert_eq!(
            matcher_hint("to_be_nil", false),
            "expect(received).to_be_nil(expected)"
        );
        assert_eq!(
            matcher_hint("to_be_nil", true),
            "expect(received).not.to_be_nil(expected)"
        );
    }

    #[test]
    fn test_negation() {
        let outcome = MatchOutcome::new("to_be_integer", true, "an integer", "3");
        assert!(outcome.succeeds(false));
        assert!(!outcome.succeeds(true));
    }

    #[test]
    fn test_message_contents() {
        let outcome = MatchOutcome::new("to_be_integer", false, "an integer", "3.5")
            .with_detail("3.5 is not a whole number");
        let message = outcome.message(false);
        assert!(message.starts_with("expect(received).to_be_integer(expected)"));
        assert!(message.contains("Expected: an integer"));
        assert!(message.contains("Received: 3.5"));
        assert!(message.ends_with("3.5 is not a whole number"));

        let negated = outcome.message(true);
        assert!(negated.contains(".not.to_be_integer"));
        assert!(negated.contains("Expected: not an integer"));
    }

    #[test]
    fn test_into_result() {
        let ok = MatchOutcome::new("to_be_nil", true, "null or undefined", "null");
        assert!(ok.clone().into_result(false).is_ok());
        let err = ok.into_result(true).unwrap_err();
        assert!(err.is_assertion_failure());
    }
}
