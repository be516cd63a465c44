//! String-shape predicates.
//!
//! Pure checks over a string. The locator matchers apply them to an
//! element's text; `expect_str` applies them to plain strings.

use super::MatchOutcome;
use crate::result::{MatcherError, MatcherResult};
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
    })
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://[^\s/?#]+[^\s]*$").expect("URL pattern compiles")
    })
}

fn uuid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .expect("UUID pattern compiles")
    })
}

/// `local@domain.tld` with no whitespace
#[must_use]
pub fn is_email(s: &str) -> bool {
    email_pattern().is_match(s)
}

/// `scheme://host[...]` with no whitespace
#[must_use]
pub fn is_url(s: &str) -> bool {
    url_pattern().is_match(s)
}

/// Non-empty and only ASCII letters and digits
#[must_use]
pub fn is_alphanumeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Non-empty and only ASCII digits
#[must_use]
pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Unchanged by upper-casing
#[must_use]
pub fn is_uppercase(s: &str) -> bool {
    s == s.to_uppercase()
}

/// Unchanged by lower-casing
#[must_use]
pub fn is_lowercase(s: &str) -> bool {
    s == s.to_lowercase()
}

/// Every whitespace-separated word starts with an upper-case letter
#[must_use]
pub fn is_title_case(s: &str) -> bool {
    let mut words = s.split_whitespace().peekable();
    words.peek().is_some()
        && words.all(|word| word.chars().next().is_some_and(char::is_uppercase))
}

/// Reject UUID versions the check does not know
///
/// # Errors
///
/// Returns a usage error for a version other than 1, 3, 4 or 5
pub fn check_uuid_version(version: Option<u8>) -> MatcherResult<()> {
    match version {
        Some(v) if ![1, 3, 4, 5].contains(&v) => Err(MatcherError::usage(
            "to_be_uuid",
            format!("UUID version must be 1, 3, 4 or 5, got {v}"),
        )),
        _ => Ok(()),
    }
}

/// Canonical 8-4-4-4-12 UUID, optionally of a given version
///
/// The check is case-insensitive and requires the RFC 4122 variant. With
/// no version the version nibble must be 1 to 5.
///
/// # Errors
///
/// Returns a usage error for a version other than 1, 3, 4 or 5
pub fn is_uuid(s: &str, version: Option<u8>) -> MatcherResult<bool> {
    check_uuid_version(version)?;
    if !uuid_pattern().is_match(s) {
        return Ok(false);
    }
    let Ok(parsed) = uuid::Uuid::parse_str(s) else {
        return Ok(false);
    };
    let nibble = parsed.get_version_num();
    Ok(match version {
        Some(v) => nibble == usize::from(v),
        None => (1..=5).contains(&nibble),
    })
}

/// Which string-shape check to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextShape {
    /// Starts with the given prefix
    StartsWith(String),
    /// Ends with the given suffix
    EndsWith(String),
    /// Email address
    Email,
    /// URL with a scheme
    Url,
    /// ASCII letters and digits only
    Alphanumeric,
    /// ASCII digits only
    Numeric,
    /// All upper case
    Uppercase,
    /// All lower case
    Lowercase,
    /// Every word capitalised
    TitleCase,
}

impl TextShape {
    /// Matcher name used in messages
    #[must_use]
    pub const fn matcher(&self) -> &'static str {
        match self {
            Self::StartsWith(_) => "to_start_with",
            Self::EndsWith(_) => "to_end_with",
            Self::Email => "to_be_email",
            Self::Url => "to_be_url",
            Self::Alphanumeric => "to_be_alphanumeric",
            Self::Numeric => "to_be_numeric",
            Self::Uppercase => "to_be_uppercase",
            Self::Lowercase => "to_be_lowercase",
            Self::TitleCase => "to_be_title_case",
        }
    }

    /// Human-readable expectation
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::StartsWith(prefix) => format!("text starting with {prefix:?}"),
            Self::EndsWith(suffix) => format!("text ending with {suffix:?}"),
            Self::Email => "a valid email address".to_string(),
            Self::Url => "a valid URL".to_string(),
            Self::Alphanumeric => "only letters and digits".to_string(),
            Self::Numeric => "only digits".to_string(),
            Self::Uppercase => "upper-case text".to_string(),
            Self::Lowercase => "lower-case text".to_string(),
            Self::TitleCase => "title-case text".to_string(),
        }
    }

    /// Run the check
    #[must_use]
    pub fn check(&self, s: &str) -> bool {
        match self {
            Self::StartsWith(prefix) => s.starts_with(prefix.as_str()),
            Self::EndsWith(suffix) => s.ends_with(suffix.as_str()),
            Self::Email => is_email(s),
            Self::Url => is_url(s),
            Self::Alphanumeric => is_alphanumeric(s),
            Self::Numeric => is_numeric(s),
            Self::Uppercase => is_uppercase(s),
            Self::Lowercase => is_lowercase(s),
            Self::TitleCase => is_title_case(s),
        }
    }

    /// Evaluate into an outcome
    #[must_use]
    pub fn evaluate(&self, s: &str) -> MatchOutcome {
        MatchOutcome::new(self.matcher(), self.check(s), self.describe(), format!("{s:?}"))
    }
}

/// Passes iff `s` matches `pattern`
#[must_use]
pub fn to_match_pattern(s: &str, pattern: &Regex) -> MatchOutcome {
    MatchOutcome::new(
        "to_match_pattern",
        pattern.is_match(s),
        format!("text matching /{}/", pattern.as_str()),
        format!("{s:?}"),
    )
}

/// Passes iff `s` is a UUID (of `version`, if given)
///
/// # Errors
///
/// Returns a usage error for an unsupported version
pub fn to_be_uuid(s: &str, version: Option<u8>) -> MatcherResult<MatchOutcome> {
    let expected = match version {
        Some(v) => format!("a version {v} UUID"),
        None => "a UUID".to_string(),
    };
    Ok(MatchOutcome::new(
        "to_be_uuid",
        is_uuid(s, version)?,
        expected,
        format!("{s:?}"),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod uuid_checks {
        use super::*;

        const V4: &str = "550e8400-e29b-41d4-a716-446655440000";

        #[test]
        fn test_version_four() {
            assert!(is_uuid(V4, Some(4)).unwrap());
            assert!(is_uuid(V4, None).unwrap());
            assert!(!is_uuid(V4, Some(1)).unwrap());
        }

        #[test]
        fn test_case_insensitive() {
            assert!(is_uuid(&V4.to_uppercase(), Some(4)).unwrap());
        }

        #[test]
        fn test_not_a_uuid() {
            assert!(!is_uuid("not-a-uuid", None).unwrap());
            assert!(!is_uuid("550e8400e29b41d4a716446655440000", None).unwrap());
            assert!(!is_uuid("550e8400-e29b-01d4-a716-446655440000", None).unwrap());
            assert!(!is_uuid("550e8400-e29b-41d4-c716-446655440000", None).unwrap());
        }

        #[test]
        fn test_other_versions() {
            assert!(is_uuid("6ba7b810-9dad-11d1-80b4-00c04fd430c8", Some(1)).unwrap());
            assert!(is_uuid("886313e1-3b8a-5372-9b90-0c9aee199e5d", Some(5)).unwrap());
        }

        #[test]
        fn test_unsupported_version_is_usage_error() {
            assert!(is_uuid(V4, Some(2)).unwrap_err().is_usage());
            assert!(to_be_uuid(V4, Some(7)).unwrap_err().is_usage());
        }

        #[test]
        fn test_outcome() {
            let outcome = to_be_uuid(V4, Some(1)).unwrap();
            assert!(!outcome.passed);
            assert_eq!(outcome.expected, "a version 1 UUID");
        }
    }

    mod shapes {
        use super::*;

        #[test]
        fn test_email() {
            assert!(is_email("dev@example.com"));
            assert!(!is_email("dev@example"));
            assert!(!is_email("dev example@x.com"));
        }

        #[test]
        fn test_url() {
            assert!(is_url("https://example.com/path?q=1"));
            assert!(is_url("ftp://files.example.org"));
            assert!(!is_url("example.com"));
            assert!(!is_url("https://"));
        }

        #[test]
        fn test_character_classes() {
            assert!(is_alphanumeric("abc123"));
            assert!(!is_alphanumeric("abc 123"));
            assert!(!is_alphanumeric(""));
            assert!(is_numeric("0042"));
            assert!(!is_numeric("4.2"));
        }

        #[test]
        fn test_case() {
            assert!(is_uppercase("HELLO WORLD"));
            assert!(!is_uppercase("Hello"));
            assert!(is_lowercase("hello world"));
            assert!(!is_lowercase("hello World"));
            assert!(is_title_case("Hello Big World"));
            assert!(!is_title_case("Hello big World"));
            assert!(!is_title_case("   "));
        }

        #[test]
        fn test_shape_evaluate() {
            let outcome = TextShape::StartsWith("Sub".into()).evaluate("Subtotal: 10");
            assert!(outcome.passed);
            assert_eq!(outcome.matcher, "to_start_with");

            let outcome = TextShape::EndsWith("USD".into()).evaluate("10 EUR");
            assert!(!outcome.passed);
            assert_eq!(outcome.received, "\"10 EUR\"");
        }

        #[test]
        fn test_pattern() {
            let re = Regex::new(r"^\d+ items?$").unwrap();
            assert!(to_match_pattern("3 items", &re).passed);
            assert!(!to_match_pattern("three items", &re).passed);
        }
    }
}
