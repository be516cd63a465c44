//! Element-set abstraction and locator-attribute matchers.
//!
//! The matchers here never touch a browser directly. They read through
//! [`Element`] and [`ElementSet`], which a driver (or [`crate::mock`])
//! implements. Every read is fallible; a failed read is a substrate error
//! and propagates unchanged.
//!
//! Each matcher resolves the set and reads it once. Retrying until the
//! condition holds is done by [`crate::expect::LocatorExpectation`].

use crate::assertion::text::{self, TextShape};
use crate::assertion::MatchOutcome;
use crate::result::MatcherResult;
use async_trait::async_trait;
use regex::Regex;
use std::fmt;

/// One element matched by a locator
#[async_trait]
pub trait Element: Send + Sync {
    /// Whether the element is currently rendered visibly
    async fn is_visible(&self) -> MatcherResult<bool>;

    /// Attribute value, or `None` when the attribute is absent
    async fn attribute(&self, name: &str) -> MatcherResult<Option<String>>;

    /// Full text content, descendants included
    async fn text_content(&self) -> MatcherResult<String>;

    /// The element's own text nodes, in document order
    async fn own_text_nodes(&self) -> MatcherResult<Vec<String>>;
}

/// A lazily resolved set of elements
///
/// `resolve` is called afresh on every read, so repeated calls observe the
/// current state of the page.
#[async_trait]
pub trait ElementSet: Send + Sync {
    /// Element type yielded by [`ElementSet::resolve`]
    type Item: Element;

    /// Selector text, for messages
    fn selector(&self) -> &str;

    /// Elements currently matched by the selector
    async fn resolve(&self) -> MatcherResult<Vec<Self::Item>>;
}

/// Expected text: exact string or regular expression
#[derive(Debug, Clone)]
pub enum TextMatch {
    /// Exact equality
    Exact(String),
    /// Regex search
    Pattern(Regex),
}

impl TextMatch {
    /// Whether `actual` satisfies this expectation
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        match self {
            Self::Exact(expected) => actual == expected,
            Self::Pattern(re) => re.is_match(actual),
        }
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(s) => write!(f, "{s:?}"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for TextMatch {
    fn from(s: &str) -> Self {
        Self::Exact(s.to_string())
    }
}

impl From<String> for TextMatch {
    fn from(s: String) -> Self {
        Self::Exact(s)
    }
}

impl From<Regex> for TextMatch {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

const NOT_FOUND: &str = "element not found";

async fn first<S: ElementSet + ?Sized>(set: &S) -> MatcherResult<Option<S::Item>> {
    Ok(set.resolve().await?.into_iter().next())
}

fn not_found(matcher: &'static str, expected: String, set_selector: &str) -> MatchOutcome {
    MatchOutcome::new(matcher, false, expected, format!("no element for {set_selector:?}"))
        .with_detail(NOT_FOUND)
}

async fn attribute_equals<S: ElementSet + ?Sized>(
    set: &S,
    matcher: &'static str,
    name: &str,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    let expectation = format!("{name}={expected}");
    let Some(element) = first(set).await? else {
        return Ok(not_found(matcher, expectation, set.selector()));
    };
    Ok(match element.attribute(name).await? {
        Some(value) => MatchOutcome::new(
            matcher,
            expected.matches(&value),
            expectation,
            format!("{name}={value:?}"),
        ),
        None => MatchOutcome::new(matcher, false, expectation, format!("no {name} attribute")),
    })
}

/// `placeholder` attribute equals or matches `expected`
pub async fn to_have_placeholder<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_placeholder", "placeholder", expected).await
}

/// `href` attribute equals or matches `expected`
pub async fn to_have_href<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_href", "href", expected).await
}

/// `src` attribute equals or matches `expected`
pub async fn to_have_src<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_src", "src", expected).await
}

/// `alt` attribute equals or matches `expected`
pub async fn to_have_alt<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_alt", "alt", expected).await
}

/// `title` attribute equals or matches `expected`
pub async fn to_have_title<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_title", "title", expected).await
}

/// `aria-label` attribute equals or matches `expected`
pub async fn to_have_aria_label<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_aria_label", "aria-label", expected).await
}

/// `target` attribute equals or matches `expected`
pub async fn to_have_target<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    attribute_equals(set, "to_have_target", "target", expected).await
}

/// Normalise a data attribute name to its `data-` form
#[must_use]
pub fn data_attribute_name(name: &str) -> String {
    if name.starts_with("data-") {
        name.to_string()
    } else {
        format!("data-{name}")
    }
}

/// Data attribute is present, and equals or matches `expected` if given
///
/// `name` may be given with or without its `data-` prefix.
pub async fn to_have_data_attribute<S: ElementSet + ?Sized>(
    set: &S,
    name: &str,
    expected: Option<&TextMatch>,
) -> MatcherResult<MatchOutcome> {
    const MATCHER: &str = "to_have_data_attribute";
    let name = data_attribute_name(name);
    if let Some(expected) = expected {
        return attribute_equals(set, MATCHER, &name, expected).await;
    }
    let expectation = format!("{name} present");
    let Some(element) = first(set).await? else {
        return Ok(not_found(MATCHER, expectation, set.selector()));
    };
    Ok(match element.attribute(&name).await? {
        Some(value) => MatchOutcome::new(MATCHER, true, expectation, format!("{name}={value:?}")),
        None => MatchOutcome::new(MATCHER, false, expectation, format!("no {name} attribute")),
    })
}

async fn text_outcome<S, F>(
    set: &S,
    matcher: &'static str,
    expectation: String,
    check: F,
) -> MatcherResult<MatchOutcome>
where
    S: ElementSet + ?Sized,
    F: FnOnce(&str) -> MatcherResult<bool> + Send,
{
    let Some(element) = first(set).await? else {
        return Ok(not_found(matcher, expectation, set.selector()));
    };
    let content = element.text_content().await?;
    let passed = check(&content)?;
    Ok(MatchOutcome::new(matcher, passed, expectation, format!("{content:?}")))
}

async fn text_shape<S: ElementSet + ?Sized>(
    set: &S,
    matcher: &'static str,
    shape: TextShape,
) -> MatcherResult<MatchOutcome> {
    let expectation = shape.describe();
    text_outcome(set, matcher, expectation, move |s| Ok(shape.check(s))).await
}

/// Text content starts with `prefix`
pub async fn to_have_text_starting_with<S: ElementSet + ?Sized>(
    set: &S,
    prefix: &str,
) -> MatcherResult<MatchOutcome> {
    let shape = TextShape::StartsWith(prefix.to_string());
    text_shape(set, "to_have_text_starting_with", shape).await
}

/// Text content ends with `suffix`
pub async fn to_have_text_ending_with<S: ElementSet + ?Sized>(
    set: &S,
    suffix: &str,
) -> MatcherResult<MatchOutcome> {
    let shape = TextShape::EndsWith(suffix.to_string());
    text_shape(set, "to_have_text_ending_with", shape).await
}

/// Text content matches `pattern`
pub async fn to_have_text_matching<S: ElementSet + ?Sized>(
    set: &S,
    pattern: &Regex,
) -> MatcherResult<MatchOutcome> {
    let expectation = format!("text matching /{}/", pattern.as_str());
    text_outcome(set, "to_have_text_matching", expectation, |s| {
        Ok(pattern.is_match(s))
    })
    .await
}

/// Text content is an email address
pub async fn to_have_email_text<S: ElementSet + ?Sized>(set: &S) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_email_text", TextShape::Email).await
}

/// Text content is a URL
pub async fn to_have_url_text<S: ElementSet + ?Sized>(set: &S) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_url_text", TextShape::Url).await
}

/// Text content is ASCII letters and digits only
pub async fn to_have_alphanumeric_text<S: ElementSet + ?Sized>(
    set: &S,
) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_alphanumeric_text", TextShape::Alphanumeric).await
}

/// Text content is ASCII digits only
pub async fn to_have_numeric_text<S: ElementSet + ?Sized>(set: &S) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_numeric_text", TextShape::Numeric).await
}

/// Text content is unchanged by upper-casing
pub async fn to_have_uppercase_text<S: ElementSet + ?Sized>(
    set: &S,
) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_uppercase_text", TextShape::Uppercase).await
}

/// Text content is unchanged by lower-casing
pub async fn to_have_lowercase_text<S: ElementSet + ?Sized>(
    set: &S,
) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_lowercase_text", TextShape::Lowercase).await
}

/// Every word of the text content is capitalised
pub async fn to_have_title_case_text<S: ElementSet + ?Sized>(
    set: &S,
) -> MatcherResult<MatchOutcome> {
    text_shape(set, "to_have_title_case_text", TextShape::TitleCase).await
}

/// Text content is a UUID, of `version` if given
///
/// # Errors
///
/// Returns a usage error for an unsupported version, before any element is
/// read
pub async fn to_have_uuid_text<S: ElementSet + ?Sized>(
    set: &S,
    version: Option<u8>,
) -> MatcherResult<MatchOutcome> {
    text::check_uuid_version(version)?;
    let expectation = match version {
        Some(v) => format!("a version {v} UUID"),
        None => "a UUID".to_string(),
    };
    text_outcome(set, "to_have_uuid_text", expectation, move |s| {
        text::is_uuid(s, version)
    })
    .await
}

/// Join own text nodes: each trimmed, blanks dropped, single-space separated
#[must_use]
pub fn join_direct_text<I, T>(nodes: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    nodes
        .into_iter()
        .filter_map(|node| {
            let trimmed = node.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The element's own text, excluding descendants, equals or matches
/// `expected`
pub async fn to_have_direct_text<S: ElementSet + ?Sized>(
    set: &S,
    expected: &TextMatch,
) -> MatcherResult<MatchOutcome> {
    const MATCHER: &str = "to_have_direct_text";
    let expectation = format!("direct text {expected}");
    let Some(element) = first(set).await? else {
        return Ok(not_found(MATCHER, expectation, set.selector()));
    };
    let direct = join_direct_text(element.own_text_nodes().await?);
    Ok(MatchOutcome::new(
        MATCHER,
        expected.matches(&direct),
        expectation,
        format!("{direct:?}"),
    ))
}
