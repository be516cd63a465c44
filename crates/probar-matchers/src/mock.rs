//! In-memory element sets for unit testing.
//!
//! [`MockElementSet`] implements [`ElementSet`] over a shared list of
//! [`MockElement`]s. Visibility can be scheduled to change over time, and
//! elements or whole sets can be made to fail so that substrate error
//! propagation is testable.

use crate::locator::{Element, ElementSet};
use crate::result::{MatcherError, MatcherResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visibility {
    Visible,
    Hidden,
    After(Instant),
    Until(Instant),
}

/// Mock element
#[derive(Debug, Clone)]
pub struct MockElement {
    attributes: HashMap<String, String>,
    text: String,
    own_text: Option<Vec<String>>,
    visibility: Visibility,
    detached: bool,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            attributes: HashMap::new(),
            text: String::new(),
            own_text: None,
            visibility: Visibility::Visible,
            detached: false,
        }
    }
}

impl MockElement {
    /// Create a visible element with no attributes or text
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the text content
    ///
    /// Unless [`MockElement::with_own_text_nodes`] is also used, the text is
    /// the element's single own text node.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the element's own text nodes
    #[must_use]
    pub fn with_own_text_nodes<I, T>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.own_text = Some(nodes.into_iter().map(Into::into).collect());
        self
    }

    /// Make the element hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }

    /// Hidden now, visible once `delay` has elapsed
    #[must_use]
    pub fn visible_after(mut self, delay: Duration) -> Self {
        self.visibility = Visibility::After(Instant::now() + delay);
        self
    }

    /// Visible now, hidden once `delay` has elapsed
    #[must_use]
    pub fn visible_for(mut self, delay: Duration) -> Self {
        self.visibility = Visibility::Until(Instant::now() + delay);
        self
    }

    /// Every read on this element fails
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    fn check_attached(&self) -> MatcherResult<()> {
        if self.detached {
            Err(MatcherError::substrate("element is detached from the document"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Element for MockElement {
    async fn is_visible(&self) -> MatcherResult<bool> {
        self.check_attached()?;
        Ok(match self.visibility {
            Visibility::Visible => true,
            Visibility::Hidden => false,
            Visibility::After(at) => Instant::now() >= at,
            Visibility::Until(at) => Instant::now() < at,
        })
    }

    async fn attribute(&self, name: &str) -> MatcherResult<Option<String>> {
        self.check_attached()?;
        Ok(self.attributes.get(name).cloned())
    }

    async fn text_content(&self) -> MatcherResult<String> {
        self.check_attached()?;
        Ok(self.text.clone())
    }

    async fn own_text_nodes(&self) -> MatcherResult<Vec<String>> {
        self.check_attached()?;
        Ok(self
            .own_text
            .clone()
            .unwrap_or_else(|| vec![self.text.clone()]))
    }
}

/// Mock element set
///
/// Cloning shares the underlying elements, so a test can keep a handle and
/// mutate the set while a matcher is polling it.
#[derive(Debug, Clone)]
pub struct MockElementSet {
    selector: String,
    elements: Arc<Mutex<Vec<MockElement>>>,
    failure: Arc<Mutex<Option<String>>>,
    resolutions: Arc<AtomicUsize>,
}

impl MockElementSet {
    /// Create a set for `selector` holding `elements`
    #[must_use]
    pub fn new(selector: impl Into<String>, elements: Vec<MockElement>) -> Self {
        Self {
            selector: selector.into(),
            elements: Arc::new(Mutex::new(elements)),
            failure: Arc::new(Mutex::new(None)),
            resolutions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append an element
    pub fn push(&self, element: MockElement) {
        self.elements().push(element);
    }

    /// Replace all elements
    pub fn replace(&self, replacement: Vec<MockElement>) {
        *self.elements() = replacement;
    }

    /// Make every subsequent resolution fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    fn elements(&self) -> MutexGuard<'_, Vec<MockElement>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of times the set has been resolved
    #[must_use]
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementSet for MockElementSet {
    type Item = MockElement;

    fn selector(&self) -> &str {
        &self.selector
    }

    async fn resolve(&self) -> MatcherResult<Vec<MockElement>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(message) = failure {
            return Err(MatcherError::substrate(message));
        }
        let elements = self.elements().clone();
        Ok(elements)
    }
}
