//! The browser seam.
//!
//! The engine only ever talks to a page through [`PageAccessor`]. Elements are
//! named by [`NodeRef`] lookup keys, which an implementation resolves afresh
//! on every call. Nothing in the engine holds a live element across a click.

use std::future::Future;
use std::time::Duration;

use crate::error::PageError;

/// A re-resolvable address of an element: the `index`-th match of `selector`,
/// optionally searched inside another node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    scope: Option<Box<NodeRef>>,
    selector: String,
    index: usize,
}

impl NodeRef {
    /// First match of `selector` in the document.
    #[must_use]
    pub fn first(selector: &str) -> Self {
        Self::nth(selector, 0)
    }

    #[must_use]
    pub fn nth(selector: &str, index: usize) -> Self {
        Self {
            scope: None,
            selector: selector.to_owned(),
            index,
        }
    }

    /// The `index`-th match of `selector` inside this node.
    #[must_use]
    pub fn child(&self, selector: &str, index: usize) -> Self {
        Self {
            scope: Some(Box::new(self.clone())),
            selector: selector.to_owned(),
            index,
        }
    }

    #[must_use]
    pub fn scope(&self) -> Option<&NodeRef> {
        self.scope.as_deref()
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        &self.selector
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// `(selector, index)` steps from the document root down to this node.
    #[must_use]
    pub fn path(&self) -> Vec<(&str, usize)> {
        let mut steps = Vec::new();
        let mut current = Some(self);
        while let Some(node) = current {
            steps.push((node.selector.as_str(), node.index));
            current = node.scope();
        }
        steps.reverse();
        steps
    }
}

impl std::fmt::Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (depth, (selector, index)) in self.path().into_iter().enumerate() {
            if depth > 0 {
                f.write_str(" >> ")?;
            }
            write!(f, "{selector}[{index}]")?;
        }
        Ok(())
    }
}

/// Minimal set of operations the engine needs from a rendered page.
///
/// Implementations are driven by exactly one caller at a time, hence `&mut self`.
/// Reads of an element that does not exist return
/// [`PageError::ElementNotFound`]; [`count`](PageAccessor::count) is the way
/// to probe for presence without an error.
#[allow(async_fn_in_trait)]
pub trait PageAccessor {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), PageError>;

    async fn current_url(&mut self) -> Result<String, PageError>;

    /// Number of matches of `selector`, inside `scope` when given.
    async fn count(&mut self, scope: Option<&NodeRef>, selector: &str)
        -> Result<usize, PageError>;

    /// Rendered text of the node.
    async fn text(&mut self, node: &NodeRef) -> Result<String, PageError>;

    async fn inner_html(&mut self, node: &NodeRef) -> Result<String, PageError>;

    /// `Ok(None)` when the node exists but lacks the attribute.
    async fn attribute(&mut self, node: &NodeRef, name: &str)
        -> Result<Option<String>, PageError>;

    /// Live `checked` property of a form control.
    async fn is_checked(&mut self, node: &NodeRef) -> Result<bool, PageError>;

    async fn scroll_into_view(&mut self, node: &NodeRef) -> Result<(), PageError>;

    /// A real pointer click, which fails if another element would receive it.
    async fn click(&mut self, node: &NodeRef, timeout: Duration) -> Result<(), PageError>;

    /// Dispatches a click on the node itself, bypassing hit-testing.
    async fn force_click(&mut self, node: &NodeRef) -> Result<(), PageError>;

    /// Waits until the page has stopped loading resources.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), PageError>;
}

/// Wraps an accessor so that no single call can hang the engine.
///
/// Reads are bounded by `limit`; navigation, clicks and idle waits by the
/// timeout they are given.
pub struct Bounded<'p, P> {
    inner: &'p mut P,
    limit: Duration,
}

impl<'p, P: PageAccessor> Bounded<'p, P> {
    pub fn new(inner: &'p mut P, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = Result<T, PageError>>,
) -> Result<T, PageError> {
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| {
            Err(PageError::Timeout {
                operation,
                timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })
        })
}

impl<P: PageAccessor> PageAccessor for Bounded<'_, P> {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        bounded(timeout, "navigate", self.inner.navigate(url, timeout)).await
    }

    async fn current_url(&mut self) -> Result<String, PageError> {
        bounded(self.limit, "current_url", self.inner.current_url()).await
    }

    async fn count(
        &mut self,
        scope: Option<&NodeRef>,
        selector: &str,
    ) -> Result<usize, PageError> {
        bounded(self.limit, "count", self.inner.count(scope, selector)).await
    }

    async fn text(&mut self, node: &NodeRef) -> Result<String, PageError> {
        bounded(self.limit, "text", self.inner.text(node)).await
    }

    async fn inner_html(&mut self, node: &NodeRef) -> Result<String, PageError> {
        bounded(self.limit, "inner_html", self.inner.inner_html(node)).await
    }

    async fn attribute(
        &mut self,
        node: &NodeRef,
        name: &str,
    ) -> Result<Option<String>, PageError> {
        bounded(self.limit, "attribute", self.inner.attribute(node, name)).await
    }

    async fn is_checked(&mut self, node: &NodeRef) -> Result<bool, PageError> {
        bounded(self.limit, "is_checked", self.inner.is_checked(node)).await
    }

    async fn scroll_into_view(&mut self, node: &NodeRef) -> Result<(), PageError> {
        bounded(self.limit, "scroll_into_view", self.inner.scroll_into_view(node)).await
    }

    async fn click(&mut self, node: &NodeRef, timeout: Duration) -> Result<(), PageError> {
        bounded(timeout, "click", self.inner.click(node, timeout)).await
    }

    async fn force_click(&mut self, node: &NodeRef) -> Result<(), PageError> {
        bounded(self.limit, "force_click", self.inner.force_click(node)).await
    }

    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), PageError> {
        bounded(
            timeout,
            "wait_for_network_idle",
            self.inner.wait_for_network_idle(timeout),
        )
        .await
    }
}

/// Text of the first match of `selector`, trimmed. `None` when nothing
/// matches, the read fails, or the text is blank.
pub(crate) async fn first_text<P: PageAccessor>(
    page: &mut P,
    selector: &str,
) -> Option<String> {
    if page.count(None, selector).await.ok()? == 0 {
        return None;
    }
    let text = page.text(&NodeRef::first(selector)).await.ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Trimmed, non-blank attribute value.
pub(crate) async fn non_blank_attribute<P: PageAccessor>(
    page: &mut P,
    node: &NodeRef,
    name: &str,
) -> Option<String> {
    let value = page.attribute(node, name).await.ok()??;
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
