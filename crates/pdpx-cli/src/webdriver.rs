//! [`PageAccessor`] over a WebDriver session.
//!
//! Every call resolves its [`NodeRef`] from the document root, so element
//! handles never outlive one call and a re-render between calls is harmless.

use std::time::Duration;

use anyhow::Context;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use pdpx_scraper::{NodeRef, PageAccessor, PageError};
use serde_json::{json, Value};
use tokio::time::Instant;

const SCROLL_SCRIPT: &str = "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";
const FORCE_CLICK_SCRIPT: &str = "arguments[0].click();";
const LOAD_STATE_SCRIPT: &str =
    "return [document.readyState, performance.getEntriesByType('resource').length];";

pub(crate) struct WebDriverPage {
    client: Client,
    poll_interval: Duration,
}

impl WebDriverPage {
    /// Opens a Chrome session on the WebDriver server at `webdriver_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be reached or refuses the session.
    pub(crate) async fn connect(
        webdriver_url: &str,
        headless: bool,
        poll_interval: Duration,
    ) -> anyhow::Result<Self> {
        let mut args = vec!["--window-size=1366,2000", "--disable-dev-shm-usage"];
        if headless {
            args.extend(["--headless=new", "--disable-gpu"]);
        }
        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        tracing::debug!(webdriver_url, headless, "connecting to WebDriver");
        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(webdriver_url)
            .await
            .with_context(|| format!("failed to connect to WebDriver at {webdriver_url}"))?;
        Ok(Self {
            client,
            poll_interval,
        })
    }

    /// Ends the browser session.
    ///
    /// # Errors
    ///
    /// Returns an error if the WebDriver server rejects the request.
    pub(crate) async fn close(self) -> anyhow::Result<()> {
        self.client
            .close()
            .await
            .context("failed to close WebDriver session")
    }

    async fn find_all(
        &self,
        scope: Option<&Element>,
        selector: &str,
    ) -> Result<Vec<Element>, PageError> {
        let found = match scope {
            Some(parent) => parent.find_all(Locator::Css(selector)).await,
            None => self.client.find_all(Locator::Css(selector)).await,
        };
        found.map_err(|e| classify(selector, &e))
    }

    /// Walks `node`'s lookup path from the document root.
    async fn resolve(&self, node: &NodeRef) -> Result<Element, PageError> {
        let mut current: Option<Element> = None;
        for (selector, index) in node.path() {
            let matches = self.find_all(current.as_ref(), selector).await?;
            let element = matches
                .into_iter()
                .nth(index)
                .ok_or_else(|| PageError::ElementNotFound {
                    selector: selector.to_string(),
                    index,
                })?;
            current = Some(element);
        }
        current.ok_or_else(|| PageError::ElementNotFound {
            selector: node.selector().to_string(),
            index: node.index(),
        })
    }

    async fn run_on(&self, node: &NodeRef, script: &str) -> Result<Value, PageError> {
        let element = self.resolve(node).await?;
        let arg = serde_json::to_value(&element).map_err(|e| PageError::Driver(e.to_string()))?;
        self.client
            .execute(script, vec![arg])
            .await
            .map_err(|e| classify(node.selector(), &e))
    }

    async fn load_state(&self) -> Result<(String, u64), PageError> {
        let value = self
            .client
            .execute(LOAD_STATE_SCRIPT, Vec::new())
            .await
            .map_err(|e| PageError::Driver(e.to_string()))?;
        Ok(parse_load_state(&value))
    }
}

/// `(readyState, resource count)` from the load-state script's result.
fn parse_load_state(value: &Value) -> (String, u64) {
    let state = value
        .get(0)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let resources = value.get(1).and_then(Value::as_u64).unwrap_or_default();
    (state, resources)
}

fn classify(selector: &str, err: &CmdError) -> PageError {
    classify_message(selector, &err.to_string())
}

/// Maps a WebDriver error message onto the engine's error kinds.
fn classify_message(selector: &str, message: &str) -> PageError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("stale element") {
        PageError::Stale {
            selector: selector.to_string(),
        }
    } else if lower.contains("intercepted") || lower.contains("not interactable") {
        PageError::Intercepted {
            selector: selector.to_string(),
            reason: message.to_string(),
        }
    } else if lower.contains("no such element") {
        PageError::ElementNotFound {
            selector: selector.to_string(),
            index: 0,
        }
    } else {
        PageError::Driver(message.to_string())
    }
}

fn timeout_error(operation: &'static str, limit: Duration) -> PageError {
    PageError::Timeout {
        operation,
        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    }
}

impl PageAccessor for WebDriverPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), PageError> {
        match tokio::time::timeout(timeout, self.client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(PageError::Navigation(e.to_string())),
            Err(_) => Err(timeout_error("navigate", timeout)),
        }
    }

    async fn current_url(&mut self) -> Result<String, PageError> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| PageError::Driver(e.to_string()))
    }

    async fn count(&mut self, scope: Option<&NodeRef>, selector: &str) -> Result<usize, PageError> {
        let parent = match scope {
            Some(node) => Some(self.resolve(node).await?),
            None => None,
        };
        Ok(self.find_all(parent.as_ref(), selector).await?.len())
    }

    async fn text(&mut self, node: &NodeRef) -> Result<String, PageError> {
        let element = self.resolve(node).await?;
        element
            .text()
            .await
            .map_err(|e| classify(node.selector(), &e))
    }

    async fn inner_html(&mut self, node: &NodeRef) -> Result<String, PageError> {
        let element = self.resolve(node).await?;
        element
            .html(true)
            .await
            .map_err(|e| classify(node.selector(), &e))
    }

    async fn attribute(&mut self, node: &NodeRef, name: &str) -> Result<Option<String>, PageError> {
        let element = self.resolve(node).await?;
        element
            .attr(name)
            .await
            .map_err(|e| classify(node.selector(), &e))
    }

    async fn is_checked(&mut self, node: &NodeRef) -> Result<bool, PageError> {
        let element = self.resolve(node).await?;
        let checked = element
            .prop("checked")
            .await
            .map_err(|e| classify(node.selector(), &e))?;
        Ok(checked.as_deref() == Some("true"))
    }

    async fn scroll_into_view(&mut self, node: &NodeRef) -> Result<(), PageError> {
        self.run_on(node, SCROLL_SCRIPT).await.map(|_| ())
    }

    async fn click(&mut self, node: &NodeRef, timeout: Duration) -> Result<(), PageError> {
        let element = self.resolve(node).await?;
        match tokio::time::timeout(timeout, element.click()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(classify(node.selector(), &e)),
            Err(_) => Err(timeout_error("click", timeout)),
        }
    }

    async fn force_click(&mut self, node: &NodeRef) -> Result<(), PageError> {
        self.run_on(node, FORCE_CLICK_SCRIPT).await.map(|_| ())
    }

    /// Done once the document has loaded and no new resources were fetched
    /// between two polls.
    async fn wait_for_network_idle(&mut self, timeout: Duration) -> Result<(), PageError> {
        let deadline = Instant::now() + timeout;
        let mut last_resources = None;
        loop {
            let (state, resources) = self.load_state().await?;
            if state == "complete" && last_resources == Some(resources) {
                return Ok(());
            }
            last_resources = Some(resources);
            if Instant::now() >= deadline {
                return Err(timeout_error("wait_for_network_idle", timeout));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
