use thiserror::Error;

/// Failure of a single page interaction.
///
/// These are caught where they happen and turned into degraded values; only
/// navigation failures ever escape a visit (wrapped in [`ScraperError`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("no element matches \"{selector}\" at index {index}")]
    ElementNotFound { selector: String, index: usize },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("element \"{selector}\" is no longer attached to the document")]
    Stale { selector: String },

    #[error("click on \"{selector}\" was intercepted: {reason}")]
    Intercepted { selector: String, reason: String },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser driver error: {0}")]
    Driver(String),
}

/// Fatal failure for one URL. The batch records it and moves on.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("navigation to {url} failed after {attempts} attempt(s): {source}")]
    Navigation {
        url: String,
        attempts: u32,
        #[source]
        source: PageError,
    },

    #[error("page identity element \"{selector}\" never appeared on {url}")]
    MissingIdentity { url: String, selector: String },

    #[error("no site configuration matches {url}")]
    UnknownSite { url: String },
}
