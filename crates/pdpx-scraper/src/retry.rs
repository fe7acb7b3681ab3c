//! Retry with exponential backoff for page loads.
//!
//! Only transient browser conditions are retried. A selector that matches
//! nothing will match nothing on the next attempt too, so those errors are
//! returned immediately.

use std::time::Duration;

use crate::error::PageError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`PageError::Navigation`] — the load itself failed (reset, DNS, 5xx page).
/// - [`PageError::Timeout`] — the load did not finish in time.
/// - [`PageError::Driver`] — the browser session hiccuped.
///
/// Everything else describes the document and is propagated immediately.
fn is_retriable(err: &PageError) -> bool {
    matches!(
        err,
        PageError::Navigation(_) | PageError::Timeout { .. } | PageError::Driver(_)
    )
}

/// Executes `operation` with exponential backoff retries on transient errors.
///
/// On a retriable error the function sleeps for `backoff_base_ms * 2^attempt`
/// milliseconds and tries again, up to `max_retries` additional attempts after
/// the first try. When the retries are exhausted the last error is returned
/// together with the number of attempts made.
///
/// `operation` is an async closure so that it can borrow the page mutably on
/// every attempt.
///
/// # Backoff schedule (example with `backoff_base_ms = 2000`)
///
/// | Attempt | Sleep before next attempt |
/// |---------|--------------------------|
/// | 0 (initial) | — |
/// | 1 (first retry) | 2 s |
/// | 2 (second retry) | 4 s |
/// | 3 (third retry) | 8 s |
pub(crate) async fn retry_with_backoff<T, F>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, (PageError, u32)>
where
    F: AsyncFnMut() -> Result<T, PageError>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err((err, attempt + 1));
        }

        let delay_ms = backoff_base_ms.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "page load failed, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
