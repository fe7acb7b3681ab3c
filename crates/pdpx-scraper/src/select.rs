//! Drives one option into the selected state and decides when the page has
//! caught up.

use pdpx_core::SiteSelectors;
use tokio::time::Instant;

use crate::extract::read_image_reference;
use crate::page::{NodeRef, PageAccessor};
use crate::settings::ScrapeSettings;
use crate::types::{Settlement, VariantItem};

/// How a selection is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Swaps the main image; confirmed by watching the image change.
    ImageBearing,
    /// Confirmed by waiting a fixed cooldown.
    Plain,
}

/// Selects `item` and waits for the page to settle.
///
/// Never fails: a click that cannot be delivered is reported as
/// [`Settlement::ClickFailed`] and a page that does not visibly react as
/// [`Settlement::TimedOut`].
pub async fn select<P: PageAccessor>(
    page: &mut P,
    item: &VariantItem,
    kind: GroupKind,
    selectors: &SiteSelectors,
    settings: &ScrapeSettings,
) -> Settlement {
    if item.is_selected() {
        tracing::debug!(label = %item.label, "already selected, skipping click");
        tokio::time::sleep(settings.residual_pause).await;
        return Settlement::AlreadySelected;
    }

    let image_before = match kind {
        GroupKind::ImageBearing => read_image_reference(page, selectors).await,
        GroupKind::Plain => None,
    };

    if let Err(reason) = click_item(page, &item.handle, settings).await {
        tracing::warn!(label = %item.label, reason = %reason, "option could not be clicked");
        return Settlement::ClickFailed { reason };
    }

    match kind {
        GroupKind::ImageBearing => {
            wait_for_image_change(page, selectors, image_before.as_deref(), settings).await
        }
        GroupKind::Plain => {
            tokio::time::sleep(settings.secondary_cooldown).await;
            Settlement::Cooldown
        }
    }
}

/// Direct click first; if anything intercepts it, a forced click.
async fn click_item<P: PageAccessor>(
    page: &mut P,
    node: &NodeRef,
    settings: &ScrapeSettings,
) -> Result<(), String> {
    if let Err(e) = page.scroll_into_view(node).await {
        tracing::debug!(node = %node, error = %e, "scroll into view failed");
    }

    let direct = match page.click(node, settings.click_timeout).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    tracing::debug!(node = %node, error = %direct, "direct click failed, forcing");

    page.force_click(node)
        .await
        .map_err(|forced| format!("direct click: {direct}; forced click: {forced}"))
}

/// Polls the main image until it differs from `before`.
async fn wait_for_image_change<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
    before: Option<&str>,
    settings: &ScrapeSettings,
) -> Settlement {
    let deadline = Instant::now() + settings.image_change_timeout;
    loop {
        let current = read_image_reference(page, selectors).await;
        if current.is_some() && current.as_deref() != before {
            return Settlement::ImageChanged;
        }
        if Instant::now() >= deadline {
            tracing::warn!(
                timeout_ms = u64::try_from(settings.image_change_timeout.as_millis())
                    .unwrap_or(u64::MAX),
                image = before.unwrap_or_default(),
                "main image did not change after selection; continuing with current values"
            );
            return Settlement::TimedOut;
        }
        tokio::time::sleep(settings.poll_interval).await;
    }
}
