//! One product visit: load, read invariants, walk combinations, assemble rows.

use pdpx_core::{OutputRow, ScrapeTarget, SiteConfig};
use tokio::time::Instant;

use crate::assemble::assemble;
use crate::discovery::discover_groups;
use crate::error::ScraperError;
use crate::extract::extract_snapshot;
use crate::invariants::read_invariants;
use crate::outcome::VisitReport;
use crate::page::{Bounded, PageAccessor};
use crate::retry::retry_with_backoff;
use crate::settings::ScrapeSettings;
use crate::traverse::Traversal;
use crate::types::{Combination, ProductInvariants, Settled, Settlement, VariantGroup};

/// Everything produced by one successful visit.
#[derive(Debug, Clone)]
pub struct ProductScrape {
    pub url: String,
    pub invariants: ProductInvariants,
    /// Groups as discovered right after load.
    pub groups: Vec<VariantGroup>,
    pub rows: Vec<OutputRow>,
    pub report: VisitReport,
}

/// Loads `url`, retrying transient failures with exponential backoff.
///
/// # Errors
///
/// Returns [`ScraperError::Navigation`] once the retries are exhausted or the
/// failure is not transient.
pub async fn navigate_with_retry<P: PageAccessor>(
    page: &mut P,
    url: &str,
    settings: &ScrapeSettings,
) -> Result<(), ScraperError> {
    let timeout = settings.nav_timeout;
    retry_with_backoff(
        settings.nav_max_retries,
        settings.nav_backoff_base_ms,
        async || page.navigate(url, timeout).await,
    )
    .await
    .map_err(|(source, attempts)| ScraperError::Navigation {
        url: url.to_owned(),
        attempts,
        source,
    })
}

/// Polls for the title element until it shows up or `identity_timeout`
/// passes. A page without it is not a product page.
async fn wait_for_identity<P: PageAccessor>(
    page: &mut P,
    url: &str,
    selector: &str,
    settings: &ScrapeSettings,
) -> Result<(), ScraperError> {
    let deadline = Instant::now() + settings.identity_timeout;
    loop {
        match page.count(None, selector).await {
            Ok(n) if n > 0 => return Ok(()),
            Ok(_) => {}
            Err(e) => tracing::debug!(url, error = %e, "identity probe failed"),
        }
        if Instant::now() >= deadline {
            return Err(ScraperError::MissingIdentity {
                url: url.to_owned(),
                selector: selector.to_owned(),
            });
        }
        tokio::time::sleep(settings.poll_interval).await;
    }
}

/// Visits one product page and turns every live option combination into an
/// import row.
///
/// Field reads that fail degrade to defaults and are listed in the returned
/// report; only a page that cannot be loaded or never shows its title fails
/// the visit. When no option can be selected at all, the page is written as
/// one option-less row.
///
/// # Errors
///
/// Returns [`ScraperError::Navigation`] when the page cannot be loaded and
/// [`ScraperError::MissingIdentity`] when the title element never appears.
pub async fn scrape_product<P: PageAccessor>(
    page: &mut P,
    target: &ScrapeTarget,
    site: &SiteConfig,
    settings: &ScrapeSettings,
) -> Result<ProductScrape, ScraperError> {
    let mut page = Bounded::new(page, settings.op_timeout);
    let selectors = &site.selectors;
    let url = target.url.as_str();

    tracing::info!(url, site = %site.name, "visiting product page");
    navigate_with_retry(&mut page, url, settings).await?;
    if let Err(e) = page.wait_for_network_idle(settings.network_idle_timeout).await {
        tracing::debug!(url, error = %e, "network never went idle, continuing");
    }
    wait_for_identity(&mut page, url, &selectors.title, settings).await?;

    let mut report = VisitReport::default();
    let invariants = read_invariants(&mut page, target, selectors, settings, &mut report).await;

    let groups = discover_groups(&mut page, selectors, &site.option_roles).await;
    let mut traversal = Traversal::new(&mut page, site, settings, groups.clone());
    let mut snapshots = Vec::new();
    while let Some(settled) = traversal.next().await {
        if !settled.settlement.is_confirmed() {
            report.unsettled.push(settled.combination.to_string());
        }
        let snapshot = extract_snapshot(
            traversal.page(),
            settled,
            url,
            selectors,
            settings,
            &mut report,
        )
        .await;
        snapshots.push(snapshot);
    }
    report.discovery_calls = 1 + traversal.discovery_calls();
    report.skipped = traversal.skipped().to_vec();

    if snapshots.is_empty() {
        tracing::warn!(
            url,
            groups = groups.len(),
            skipped = report.skipped.len(),
            "no option could be selected, keeping the page as shown"
        );
        let settled = Settled {
            combination: Combination::default(),
            settlement: Settlement::Unselected,
        };
        snapshots.push(
            extract_snapshot(&mut page, settled, url, selectors, settings, &mut report).await,
        );
    }

    let rows = assemble(&invariants, &groups, &snapshots);
    tracing::info!(
        url,
        handle = %invariants.handle,
        rows = rows.len(),
        skipped = report.skipped.len(),
        unsettled = report.unsettled.len(),
        degraded = report.issues.len(),
        "product page done"
    );

    Ok(ProductScrape {
        url: url.to_owned(),
        invariants,
        groups,
        rows,
        report,
    })
}
