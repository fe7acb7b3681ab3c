//! Sequential batch over a URL list.

use pdpx_core::{OutputRow, ScrapeTarget, SiteConfig, SitesFile};
use serde::Serialize;

use crate::engine::scrape_product;
use crate::error::ScraperError;
use crate::outcome::VisitReport;
use crate::page::PageAccessor;
use crate::settings::ScrapeSettings;

/// A URL that produced no rows, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// Accumulated result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct ScrapeBatch {
    pub rows: Vec<OutputRow>,
    pub failed_urls: Vec<FailedUrl>,
    /// Per-URL reports of the visits that succeeded, in target order.
    pub reports: Vec<(String, VisitReport)>,
    pub succeeded: usize,
}

impl ScrapeBatch {
    /// `true` when there was at least one target and none succeeded.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.succeeded == 0 && !self.failed_urls.is_empty()
    }
}

/// Site configuration for `url`: the one named by `forced` when given,
/// otherwise the one whose hosts match the URL.
///
/// # Errors
///
/// Returns [`ScraperError::UnknownSite`] when no site applies.
pub fn site_for<'s>(
    sites: &'s SitesFile,
    forced: Option<&str>,
    url: &str,
) -> Result<&'s SiteConfig, ScraperError> {
    let site = match forced {
        Some(name) => sites.by_name(name),
        None => sites.for_url(url),
    };
    site.ok_or_else(|| ScraperError::UnknownSite {
        url: url.to_owned(),
    })
}

/// Visits every target in order on the one page.
///
/// A failing URL is logged and recorded in `failed_urls`; it never stops the
/// batch or touches the rows of other URLs.
pub async fn run_batch<P: PageAccessor>(
    page: &mut P,
    targets: &[ScrapeTarget],
    sites: &SitesFile,
    forced_site: Option<&str>,
    settings: &ScrapeSettings,
) -> ScrapeBatch {
    let mut batch = ScrapeBatch::default();
    let total = targets.len();

    for (position, target) in targets.iter().enumerate() {
        tracing::info!(url = %target.url, position = position + 1, total, "starting target");

        let result = match site_for(sites, forced_site, &target.url) {
            Ok(site) => scrape_product(page, target, site, settings).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(scrape) => {
                batch.succeeded += 1;
                batch.rows.extend(scrape.rows);
                batch.reports.push((scrape.url, scrape.report));
            }
            Err(e) => {
                tracing::error!(url = %target.url, error = %e, "product page failed");
                batch.failed_urls.push(FailedUrl {
                    url: target.url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if batch.failed_urls.is_empty() {
        tracing::info!(total, rows = batch.rows.len(), "batch complete");
    } else {
        tracing::warn!(
            total,
            failed = batch.failed_urls.len(),
            rows = batch.rows.len(),
            "batch complete with failures"
        );
    }
    batch
}
