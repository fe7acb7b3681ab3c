//! The `run` command: load configuration, drive the browser over the target
//! list, write the output files.
//!
//! Per-URL failures are logged and listed in the failures file rather than
//! propagated, so one bad page does not abort the run. The command only fails
//! as a whole when configuration is unusable, the browser cannot be reached,
//! output cannot be written, or every URL failed.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use pdpx_core::{AppConfig, ScrapeTarget, SitesFile};
use pdpx_scraper::{run_batch, site_for, ScrapeSettings};

use crate::sink::write_batch;
use crate::webdriver::WebDriverPage;

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub targets_path: PathBuf,
    pub forced_site: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
    pub headed: bool,
}

/// Runs the extraction described by `options`.
///
/// # Errors
///
/// Returns an error if the site or target files cannot be loaded, the
/// WebDriver session cannot be started, output files cannot be written, or
/// no target produced any rows.
pub(crate) async fn run_extract(config: &AppConfig, options: &RunOptions) -> anyhow::Result<()> {
    let sites = pdpx_core::load_sites(&config.sites_path)
        .with_context(|| format!("loading sites from {}", config.sites_path.display()))?;
    let targets = pdpx_core::load_targets(&options.targets_path)
        .with_context(|| format!("loading targets from {}", options.targets_path.display()))?
        .targets;
    let forced_site = options.forced_site.as_deref();

    if let Some(name) = forced_site {
        if sites.by_name(name).is_none() {
            anyhow::bail!(
                "site '{name}' not found in {}; configured sites: [{}]",
                config.sites_path.display(),
                site_names(&sites).join(", ")
            );
        }
    }

    if options.dry_run {
        print_plan(&sites, forced_site, &targets);
        return Ok(());
    }

    let settings = ScrapeSettings::from(config);
    tracing::info!(
        targets = targets.len(),
        webdriver = %config.webdriver_url,
        multiplier = %settings.pricing.multiplier,
        compare_at = %settings.pricing.compare_at,
        "starting extraction run"
    );

    let mut page = WebDriverPage::connect(
        &config.webdriver_url,
        !options.headed,
        Duration::from_millis(config.poll_interval_ms),
    )
    .await?;
    let batch = run_batch(&mut page, &targets, &sites, forced_site, &settings).await;
    if let Err(e) = page.close().await {
        tracing::warn!(error = %e, "browser session did not close cleanly");
    }

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let paths = write_batch(&output_dir, &batch, chrono::Local::now())?;

    println!(
        "extracted {} rows from {}/{} URLs into {}",
        batch.rows.len(),
        batch.succeeded,
        targets.len(),
        paths.products.display()
    );
    if let Some(failed) = &paths.failed {
        println!(
            "{} URLs failed, see {}",
            batch.failed_urls.len(),
            failed.display()
        );
    }

    if batch.all_failed() {
        anyhow::bail!("all {} URLs failed", batch.failed_urls.len());
    }
    Ok(())
}

fn site_names(sites: &SitesFile) -> Vec<&str> {
    sites.sites.iter().map(|s| s.name.as_str()).collect()
}

/// One line per target naming the site that would handle it.
fn plan_lines(sites: &SitesFile, forced_site: Option<&str>, targets: &[ScrapeTarget]) -> Vec<String> {
    targets
        .iter()
        .map(|target| match site_for(sites, forced_site, &target.url) {
            Ok(site) => format!("{} -> {}", target.url, site.name),
            Err(_) => format!("{} -> (no matching site, would fail)", target.url),
        })
        .collect()
}

fn print_plan(sites: &SitesFile, forced_site: Option<&str>, targets: &[ScrapeTarget]) {
    println!("dry-run: would extract {} URLs:", targets.len());
    for line in plan_lines(sites, forced_site, targets) {
        println!("  {line}");
    }
}
