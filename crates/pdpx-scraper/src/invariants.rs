//! Product-level fields, read once per visit before any option is touched.

use pdpx_core::{ScrapeTarget, SiteSelectors};

use crate::extract::{read_current_url, read_main_image};
use crate::outcome::{Extracted, VisitReport};
use crate::page::{first_text, non_blank_attribute, NodeRef, PageAccessor};
use crate::parse::{absolutize_url, product_id_from_url, slugify};
use crate::settings::ScrapeSettings;
use crate::types::ProductInvariants;

pub async fn read_invariants<P: PageAccessor>(
    page: &mut P,
    target: &ScrapeTarget,
    selectors: &SiteSelectors,
    settings: &ScrapeSettings,
    report: &mut VisitReport,
) -> ProductInvariants {
    let title = report.take("title", None, read_title(page, selectors).await);
    let brand = match &settings.vendor {
        Some(vendor) => vendor.clone(),
        None => report.take("brand", None, read_brand(page, selectors).await),
    };
    let description_html = report.take(
        "description",
        None,
        read_description(page, selectors, settings).await,
    );
    let crumbs = read_breadcrumbs(page, selectors).await;
    let tags = build_tags(&crumbs, &title, &target.extra_tags);

    let page_url = report.take("url", None, read_current_url(page, &target.url).await);
    let canonical_url = read_canonical(page, selectors, &page_url).await;
    let handle = report.take("handle", None, derive_handle(&title, &canonical_url));
    let primary_image_url = report.take(
        "main_image",
        None,
        read_main_image(page, selectors, &page_url).await,
    );

    ProductInvariants {
        title,
        brand,
        product_type: settings.product_type.clone().unwrap_or_default(),
        description_html,
        tags,
        canonical_url,
        handle,
        primary_image_url,
    }
}

async fn read_title<P: PageAccessor>(page: &mut P, selectors: &SiteSelectors) -> Extracted<String> {
    match first_text(page, &selectors.title).await {
        Some(title) => Extracted::ok(title),
        None => Extracted::degraded(String::new(), "title element is empty"),
    }
}

async fn read_brand<P: PageAccessor>(page: &mut P, selectors: &SiteSelectors) -> Extracted<String> {
    let Some(selector) = selectors.brand.as_deref() else {
        return Extracted::ok(String::new());
    };
    match first_text(page, selector).await {
        Some(brand) => Extracted::ok(brand),
        None => Extracted::degraded(String::new(), "brand element missing"),
    }
}

/// Description markup. When it is not rendered yet and the site has a
/// trigger (tab, accordion), the trigger is clicked once and the read retried.
async fn read_description<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
    settings: &ScrapeSettings,
) -> Extracted<String> {
    let Some(selector) = selectors.description.as_deref() else {
        return Extracted::ok(String::new());
    };
    if let Some(html) = description_html(page, selector).await {
        return Extracted::ok(html);
    }
    if let Some(trigger) = selectors.description_trigger.as_deref() {
        open_trigger(page, trigger, settings).await;
        if let Some(html) = description_html(page, selector).await {
            return Extracted::ok(html);
        }
    }
    Extracted::degraded(String::new(), "description missing")
}

async fn description_html<P: PageAccessor>(page: &mut P, selector: &str) -> Option<String> {
    if page.count(None, selector).await.ok()? == 0 {
        return None;
    }
    let html = page.inner_html(&NodeRef::first(selector)).await.ok()?;
    let html = html.trim();
    (!html.is_empty()).then(|| html.to_owned())
}

async fn open_trigger<P: PageAccessor>(page: &mut P, selector: &str, settings: &ScrapeSettings) {
    if page.count(None, selector).await.unwrap_or(0) == 0 {
        tracing::debug!(selector, "description trigger not on page");
        return;
    }
    let node = NodeRef::first(selector);
    if let Err(e) = page.click(&node, settings.click_timeout).await {
        tracing::debug!(error = %e, "description trigger click failed, forcing");
        if let Err(e) = page.force_click(&node).await {
            tracing::warn!(error = %e, "could not open description");
            return;
        }
    }
    tokio::time::sleep(settings.residual_pause).await;
}

async fn read_breadcrumbs<P: PageAccessor>(page: &mut P, selectors: &SiteSelectors) -> Vec<String> {
    let Some(selector) = selectors.breadcrumbs.as_deref() else {
        return Vec::new();
    };
    let count = page.count(None, selector).await.unwrap_or(0);
    let mut crumbs = Vec::with_capacity(count);
    for index in 0..count {
        match page.text(&NodeRef::nth(selector, index)).await {
            Ok(text) => crumbs.push(text),
            Err(e) => tracing::debug!(index, error = %e, "breadcrumb unreadable"),
        }
    }
    crumbs
}

/// Breadcrumb trail (without a leading "Home" or a trailing crumb repeating
/// the title) followed by the target's extra tags, deduplicated ignoring case.
#[must_use]
pub fn build_tags(crumbs: &[String], title: &str, extra_tags: &[String]) -> Vec<String> {
    let mut trail: Vec<&str> = crumbs
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();
    if trail.first().is_some_and(|c| c.eq_ignore_ascii_case("home")) {
        trail.remove(0);
    }
    if trail
        .last()
        .is_some_and(|c| c.eq_ignore_ascii_case(title.trim()))
    {
        trail.pop();
    }

    let mut tags: Vec<String> = Vec::new();
    for tag in trail
        .into_iter()
        .chain(extra_tags.iter().map(|t| t.trim()))
    {
        if tag.is_empty() || tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            continue;
        }
        tags.push(tag.to_owned());
    }
    tags
}

async fn read_canonical<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
    page_url: &str,
) -> String {
    if page.count(None, &selectors.canonical_link).await.unwrap_or(0) > 0 {
        let node = NodeRef::first(&selectors.canonical_link);
        if let Some(url) = non_blank_attribute(page, &node, "href")
            .await
            .and_then(|href| absolutize_url(&href, page_url))
        {
            return url;
        }
    }
    page_url.to_owned()
}

/// Slug of the title, or of the URL's last path segment when the title
/// yields nothing.
#[must_use]
pub fn derive_handle(title: &str, canonical_url: &str) -> Extracted<String> {
    let from_title = slugify(title);
    if !from_title.is_empty() {
        return Extracted::ok(from_title);
    }
    let from_url = product_id_from_url(canonical_url, None)
        .map(|segment| slugify(&segment))
        .unwrap_or_default();
    if from_url.is_empty() {
        Extracted::degraded(String::new(), "no title or URL path to build a handle from")
    } else {
        Extracted::degraded(from_url, "handle built from URL, title was empty")
    }
}
