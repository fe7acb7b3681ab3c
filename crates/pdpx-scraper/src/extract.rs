//! Per-combination extraction: price, main image and SKU as the page shows
//! them right after a selection settled.

use pdpx_core::{CompareAtPolicy, PricingConfig, SiteSelectors};
use rust_decimal::Decimal;

use crate::outcome::{Extracted, VisitReport};
use crate::page::{first_text, non_blank_attribute, NodeRef, PageAccessor};
use crate::parse::{absolutize_url, derive_sku, first_srcset_candidate, parse_price, round2};
use crate::settings::ScrapeSettings;
use crate::types::{CombinationSnapshot, Settled};

/// Prices derived from one cost reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPrices {
    pub cost_per_item: Decimal,
    pub variant_price: Decimal,
    pub compare_at_price: Option<Decimal>,
}

/// Applies the markup and the compare-at policy to `cost`.
///
/// `displayed_compare` is the struck-through price shown on the page, if any;
/// it is only consulted under [`CompareAtPolicy::DisplayedPrice`].
#[must_use]
pub fn derive_prices(
    cost: Decimal,
    displayed_compare: Option<Decimal>,
    pricing: &PricingConfig,
) -> DerivedPrices {
    let variant_price = round2(cost.saturating_mul(pricing.multiplier));
    let compare_at_price = match pricing.compare_at {
        CompareAtPolicy::None => None,
        CompareAtPolicy::DisplayedPrice => Some(round2(displayed_compare.unwrap_or(cost))),
        CompareAtPolicy::Multiplier(m) => Some(round2(variant_price.saturating_mul(m))),
    };
    DerivedPrices {
        cost_per_item: cost,
        variant_price,
        compare_at_price,
    }
}

/// Price text from the cost region, falling back to the current-price region.
pub async fn read_price_text<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
) -> Extracted<String> {
    if let Some(text) = first_text(page, &selectors.cost_price).await {
        return Extracted::ok(text);
    }
    if let Some(fallback) = selectors.current_price.as_deref() {
        if let Some(text) = first_text(page, fallback).await {
            return Extracted::ok(text);
        }
    }
    Extracted::degraded(String::new(), "no price element on page")
}

/// Cost from price text; zero when the text holds no number.
#[must_use]
pub fn parse_cost(price_text: &str) -> Extracted<Decimal> {
    match parse_price(price_text) {
        Some(cost) => Extracted::ok(cost),
        None => Extracted::degraded(
            Decimal::ZERO,
            format!("no number in price text {price_text:?}"),
        ),
    }
}

/// Raw `src`-like value of the main image: the first lazy-load attribute
/// holding a real URL, then `src`, then the first `srcset` candidate.
pub(crate) async fn read_image_reference<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
) -> Option<String> {
    if page.count(None, &selectors.main_image).await.ok()? == 0 {
        return None;
    }
    let node = NodeRef::first(&selectors.main_image);
    let candidates = selectors
        .image_lazy_attributes
        .iter()
        .map(String::as_str)
        .chain(["src"]);
    for name in candidates {
        if let Some(value) = non_blank_attribute(page, &node, name).await {
            if !value.starts_with("data:") {
                return Some(value);
            }
        }
    }
    let srcset = non_blank_attribute(page, &node, "srcset").await?;
    first_srcset_candidate(&srcset).map(str::to_owned)
}

/// Absolute URL of the main image.
pub async fn read_main_image<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
    page_url: &str,
) -> Extracted<String> {
    match read_image_reference(page, selectors)
        .await
        .and_then(|reference| absolutize_url(&reference, page_url))
    {
        Some(url) => Extracted::ok(url),
        None => Extracted::degraded(String::new(), "main image missing or unresolvable"),
    }
}

/// The page's current URL, or `fallback` when the browser will not say.
pub async fn read_current_url<P: PageAccessor>(page: &mut P, fallback: &str) -> Extracted<String> {
    match page.current_url().await {
        Ok(url) if !url.trim().is_empty() => Extracted::ok(url),
        Ok(_) => Extracted::degraded(fallback.to_owned(), "browser reported an empty URL"),
        Err(e) => Extracted::degraded(fallback.to_owned(), e.to_string()),
    }
}

async fn read_displayed_compare<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
) -> Option<Decimal> {
    let selector = selectors.compare_price.as_deref()?;
    parse_price(&first_text(page, selector).await?)
}

/// Captures the snapshot for a settled combination.
///
/// Every field has a default; failures are recorded in `report` and never
/// abort the visit.
pub async fn extract_snapshot<P: PageAccessor>(
    page: &mut P,
    settled: Settled,
    target_url: &str,
    selectors: &SiteSelectors,
    settings: &ScrapeSettings,
    report: &mut VisitReport,
) -> CombinationSnapshot {
    let key = settled.combination.to_string();
    let key = Some(key.as_str());

    let price_text = report.take("price", key, read_price_text(page, selectors).await);
    let cost = if price_text.is_empty() {
        Decimal::ZERO
    } else {
        report.take("cost_per_item", key, parse_cost(&price_text))
    };
    let displayed_compare = match settings.pricing.compare_at {
        CompareAtPolicy::DisplayedPrice => read_displayed_compare(page, selectors).await,
        _ => None,
    };
    let prices = derive_prices(cost, displayed_compare, &settings.pricing);

    let page_url = report.take("url", key, read_current_url(page, target_url).await);
    let main_image_url = report.take(
        "main_image",
        key,
        read_main_image(page, selectors, &page_url).await,
    );
    let sku = derive_sku(
        &page_url,
        selectors.sku_query_param.as_deref(),
        settled.combination.labels(),
    );

    tracing::debug!(
        combination = key.unwrap_or_default(),
        price = %prices.variant_price,
        sku = %sku,
        "combination captured"
    );

    CombinationSnapshot {
        combination: settled.combination,
        price_text,
        cost_per_item: prices.cost_per_item,
        variant_price: prices.variant_price,
        compare_at_price: prices.compare_at_price,
        main_image_url,
        sku,
        settlement: settled.settlement,
    }
}
