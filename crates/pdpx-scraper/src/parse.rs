//! String parsing for values read off product pages: prices, slugs, image
//! URLs and SKUs.
//!
//! These functions use manual byte scanning rather than `regex`. See
//! [`crate::extract`] for how they compose into a combination snapshot.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use url::Url;

use crate::parse_helpers::{first_numeric_run, normalize_separators};

/// Parses the first price in `text`.
///
/// Recognizes currency symbols and words around the number, thousands
/// separators in either convention, and ranges (the lower bound wins).
/// Returns `None` when `text` holds no number.
#[must_use]
pub fn parse_price(text: &str) -> Option<Decimal> {
    let run = first_numeric_run(text)?;
    let mut plain = normalize_separators(run);
    if plain.starts_with('.') {
        plain.insert(0, '0');
    }
    Decimal::from_str(&plain).ok()
}

/// Rounds to cents, halves away from zero.
#[must_use]
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a money amount with exactly two decimals.
#[must_use]
pub fn format_money(value: Decimal) -> String {
    let rounded = round2(value);
    format!("{rounded:.2}")
}

/// URL-safe lowercase slug: alphanumerics kept, everything else collapses
/// into single dashes.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Resolves an image reference against the page it appeared on.
///
/// Protocol-relative (`//cdn...`) and path-relative references become
/// absolute; inline `data:` placeholders are rejected.
#[must_use]
pub fn absolutize_url(reference: &str, page_url: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with("data:") {
        return None;
    }
    if let Ok(absolute) = Url::parse(reference) {
        return Some(absolute.to_string());
    }
    match Url::parse(page_url) {
        Ok(base) => base.join(reference).ok().map(|u| u.to_string()),
        Err(_) => reference
            .strip_prefix("//")
            .map(|rest| format!("https://{rest}")),
    }
}

/// First URL of a `srcset` value (`"a.jpg 1x, b.jpg 2x"` → `"a.jpg"`).
#[must_use]
pub fn first_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .find_map(|candidate| candidate.split_whitespace().next())
}

/// Product identifier found in `page_url`: the `query_param` value when
/// configured and present, otherwise the last non-empty path segment
/// without its extension.
#[must_use]
pub fn product_id_from_url(page_url: &str, query_param: Option<&str>) -> Option<String> {
    let url = Url::parse(page_url).ok()?;

    if let Some(param) = query_param {
        let from_query = url
            .query_pairs()
            .find(|(key, _)| key == param)
            .map(|(_, value)| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        if from_query.is_some() {
            return from_query;
        }
    }

    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let stem = segment.rsplit_once('.').map_or(segment, |(stem, _)| stem);
    (!stem.is_empty()).then(|| stem.to_owned())
}

/// SKU for one combination: the product id followed by each option label,
/// slugified and dash-joined.
///
/// `("https://shop.example.com/p/trail-runner?pid=4101", Some("pid"), ["Black", "7"])`
/// → `"4101-black-7"`.
#[must_use]
pub fn derive_sku<'a>(
    page_url: &str,
    query_param: Option<&str>,
    labels: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut parts: Vec<String> = product_id_from_url(page_url, query_param)
        .map(|id| slugify(&id))
        .into_iter()
        .filter(|id| !id.is_empty())
        .collect();
    parts.extend(labels.into_iter().map(slugify).filter(|s| !s.is_empty()));
    parts.join("-")
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
