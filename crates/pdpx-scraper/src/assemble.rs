//! Flattens one product visit into import rows.

use std::collections::HashSet;

use pdpx_core::{OptionRole, OutputRow};

use crate::parse::format_money;
use crate::types::{CombinationSnapshot, ProductInvariants, VariantGroup};

/// Column name for the option at `position`: the group found at load, else
/// the group a later selection revealed, else the positional default.
fn option_name(
    groups: &[VariantGroup],
    snapshots: &[CombinationSnapshot],
    position: usize,
) -> String {
    groups
        .get(position)
        .map(|group| group.name.clone())
        .or_else(|| {
            snapshots
                .iter()
                .find_map(|s| s.combination.assignments.get(position))
                .map(|a| a.group.clone())
        })
        .unwrap_or_else(|| {
            OptionRole::for_position(position).map_or_else(
                || format!("Option {}", position + 1),
                |role| role.display_name().to_owned(),
            )
        })
}

/// One row per snapshot, in traversal order.
///
/// The first row carries the product-level fields (title, body, vendor, type,
/// tags, published flag, primary image, original URL); later rows leave them
/// blank and carry only the handle and variant fields.
#[must_use]
pub fn assemble(
    invariants: &ProductInvariants,
    groups: &[VariantGroup],
    snapshots: &[CombinationSnapshot],
) -> Vec<OutputRow> {
    let option1_name = option_name(groups, snapshots, 0);
    let option2_name = option_name(groups, snapshots, 1);
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(snapshots.len());

    for (index, snapshot) in snapshots.iter().enumerate() {
        let first = index == 0;
        let option1 = snapshot.combination.value(0).unwrap_or_default();
        let option2 = snapshot.combination.value(1).unwrap_or_default();

        if !seen.insert((option1.to_owned(), option2.to_owned())) {
            tracing::warn!(
                handle = %invariants.handle,
                option1,
                option2,
                "duplicate option combination"
            );
        }

        let mut row = OutputRow {
            handle: invariants.handle.clone(),
            option1_name: if option1.is_empty() {
                String::new()
            } else {
                option1_name.clone()
            },
            option1_value: option1.to_owned(),
            option2_name: if option2.is_empty() {
                String::new()
            } else {
                option2_name.clone()
            },
            option2_value: option2.to_owned(),
            sku: snapshot.sku.clone(),
            inventory_policy: "deny".to_owned(),
            fulfillment_service: "manual".to_owned(),
            variant_price: format_money(snapshot.variant_price),
            compare_at_price: snapshot
                .compare_at_price
                .map(format_money)
                .unwrap_or_default(),
            requires_shipping: "TRUE".to_owned(),
            taxable: "TRUE".to_owned(),
            variant_image: snapshot.main_image_url.clone(),
            cost_per_item: format_money(snapshot.cost_per_item),
            ..OutputRow::default()
        };

        if first {
            row.title = invariants.title.clone();
            row.body_html = invariants.description_html.clone();
            row.vendor = invariants.brand.clone();
            row.product_type = invariants.product_type.clone();
            row.tags = invariants.tags.join(", ");
            row.published = "TRUE".to_owned();
            row.image_src = if invariants.primary_image_url.is_empty() {
                snapshot.main_image_url.clone()
            } else {
                invariants.primary_image_url.clone()
            };
            row.image_position = if row.image_src.is_empty() {
                String::new()
            } else {
                "1".to_owned()
            };
            row.original_url = invariants.canonical_url.clone();
        }

        rows.push(row);
    }

    rows
}

#[cfg(test)]
#[path = "assemble_test.rs"]
mod tests;
