//! Variant group discovery.
//!
//! Reads every option group the page currently shows. Discovery never fails:
//! a query error is the same as a page with no options. Callers re-run it
//! after any click instead of keeping the result.

use pdpx_core::{OptionRole, OptionRoles, SiteSelectors};

use crate::error::PageError;
use crate::page::{non_blank_attribute, NodeRef, PageAccessor};
use crate::types::{ItemState, VariantGroup, VariantItem};

/// Raw selection signals read from one option element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSignals {
    pub classes: Vec<String>,
    pub aria_checked: Option<String>,
    pub aria_selected: Option<String>,
    pub aria_disabled: Option<String>,
    pub disabled_attr: bool,
    pub input_checked: bool,
    pub input_disabled: bool,
}

/// Decides an item's state from its signals.
///
/// Any one selected signal is enough to count as selected, and likewise for
/// disabled. Disabled wins over selected: a sold-out option that happens to be
/// pre-selected is still never traversed. Absent signals mean "available".
#[must_use]
pub fn classify_item(signals: &ItemSignals, selectors: &SiteSelectors) -> ItemState {
    let has_class = |wanted: &[String]| {
        wanted
            .iter()
            .any(|class| signals.classes.iter().any(|c| c == class))
    };
    let is_true = |value: &Option<String>| {
        value
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    };

    let disabled = has_class(&selectors.disabled_classes)
        || is_true(&signals.aria_disabled)
        || signals.disabled_attr
        || signals.input_disabled;
    if disabled {
        return ItemState::Disabled;
    }

    let selected = signals.input_checked
        || has_class(&selectors.selected_classes)
        || is_true(&signals.aria_checked)
        || is_true(&signals.aria_selected);
    if selected {
        ItemState::Selected
    } else {
        ItemState::Available
    }
}

/// Reads the selection signals of `item`. Failed reads count as absent.
pub async fn read_signals<P: PageAccessor>(
    page: &mut P,
    item: &NodeRef,
    selectors: &SiteSelectors,
) -> ItemSignals {
    let attr = |value: Result<Option<String>, PageError>| value.ok().flatten();

    let classes = attr(page.attribute(item, "class").await)
        .map(|c| c.split_whitespace().map(str::to_owned).collect())
        .unwrap_or_default();
    let aria_checked = attr(page.attribute(item, "aria-checked").await);
    let aria_selected = attr(page.attribute(item, "aria-selected").await);
    let aria_disabled = attr(page.attribute(item, "aria-disabled").await);
    let disabled_attr = attr(page.attribute(item, "disabled").await).is_some();

    let mut input_checked = false;
    let mut input_disabled = false;
    if let Some(input_selector) = selectors.item_input.as_deref() {
        if page.count(Some(item), input_selector).await.unwrap_or(0) > 0 {
            let input = item.child(input_selector, 0);
            input_checked = page.is_checked(&input).await.unwrap_or(false);
            input_disabled = attr(page.attribute(&input, "disabled").await).is_some();
        }
    }

    ItemSignals {
        classes,
        aria_checked,
        aria_selected,
        aria_disabled,
        disabled_attr,
        input_checked,
        input_disabled,
    }
}

/// A group as read from the page, before roles and names are settled.
struct RawGroup {
    label: Option<String>,
    items: Vec<(Option<String>, ItemState, NodeRef)>,
}

/// Scans the page for option groups.
///
/// Groups are ordered by role (color before size, unrecognized last) and
/// numbered by that order. Groups with no items are dropped.
pub async fn discover_groups<P: PageAccessor>(
    page: &mut P,
    selectors: &SiteSelectors,
    roles: &OptionRoles,
) -> Vec<VariantGroup> {
    let Some(group_selector) = selectors.variant_group.as_deref() else {
        return Vec::new();
    };

    let container_count = match page.count(None, group_selector).await {
        Ok(n) => n,
        Err(e) => {
            tracing::debug!(error = %e, "variant group query failed, treating as no variants");
            return Vec::new();
        }
    };

    let mut raw_groups = Vec::with_capacity(container_count);
    for index in 0..container_count {
        let container = NodeRef::nth(group_selector, index);
        let raw = read_group(page, &container, selectors).await;
        if raw.items.is_empty() {
            tracing::debug!(group = index, "option group has no items, ignoring");
            continue;
        }
        raw_groups.push(raw);
    }

    let groups = name_groups(raw_groups, roles);
    tracing::debug!(
        groups = groups.len(),
        names = ?groups.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
        "variant groups discovered"
    );
    groups
}

async fn read_group<P: PageAccessor>(
    page: &mut P,
    container: &NodeRef,
    selectors: &SiteSelectors,
) -> RawGroup {
    let label = read_group_label(page, container, selectors).await;

    let item_count = page
        .count(Some(container), &selectors.variant_item)
        .await
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, group = %container, "item query failed");
            0
        });

    let mut items = Vec::with_capacity(item_count);
    for index in 0..item_count {
        let node = container.child(&selectors.variant_item, index);
        let label = read_item_label(page, &node, selectors).await;
        let signals = read_signals(page, &node, selectors).await;
        items.push((label, classify_item(&signals, selectors), node));
    }

    RawGroup { label, items }
}

async fn read_group_label<P: PageAccessor>(
    page: &mut P,
    container: &NodeRef,
    selectors: &SiteSelectors,
) -> Option<String> {
    if let Some(label_selector) = selectors.group_label.as_deref() {
        if page.count(Some(container), label_selector).await.unwrap_or(0) > 0 {
            let node = container.child(label_selector, 0);
            if let Ok(text) = page.text(&node).await {
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_owned());
                }
            }
        }
    }
    non_blank_attribute(page, container, "aria-label").await
}

/// Visible text first, then the configured attributes, then the inner
/// input's `value`.
async fn read_item_label<P: PageAccessor>(
    page: &mut P,
    node: &NodeRef,
    selectors: &SiteSelectors,
) -> Option<String> {
    if let Ok(text) = page.text(node).await {
        let text = collapse_whitespace(&text);
        if !text.is_empty() {
            return Some(text);
        }
    }
    for name in &selectors.item_label_attributes {
        if let Some(value) = non_blank_attribute(page, node, name).await {
            return Some(value);
        }
    }
    let input_selector = selectors.item_input.as_deref()?;
    if page.count(Some(node), input_selector).await.ok()? == 0 {
        return None;
    }
    non_blank_attribute(page, &node.child(input_selector, 0), "value").await
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assigns roles, names and precedence.
///
/// A labeled group gets the role its label maps to. An unlabeled group takes
/// the first role no other group has claimed, so a lone unlabeled group is
/// "Color" and the second is "Size".
fn name_groups(raw_groups: Vec<RawGroup>, roles: &OptionRoles) -> Vec<VariantGroup> {
    let mut assigned: Vec<Option<OptionRole>> = raw_groups
        .iter()
        .map(|g| g.label.as_deref().and_then(|l| roles.role_for_label(l)))
        .collect();

    let labeled: Vec<OptionRole> = assigned.iter().flatten().copied().collect();
    let mut free_roles = OptionRole::ORDERED
        .into_iter()
        .filter(|role| !labeled.contains(role));
    for (slot, raw) in assigned.iter_mut().zip(&raw_groups) {
        if raw.label.is_none() {
            *slot = free_roles.next();
        }
    }

    let mut groups: Vec<(Option<OptionRole>, RawGroup)> =
        assigned.into_iter().zip(raw_groups).collect();
    // Stable: page order is kept within the same role rank.
    groups.sort_by_key(|(role, _)| {
        role.and_then(|r| OptionRole::ORDERED.iter().position(|o| *o == r))
            .unwrap_or(OptionRole::ORDERED.len())
    });

    groups
        .into_iter()
        .enumerate()
        .map(|(precedence, (role, raw))| {
            let name = match (role, raw.label.as_deref()) {
                (Some(role), _) => role.display_name().to_owned(),
                (None, Some(label)) => clean_group_label(label),
                (None, None) => format!("Option {}", precedence + 1),
            };
            let unknown = role.map_or("Unknown Option", OptionRole::unknown_value);
            let items = raw
                .items
                .into_iter()
                .map(|(label, state, handle)| VariantItem {
                    label: label.unwrap_or_else(|| {
                        tracing::warn!(group = %name, item = %handle, "option label unreadable");
                        unknown.to_owned()
                    }),
                    state,
                    handle,
                })
                .collect();
            VariantGroup {
                name,
                role,
                precedence,
                items,
            }
        })
        .collect()
}

/// `"Width: Regular"` → `"Width"`.
fn clean_group_label(label: &str) -> String {
    let head = label.split(':').next().unwrap_or_default();
    collapse_whitespace(head.trim_matches(|c: char| !c.is_alphanumeric()))
}

#[cfg(test)]
#[path = "discovery_test.rs"]
mod tests;
