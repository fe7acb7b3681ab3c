//! Walks every live combination of the page's option groups.
//!
//! The page re-renders after each click, so nothing discovered before a click
//! is trusted after it: each option is looked up again by position and label
//! in a fresh discovery pass immediately before it is clicked. The secondary
//! group is whatever sits at precedence 1 after each primary selection, since
//! a color may show sizes its siblings do not (or none at all).

use pdpx_core::{OptionRole, SiteConfig};

use crate::discovery::discover_groups;
use crate::page::PageAccessor;
use crate::select::{select, GroupKind};
use crate::settings::ScrapeSettings;
use crate::types::{Assignment, Combination, Settled, Settlement, VariantGroup, VariantItem};

/// An option remembered by position and label only.
#[derive(Debug, Clone)]
struct ItemKey {
    index: usize,
    label: String,
}

impl ItemKey {
    fn live_items(group: &VariantGroup) -> Vec<ItemKey> {
        group
            .live_items()
            .map(|(index, item)| ItemKey {
                index,
                label: item.label.clone(),
            })
            .collect()
    }
}

#[derive(Debug)]
enum State {
    Start,
    /// About to select the `next`-th live item of the primary group.
    Primary { next: usize },
    /// Walking the secondary options available under `primary`.
    Secondary {
        group: String,
        primary: Assignment,
        primary_settlement: Settlement,
        items: Vec<ItemKey>,
        next: usize,
    },
    Done,
}

/// Lazy, finite, single-pass iterator over settled combinations.
pub struct Traversal<'a, P> {
    page: &'a mut P,
    site: &'a SiteConfig,
    settings: &'a ScrapeSettings,
    primary: Option<(String, Option<OptionRole>, Vec<ItemKey>)>,
    /// Latest discovery result; `None` once a click may have invalidated it.
    fresh: Option<Vec<VariantGroup>>,
    state: State,
    discovery_calls: usize,
    primary_cursor: usize,
    skipped: Vec<String>,
}

impl<'a, P: PageAccessor> Traversal<'a, P> {
    /// Starts a traversal over `groups`, the discovery result read right
    /// before this call. Only the first two groups are walked; any others
    /// stay at whatever the page has selected.
    pub fn new(
        page: &'a mut P,
        site: &'a SiteConfig,
        settings: &'a ScrapeSettings,
        groups: Vec<VariantGroup>,
    ) -> Self {
        if groups.len() > 2 {
            tracing::warn!(
                groups = groups.len(),
                held = ?groups[2..].iter().map(|g| g.name.as_str()).collect::<Vec<_>>(),
                "more than two option groups; extra groups keep their current selection"
            );
        }
        let primary = groups
            .first()
            .map(|g| (g.name.clone(), g.role, ItemKey::live_items(g)));

        Self {
            page,
            site,
            settings,
            primary,
            fresh: Some(groups),
            state: State::Start,
            discovery_calls: 0,
            primary_cursor: 0,
            skipped: Vec::new(),
        }
    }

    /// Discovery passes made since construction.
    #[must_use]
    pub fn discovery_calls(&self) -> usize {
        self.discovery_calls
    }

    /// Combinations dropped because an option vanished or refused clicks.
    #[must_use]
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// The page, for reading values between steps.
    pub fn page(&mut self) -> &mut P {
        &mut *self.page
    }

    /// Advances to the next settled combination.
    pub async fn next(&mut self) -> Option<Settled> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,

                State::Start => {
                    if self.primary.is_none() {
                        return Some(Settled {
                            combination: Combination::default(),
                            settlement: Settlement::Unselected,
                        });
                    }
                    self.state = State::Primary { next: 0 };
                }

                State::Primary { next } => {
                    let Some((name, role, key)) = self.primary.as_ref().and_then(|(n, r, keys)| {
                        keys.get(next).map(|k| (n.clone(), *r, k.clone()))
                    }) else {
                        return None;
                    };
                    self.state = State::Primary { next: next + 1 };
                    self.primary_cursor = next + 1;

                    let Some(item) = self.resolve(&name, &key).await else {
                        self.record_skip(key.label);
                        continue;
                    };
                    let settlement = self.select(&item, primary_kind(role)).await;
                    if let Settlement::ClickFailed { .. } = settlement {
                        self.record_skip(key.label);
                        continue;
                    }

                    let assignment = Assignment {
                        group: name,
                        label: key.label,
                    };

                    let secondary = self
                        .discover()
                        .await
                        .get(1)
                        .filter(|g| g.name != assignment.group)
                        .map(|g| (g.name.clone(), ItemKey::live_items(g)));
                    let Some((group, items)) = secondary.filter(|(_, items)| !items.is_empty())
                    else {
                        tracing::debug!(
                            primary = %assignment.label,
                            "no secondary options for this value"
                        );
                        return Some(Settled {
                            combination: Combination::new(vec![assignment]),
                            settlement,
                        });
                    };
                    self.state = State::Secondary {
                        group,
                        primary: assignment,
                        primary_settlement: settlement,
                        items,
                        next: 0,
                    };
                }

                State::Secondary {
                    group,
                    primary,
                    primary_settlement,
                    items,
                    next,
                } => {
                    let Some(key) = items.get(next).cloned() else {
                        self.state = State::Primary {
                            next: self.primary_cursor,
                        };
                        continue;
                    };
                    self.state = State::Secondary {
                        group: group.clone(),
                        primary: primary.clone(),
                        primary_settlement: primary_settlement.clone(),
                        items,
                        next: next + 1,
                    };

                    let Some(item) = self.resolve(&group, &key).await else {
                        self.record_skip(format!("{} / {}", primary.label, key.label));
                        continue;
                    };
                    let settlement = self.select(&item, GroupKind::Plain).await;
                    if let Settlement::ClickFailed { .. } = settlement {
                        self.record_skip(format!("{} / {}", primary.label, key.label));
                        continue;
                    }

                    return Some(Settled {
                        combination: Combination::new(vec![
                            primary,
                            Assignment {
                                group,
                                label: key.label,
                            },
                        ]),
                        settlement: primary_settlement.combine(settlement),
                    });
                }
            }
        }
    }

    async fn select(&mut self, item: &VariantItem, kind: GroupKind) -> Settlement {
        let settlement = select(
            &mut *self.page,
            item,
            kind,
            &self.site.selectors,
            self.settings,
        )
        .await;
        // Even a no-op selection may have triggered scripts; rediscover.
        self.fresh = None;
        settlement
    }

    async fn discover(&mut self) -> &[VariantGroup] {
        if self.fresh.is_none() {
            self.discovery_calls += 1;
            let groups = discover_groups(
                &mut *self.page,
                &self.site.selectors,
                &self.site.option_roles,
            )
            .await;
            self.fresh = Some(groups);
        }
        self.fresh.as_deref().unwrap_or_default()
    }

    async fn fresh_group(&mut self, name: &str) -> Option<&VariantGroup> {
        self.discover().await.iter().find(|g| g.name == name)
    }

    /// Looks `key` up in a fresh discovery pass. An option that has gone
    /// missing or turned disabled since it was listed is not clicked.
    async fn resolve(&mut self, group_name: &str, key: &ItemKey) -> Option<VariantItem> {
        let Some(group) = self.fresh_group(group_name).await else {
            tracing::warn!(group = %group_name, label = %key.label, "option group vanished, skipping");
            return None;
        };
        match group.resolve(key.index, &key.label) {
            Some(item) if item.is_disabled() => {
                tracing::warn!(
                    group = %group_name,
                    label = %key.label,
                    "option became unavailable before it could be selected, skipping"
                );
                None
            }
            Some(item) => Some(item.clone()),
            None => {
                tracing::warn!(
                    group = %group_name,
                    label = %key.label,
                    expected_index = key.index,
                    found = group.items.len(),
                    "option vanished before it could be selected, skipping"
                );
                None
            }
        }
    }

    fn record_skip(&mut self, combination: String) {
        tracing::warn!(combination = %combination, "combination skipped");
        self.skipped.push(combination);
    }
}

/// The outer group is usually the one that swaps product imagery, except
/// when it is known to be sizes.
fn primary_kind(role: Option<OptionRole>) -> GroupKind {
    match role {
        Some(OptionRole::Size) => GroupKind::Plain,
        _ => GroupKind::ImageBearing,
    }
}
