//! Values produced while walking one product page.

use pdpx_core::OptionRole;
use rust_decimal::Decimal;

use crate::page::NodeRef;

/// Selection state of one option as the page presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Selected,
    Available,
    /// Sold out or otherwise not selectable. Reported, never clicked.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantItem {
    pub label: String,
    pub state: ItemState,
    /// Lookup key valid until the next click.
    pub handle: NodeRef,
}

impl VariantItem {
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.state == ItemState::Selected
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.state == ItemState::Disabled
    }
}

/// One user-selectable product dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantGroup {
    /// Column name for this dimension ("Color", "Size", or the page's label).
    pub name: String,
    pub role: Option<OptionRole>,
    /// 0 is walked outermost.
    pub precedence: usize,
    pub items: Vec<VariantItem>,
}

impl VariantGroup {
    /// Items that traversal will visit.
    pub fn live_items(&self) -> impl Iterator<Item = (usize, &VariantItem)> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_disabled())
    }

    /// The item at `index` if it still carries `label`, otherwise the first
    /// item with that label.
    #[must_use]
    pub fn resolve(&self, index: usize, label: &str) -> Option<&VariantItem> {
        self.items
            .get(index)
            .filter(|item| item.label == label)
            .or_else(|| self.items.iter().find(|item| item.label == label))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub group: String,
    pub label: String,
}

/// One value per traversed group, in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Combination {
    pub assignments: Vec<Assignment>,
}

impl Combination {
    #[must_use]
    pub fn new(assignments: Vec<Assignment>) -> Self {
        Self { assignments }
    }

    /// Label chosen for the group at `position`, if any.
    #[must_use]
    pub fn value(&self, position: usize) -> Option<&str> {
        self.assignments.get(position).map(|a| a.label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|a| a.label.as_str())
    }
}

impl std::fmt::Display for Combination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.assignments.is_empty() {
            return f.write_str("(no options)");
        }
        let labels: Vec<&str> = self.labels().collect();
        f.write_str(&labels.join(" / "))
    }
}

/// How a selection came to be considered in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Nothing to select (product without option groups).
    Unselected,
    /// The item was already selected; no click was made.
    AlreadySelected,
    /// The main image changed after the click.
    ImageChanged,
    /// The fixed cooldown for non-image groups elapsed.
    Cooldown,
    /// The main image never changed. Values read afterwards may be stale.
    TimedOut,
    /// Neither a direct nor a forced click went through.
    ClickFailed { reason: String },
}

impl Settlement {
    /// `false` when values read after this settlement may not belong to the
    /// combination.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        !matches!(self, Settlement::TimedOut | Settlement::ClickFailed { .. })
    }

    /// Settlement of a combination built from two selections: the less
    /// certain of the two.
    #[must_use]
    pub fn combine(self, later: Settlement) -> Settlement {
        if self.is_confirmed() {
            later
        } else {
            self
        }
    }
}

/// A settled combination as yielded by [`crate::traverse::Traversal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub combination: Combination,
    pub settlement: Settlement,
}

/// Everything captured for one combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationSnapshot {
    pub combination: Combination,
    /// Raw price text as shown on the page.
    pub price_text: String,
    pub cost_per_item: Decimal,
    pub variant_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub main_image_url: String,
    pub sku: String,
    pub settlement: Settlement,
}

/// Product-level values, identical for every combination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInvariants {
    pub title: String,
    pub brand: String,
    pub product_type: String,
    pub description_html: String,
    pub tags: Vec<String>,
    pub canonical_url: String,
    pub handle: String,
    pub primary_image_url: String,
}
