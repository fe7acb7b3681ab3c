//! Per-site selector tables.
//!
//! Every page query the engine makes goes through a logical role defined
//! here, so supporting a new storefront is a YAML change:
//!
//! ```yaml
//! sites:
//!   - name: example-shoes
//!     hosts: [shop.example.com]
//!     selectors:
//!       title: "h1.product-title"
//!       cost_price: ".price .sale"
//!       current_price: ".price .current"
//!       main_image: ".gallery img.main"
//!       variant_group: ".swatches fieldset"
//!       group_label: "legend"
//!       variant_item: "label.swatch"
//!     option_roles:
//!       color: [color, colour, finish]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Concrete page queries for each logical role.
///
/// Selectors are CSS. `variant_item`, `group_label` and `item_input` are
/// evaluated inside a matched `variant_group` / `variant_item` respectively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSelectors {
    /// Page-identity element. A page without it is treated as failed.
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    /// The region holding the price we pay (tried first).
    pub cost_price: String,
    /// Fallback price region when `cost_price` is absent.
    #[serde(default)]
    pub current_price: Option<String>,
    /// Struck-through "was" price, used by `CompareAtPolicy::DisplayedPrice`.
    #[serde(default)]
    pub compare_price: Option<String>,
    pub main_image: String,
    /// Lazy-load attributes checked before `src`, in order.
    #[serde(default = "default_image_lazy_attributes")]
    pub image_lazy_attributes: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Tab or accordion that has to be opened before the description renders.
    #[serde(default)]
    pub description_trigger: Option<String>,
    /// Each match is one crumb; text is read in document order.
    #[serde(default)]
    pub breadcrumbs: Option<String>,
    #[serde(default = "default_canonical_link")]
    pub canonical_link: String,
    /// Container of one option group. `None` means the site never shows variants.
    #[serde(default)]
    pub variant_group: Option<String>,
    #[serde(default)]
    pub group_label: Option<String>,
    #[serde(default = "default_variant_item")]
    pub variant_item: String,
    /// Attributes consulted for an item's label when its text is empty.
    #[serde(default = "default_item_label_attributes")]
    pub item_label_attributes: Vec<String>,
    /// Underlying form control inside an item (radio/checkbox), if any.
    #[serde(default = "default_item_input")]
    pub item_input: Option<String>,
    #[serde(default = "default_selected_classes")]
    pub selected_classes: Vec<String>,
    #[serde(default = "default_disabled_classes")]
    pub disabled_classes: Vec<String>,
    /// Query parameter carrying the product or variant id in the page URL.
    #[serde(default)]
    pub sku_query_param: Option<String>,
}

/// Required roles are left blank (and would fail validation); everything
/// else takes the same default as an omitted YAML key.
impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            title: String::new(),
            brand: None,
            cost_price: String::new(),
            current_price: None,
            compare_price: None,
            main_image: String::new(),
            image_lazy_attributes: default_image_lazy_attributes(),
            description: None,
            description_trigger: None,
            breadcrumbs: None,
            canonical_link: default_canonical_link(),
            variant_group: None,
            group_label: None,
            variant_item: default_variant_item(),
            item_label_attributes: default_item_label_attributes(),
            item_input: default_item_input(),
            selected_classes: default_selected_classes(),
            disabled_classes: default_disabled_classes(),
            sku_query_param: None,
        }
    }
}

fn default_image_lazy_attributes() -> Vec<String> {
    vec![
        "data-src".to_string(),
        "data-lazy-src".to_string(),
        "data-original".to_string(),
    ]
}

fn default_canonical_link() -> String {
    "link[rel='canonical']".to_string()
}

fn default_variant_item() -> String {
    "label, button, li".to_string()
}

fn default_item_label_attributes() -> Vec<String> {
    vec![
        "aria-label".to_string(),
        "title".to_string(),
        "data-value".to_string(),
    ]
}

#[allow(clippy::unnecessary_wraps)]
fn default_item_input() -> Option<String> {
    Some("input".to_string())
}

fn default_selected_classes() -> Vec<String> {
    vec![
        "selected".to_string(),
        "active".to_string(),
        "is-selected".to_string(),
    ]
}

fn default_disabled_classes() -> Vec<String> {
    vec![
        "disabled".to_string(),
        "unavailable".to_string(),
        "sold-out".to_string(),
        "is-disabled".to_string(),
    ]
}

/// Recognized option dimensions, in traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionRole {
    Color,
    Size,
}

impl OptionRole {
    pub const ORDERED: [OptionRole; 2] = [OptionRole::Color, OptionRole::Size];

    /// Column name used when a group's label maps to this role.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            OptionRole::Color => "Color",
            OptionRole::Size => "Size",
        }
    }

    /// Value written when a selection's label could not be read.
    #[must_use]
    pub fn unknown_value(self) -> &'static str {
        match self {
            OptionRole::Color => "Unknown Color",
            OptionRole::Size => "Unknown Size",
        }
    }

    /// Role assumed for a group that has no recognizable label.
    #[must_use]
    pub fn for_position(position: usize) -> Option<OptionRole> {
        Self::ORDERED.get(position).copied()
    }
}

impl std::fmt::Display for OptionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// On-page label text recognized for each [`OptionRole`].
///
/// Matching is on the whole normalized label (case-folded, text after a
/// `:` dropped, surrounding punctuation trimmed), never on substrings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRoles {
    #[serde(default = "default_color_aliases")]
    pub color: Vec<String>,
    #[serde(default = "default_size_aliases")]
    pub size: Vec<String>,
}

impl Default for OptionRoles {
    fn default() -> Self {
        Self {
            color: default_color_aliases(),
            size: default_size_aliases(),
        }
    }
}

fn default_color_aliases() -> Vec<String> {
    ["color", "colour", "colors", "colours", "select color"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_size_aliases() -> Vec<String> {
    ["size", "sizes", "select size", "shoe size"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl OptionRoles {
    /// Maps a group label such as `"Colour: Black"` to its role.
    #[must_use]
    pub fn role_for_label(&self, label: &str) -> Option<OptionRole> {
        let key = normalize_label(label);
        if key.is_empty() {
            return None;
        }
        OptionRole::ORDERED.into_iter().find(|role| {
            let aliases = match role {
                OptionRole::Color => &self.color,
                OptionRole::Size => &self.size,
            };
            aliases.iter().any(|alias| normalize_label(alias) == key)
        })
    }
}

/// Case-folds, drops anything after the first `:`, trims punctuation, and
/// collapses whitespace.
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let head = label.split(':').next().unwrap_or_default();
    head.trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One storefront: the hosts it serves and how to read its pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    pub selectors: SiteSelectors,
    #[serde(default)]
    pub option_roles: OptionRoles,
}

#[derive(Debug, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteConfig>,
}

impl SitesFile {
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&SiteConfig> {
        self.sites
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Picks the site whose `hosts` list contains the URL's host. A leading
    /// `www.` is ignored on both sides.
    #[must_use]
    pub fn for_url(&self, url: &str) -> Option<&SiteConfig> {
        let host = extract_host(url)?;
        let host = host.strip_prefix("www.").unwrap_or(&host);
        self.sites.iter().find(|s| {
            s.hosts.iter().any(|h| {
                let h = h.to_ascii_lowercase();
                h.strip_prefix("www.").unwrap_or(&h) == host
            })
        })
    }
}

/// Lower-cased host of `url`, without scheme, port, or path.
fn extract_host(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = without_scheme.split(['/', '?', '#']).next()?;
    let host = authority.rsplit('@').next()?.split(':').next()?;
    if host.is_empty() {
        None
    } else {
        Some(host.to_ascii_lowercase())
    }
}

/// Load and validate the site selector tables from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sites_file: SitesFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_sites(&sites_file)?;

    Ok(sites_file)
}

fn validate_sites(sites_file: &SitesFile) -> Result<(), ConfigError> {
    if sites_file.sites.is_empty() {
        return Err(ConfigError::Validation(
            "sites file must define at least one site".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for site in &sites_file.sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(site.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate site name: '{}'",
                site.name
            )));
        }

        let s = &site.selectors;
        for (role, value) in [
            ("title", &s.title),
            ("cost_price", &s.cost_price),
            ("main_image", &s.main_image),
            ("canonical_link", &s.canonical_link),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "site '{}' has an empty '{role}' selector",
                    site.name
                )));
            }
        }

        if s.variant_group.is_some() && s.variant_item.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' defines variant_group but no variant_item selector",
                site.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "selectors_test.rs"]
mod tests;
