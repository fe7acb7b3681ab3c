//! Scripted in-memory product page.
//!
//! `FakePage` re-renders its option groups after every click the way a real
//! storefront does: the size group depends on the selected color, the main
//! image and price follow the color, and items can vanish or refuse clicks.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use pdpx_core::{OptionRoles, PricingConfig, ScrapeTarget, SiteConfig, SiteSelectors, SitesFile};
use pdpx_scraper::{NodeRef, PageAccessor, PageError, ScrapeSettings};

pub const TRAIL_RUNNER_URL: &str = "https://shop.example.com/p/trail-runner-2";

const GROUP: &str = ".opt-group";
const ITEM: &str = ".opt";
const PLACEHOLDER: &str = "data:image/gif;base64,R0lGODlhAQABAAAAACw=";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Navigate(String),
    Discover,
    Click { label: String, forced: bool },
    OpenDescription,
}

#[derive(Debug, Clone)]
pub struct Size {
    pub label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub struct Color {
    pub label: String,
    pub image: String,
    pub price: Option<String>,
    pub sizes: Vec<Size>,
    pub disabled: bool,
    /// Gone from the page once any option has been clicked.
    pub vanishes: bool,
}

impl Color {
    pub fn new(label: &str, price: &str) -> Self {
        Self {
            label: label.to_owned(),
            image: format!("/images/{}.jpg", label.to_lowercase()),
            price: Some(price.to_owned()),
            sizes: Vec::new(),
            disabled: false,
            vanishes: false,
        }
    }

    pub fn sizes(mut self, labels: &[&str]) -> Self {
        self.sizes = labels
            .iter()
            .map(|l| Size {
                label: (*l).to_owned(),
                disabled: false,
            })
            .collect();
        self
    }

    pub fn sold_out_size(mut self, label: &str) -> Self {
        self.sizes.push(Size {
            label: label.to_owned(),
            disabled: true,
        });
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_owned();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn vanishing(mut self) -> Self {
        self.vanishes = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Product {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub description_behind_tab: bool,
    pub crumbs: Vec<String>,
    pub canonical: Option<String>,
    pub hero_image: String,
    pub base_price: Option<String>,
    /// Legend of the first option group.
    pub primary_label: &'static str,
    pub colors: Vec<Color>,
    pub preselected: Option<usize>,
}

impl Product {
    /// Black (pre-selected) in sizes 7 and 8, White in size 7 only.
    pub fn trail_runner() -> Self {
        Self {
            title: Some("Trail Runner 2".to_owned()),
            brand: Some("Acme".to_owned()),
            description: Some("<p>Grippy outsole.</p>".to_owned()),
            description_behind_tab: false,
            crumbs: ["Home", "Men", "Shoes", "Trail Runner 2"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            canonical: Some("/p/trail-runner-2".to_owned()),
            hero_image: "/images/hero.jpg".to_owned(),
            base_price: Some("$129.99".to_owned()),
            primary_label: "Color",
            colors: vec![
                Color::new("Black", "$129.99").sizes(&["7", "8"]),
                Color::new("White", "$119.99").sizes(&["7"]),
            ],
            preselected: Some(0),
        }
    }

    pub fn without_options() -> Self {
        Self {
            colors: Vec::new(),
            preselected: None,
            ..Self::trail_runner()
        }
    }

    pub fn with_colors(colors: Vec<Color>) -> Self {
        Self {
            colors,
            preselected: None,
            ..Self::trail_runner()
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    Color(usize),
    Size(String),
}

#[derive(Debug, Clone)]
struct RenderedItem {
    label: String,
    selected: bool,
    disabled: bool,
    target: Target,
}

#[derive(Debug, Clone)]
struct RenderedGroup {
    label: &'static str,
    items: Vec<RenderedItem>,
}

pub struct FakePage {
    products: HashMap<String, Product>,
    product: Option<Product>,
    url: String,
    selected_color: Option<usize>,
    selected_size: Option<String>,
    description_open: bool,
    clicked_any: bool,
    pub nav_failures_remaining: u32,
    /// Labels whose direct click is intercepted by an overlay.
    pub intercepted: Vec<String>,
    /// Labels that refuse every kind of click.
    pub dead: Vec<String>,
    /// Labels shown as sold out once any option has been clicked.
    pub sold_out_after_click: Vec<String>,
    pub events: Vec<Event>,
}

impl FakePage {
    pub fn new() -> Self {
        Self {
            products: HashMap::new(),
            product: None,
            url: "about:blank".to_owned(),
            selected_color: None,
            selected_size: None,
            description_open: false,
            clicked_any: false,
            nav_failures_remaining: 0,
            intercepted: Vec::new(),
            dead: Vec::new(),
            sold_out_after_click: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn serving(url: &str, product: Product) -> Self {
        Self::new().with_product(url, product)
    }

    pub fn with_product(mut self, url: &str, product: Product) -> Self {
        self.products.insert(url.to_owned(), product);
        self
    }

    pub fn discoveries(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Discover).count()
    }

    /// Labels of successful option clicks, in order.
    pub fn clicked_labels(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Click { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    fn visible_colors(&self) -> Vec<(usize, &Color)> {
        self.product
            .as_ref()
            .map(|p| {
                p.colors
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !(c.vanishes && self.clicked_any))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn active_color(&self) -> Option<&Color> {
        let product = self.product.as_ref()?;
        product.colors.get(self.selected_color?)
    }

    fn sold_out_now(&self, label: &str) -> bool {
        self.clicked_any && self.sold_out_after_click.iter().any(|l| l == label)
    }

    fn render(&self) -> Vec<RenderedGroup> {
        let colors = self.visible_colors();
        let Some(product) = self.product.as_ref().filter(|_| !colors.is_empty()) else {
            return Vec::new();
        };
        let mut groups = vec![RenderedGroup {
            label: product.primary_label,
            items: colors
                .iter()
                .map(|(index, color)| RenderedItem {
                    label: color.label.clone(),
                    selected: self.selected_color == Some(*index),
                    disabled: color.disabled || self.sold_out_now(&color.label),
                    target: Target::Color(*index),
                })
                .collect(),
        }];

        let size_source = self.active_color().or_else(|| colors.first().map(|(_, c)| *c));
        if let Some(color) = size_source {
            if !color.sizes.is_empty() {
                groups.push(RenderedGroup {
                    label: "Size",
                    items: color
                        .sizes
                        .iter()
                        .map(|size| RenderedItem {
                            label: size.label.clone(),
                            selected: self.selected_size.as_deref() == Some(size.label.as_str()),
                            disabled: size.disabled || self.sold_out_now(&size.label),
                            target: Target::Size(size.label.clone()),
                        })
                        .collect(),
                });
            }
        }
        groups
    }

    fn item(&self, node: &NodeRef) -> Result<RenderedItem, PageError> {
        let not_found = || PageError::ElementNotFound {
            selector: node.selector().to_owned(),
            index: node.index(),
        };
        match node.path().as_slice() {
            [(GROUP, g), (ITEM, i)] => self
                .render()
                .get(*g)
                .and_then(|group| group.items.get(*i).cloned())
                .ok_or_else(not_found),
            _ => Err(not_found()),
        }
    }

    fn image(&self) -> String {
        match self.active_color() {
            Some(color) => color.image.clone(),
            None => self
                .product
                .as_ref()
                .map(|p| p.hero_image.clone())
                .unwrap_or_default(),
        }
    }

    fn price(&self) -> Option<String> {
        match self.active_color() {
            Some(color) => color.price.clone(),
            None => self.product.as_ref()?.base_price.clone(),
        }
    }

    fn description_visible(&self) -> bool {
        self.product.as_ref().is_some_and(|p| {
            p.description.is_some() && (!p.description_behind_tab || self.description_open)
        })
    }

    fn apply(&mut self, item: &RenderedItem) {
        self.clicked_any = true;
        match &item.target {
            Target::Color(index) => {
                self.selected_color = Some(*index);
                self.selected_size = None;
            }
            Target::Size(label) => self.selected_size = Some(label.clone()),
        }
    }

    fn missing(node: &NodeRef) -> PageError {
        PageError::ElementNotFound {
            selector: node.selector().to_owned(),
            index: node.index(),
        }
    }
}

impl PageAccessor for FakePage {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), PageError> {
        self.events.push(Event::Navigate(url.to_owned()));
        if self.nav_failures_remaining > 0 {
            self.nav_failures_remaining -= 1;
            return Err(PageError::Navigation("net::ERR_CONNECTION_RESET".to_owned()));
        }
        let Some(product) = self.products.get(url).cloned() else {
            return Err(PageError::Navigation(format!("HTTP 404 for {url}")));
        };
        self.selected_color = product.preselected;
        self.selected_size = None;
        self.description_open = false;
        self.clicked_any = false;
        self.product = Some(product);
        self.url = url.to_owned();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, PageError> {
        Ok(self.url.clone())
    }

    async fn count(&mut self, scope: Option<&NodeRef>, selector: &str) -> Result<usize, PageError> {
        let Some(product) = self.product.clone() else {
            return Ok(0);
        };
        let Some(scope) = scope else {
            let n = match selector {
                "h1.title" => usize::from(product.title.is_some()),
                ".brand" => usize::from(product.brand.is_some()),
                ".price-cost" => usize::from(self.price().is_some()),
                "img.main" => 1,
                ".desc" => usize::from(self.description_visible()),
                ".desc-tab" => usize::from(product.description_behind_tab),
                ".crumbs a" => product.crumbs.len(),
                "link[rel='canonical']" => usize::from(product.canonical.is_some()),
                GROUP => {
                    self.events.push(Event::Discover);
                    self.render().len()
                }
                _ => 0,
            };
            return Ok(n);
        };
        match (scope.path().as_slice(), selector) {
            ([(GROUP, g)], ITEM) => Ok(self.render().get(*g).map_or(0, |g| g.items.len())),
            ([(GROUP, g)], "legend") => Ok(usize::from(self.render().len() > *g)),
            _ => Ok(0),
        }
    }

    async fn text(&mut self, node: &NodeRef) -> Result<String, PageError> {
        let product = self.product.clone().ok_or_else(|| Self::missing(node))?;
        let text = match node.path().as_slice() {
            [("h1.title", 0)] => product.title,
            [(".brand", 0)] => product.brand,
            [(".price-cost", 0)] => self.price(),
            [(".crumbs a", i)] => product.crumbs.get(*i).cloned(),
            [(GROUP, g), ("legend", 0)] => self.render().get(*g).map(|g| format!("{}:", g.label)),
            [(GROUP, _), (ITEM, _)] => Some(format!("  {}\n", self.item(node)?.label)),
            _ => None,
        };
        text.ok_or_else(|| Self::missing(node))
    }

    async fn inner_html(&mut self, node: &NodeRef) -> Result<String, PageError> {
        match node.path().as_slice() {
            [(".desc", 0)] if self.description_visible() => Ok(self
                .product
                .as_ref()
                .and_then(|p| p.description.clone())
                .unwrap_or_default()),
            _ => Err(Self::missing(node)),
        }
    }

    async fn attribute(&mut self, node: &NodeRef, name: &str) -> Result<Option<String>, PageError> {
        match node.path().as_slice() {
            [("img.main", 0)] => Ok(match name {
                "data-src" => Some(self.image()),
                "src" => Some(PLACEHOLDER.to_owned()),
                _ => None,
            }),
            [("link[rel='canonical']", 0)] if name == "href" => {
                Ok(self.product.as_ref().and_then(|p| p.canonical.clone()))
            }
            [(GROUP, _), (ITEM, _)] => {
                let item = self.item(node)?;
                Ok((name == "class").then(|| {
                    let mut class = "opt".to_owned();
                    if item.selected {
                        class.push_str(" selected");
                    }
                    if item.disabled {
                        class.push_str(" sold-out");
                    }
                    class
                }))
            }
            [(GROUP, _)] => Ok(None),
            _ => Err(Self::missing(node)),
        }
    }

    async fn is_checked(&mut self, node: &NodeRef) -> Result<bool, PageError> {
        Ok(self.item(node)?.selected)
    }

    async fn scroll_into_view(&mut self, node: &NodeRef) -> Result<(), PageError> {
        self.item(node).map(|_| ())
    }

    async fn click(&mut self, node: &NodeRef, _timeout: Duration) -> Result<(), PageError> {
        if let [(".desc-tab", 0)] = node.path().as_slice() {
            self.description_open = true;
            self.events.push(Event::OpenDescription);
            return Ok(());
        }
        let item = self.item(node)?;
        if self.intercepted.contains(&item.label) || self.dead.contains(&item.label) {
            return Err(PageError::Intercepted {
                selector: node.to_string(),
                reason: "<div class=\"cookie-banner\"> would receive the click".to_owned(),
            });
        }
        self.apply(&item);
        self.events.push(Event::Click {
            label: item.label,
            forced: false,
        });
        Ok(())
    }

    async fn force_click(&mut self, node: &NodeRef) -> Result<(), PageError> {
        let item = self.item(node)?;
        if self.dead.contains(&item.label) {
            return Err(PageError::Driver("element is not interactable".to_owned()));
        }
        self.apply(&item);
        self.events.push(Event::Click {
            label: item.label,
            forced: true,
        });
        Ok(())
    }

    async fn wait_for_network_idle(&mut self, _timeout: Duration) -> Result<(), PageError> {
        Ok(())
    }
}

pub fn selectors() -> SiteSelectors {
    SiteSelectors {
        title: "h1.title".to_owned(),
        brand: Some(".brand".to_owned()),
        cost_price: ".price-cost".to_owned(),
        main_image: "img.main".to_owned(),
        description: Some(".desc".to_owned()),
        description_trigger: Some(".desc-tab".to_owned()),
        breadcrumbs: Some(".crumbs a".to_owned()),
        variant_group: Some(GROUP.to_owned()),
        group_label: Some("legend".to_owned()),
        variant_item: ITEM.to_owned(),
        item_input: None,
        ..SiteSelectors::default()
    }
}

pub fn site() -> SiteConfig {
    SiteConfig {
        name: "demo-shoes".to_owned(),
        hosts: vec!["shop.example.com".to_owned()],
        selectors: selectors(),
        option_roles: OptionRoles::default(),
    }
}

pub fn sites() -> SitesFile {
    SitesFile {
        sites: vec![site()],
    }
}

pub fn target(url: &str) -> ScrapeTarget {
    ScrapeTarget {
        url: url.to_owned(),
        extra_tags: vec!["spring-drop".to_owned()],
    }
}

/// Short timings so that waits in tests finish in milliseconds.
pub fn settings() -> ScrapeSettings {
    ScrapeSettings {
        nav_timeout: Duration::from_secs(1),
        nav_max_retries: 3,
        nav_backoff_base_ms: 0,
        identity_timeout: Duration::from_millis(50),
        op_timeout: Duration::from_secs(1),
        click_timeout: Duration::from_millis(100),
        image_change_timeout: Duration::from_millis(100),
        secondary_cooldown: Duration::ZERO,
        residual_pause: Duration::ZERO,
        network_idle_timeout: Duration::from_millis(100),
        poll_interval: Duration::from_millis(5),
        pricing: PricingConfig::default(),
        vendor: None,
        product_type: Some("Shoes".to_owned()),
    }
}
