use serde::{Deserialize, Serialize};

/// One line of the flattened catalog-import file.
///
/// Products with variants span several rows sharing a `handle`. Only the
/// first row of a product carries the product-level columns (title, body,
/// vendor, type, tags, published, image, original URL); later rows leave them
/// empty and carry only their own variant columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    #[serde(rename = "Handle")]
    pub handle: String,
    #[serde(rename = "Title")]
    pub title: String,
    /// Description HTML as rendered on the product page.
    #[serde(rename = "Body (HTML)")]
    pub body_html: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Type")]
    pub product_type: String,
    /// Comma-separated.
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Published")]
    pub published: String,
    #[serde(rename = "Option1 Name")]
    pub option1_name: String,
    #[serde(rename = "Option1 Value")]
    pub option1_value: String,
    #[serde(rename = "Option2 Name")]
    pub option2_name: String,
    #[serde(rename = "Option2 Value")]
    pub option2_value: String,
    #[serde(rename = "Variant SKU")]
    pub sku: String,
    #[serde(rename = "Variant Inventory Policy")]
    pub inventory_policy: String,
    #[serde(rename = "Variant Fulfillment Service")]
    pub fulfillment_service: String,
    /// Decimal string with two places, e.g. `"168.99"`.
    #[serde(rename = "Variant Price")]
    pub variant_price: String,
    #[serde(rename = "Variant Compare At Price")]
    pub compare_at_price: String,
    #[serde(rename = "Variant Requires Shipping")]
    pub requires_shipping: String,
    #[serde(rename = "Variant Taxable")]
    pub taxable: String,
    #[serde(rename = "Image Src")]
    pub image_src: String,
    #[serde(rename = "Image Position")]
    pub image_position: String,
    #[serde(rename = "Variant Image")]
    pub variant_image: String,
    #[serde(rename = "Cost per item")]
    pub cost_per_item: String,
    #[serde(rename = "Original URL")]
    pub original_url: String,
}

impl OutputRow {
    /// Returns `true` when this row carries the product-level columns.
    #[must_use]
    pub fn is_parent(&self) -> bool {
        !self.title.is_empty()
    }
}
