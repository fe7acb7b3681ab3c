//! Markup rules applied to the cost read from a product page.
//!
//! The storefront's displayed price is treated as our cost per item. The
//! catalog price is that cost times a fixed markup. How the "compare at"
//! price is filled is a business decision that differs between catalogs, so
//! it is configured rather than computed.

use rust_decimal::Decimal;

/// How the `Variant Compare At Price` column is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareAtPolicy {
    /// Column left blank.
    #[default]
    None,
    /// The price the storefront displayed (its "was" price when one is shown,
    /// otherwise the cost).
    DisplayedPrice,
    /// `variant_price * multiplier`, rounded to cents.
    Multiplier(Decimal),
}

impl std::fmt::Display for CompareAtPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareAtPolicy::None => write!(f, "none"),
            CompareAtPolicy::DisplayedPrice => write!(f, "displayed"),
            CompareAtPolicy::Multiplier(m) => write!(f, "multiplier({m})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingConfig {
    /// Markup applied to the cost per item to produce the variant price.
    pub multiplier: Decimal,
    pub compare_at: CompareAtPolicy,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            multiplier: Decimal::new(13, 1),
            compare_at: CompareAtPolicy::None,
        }
    }
}
