//! Variant-aware product page extraction.
//!
//! [`scrape_product`] visits one page through a [`PageAccessor`], walks every
//! live option combination and returns import rows; [`run_batch`] does that
//! for a list of URLs.

pub mod assemble;
pub mod batch;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extract;
pub mod invariants;
pub mod outcome;
pub mod page;
pub mod parse;
mod parse_helpers;
mod retry;
pub mod select;
pub mod settings;
pub mod traverse;
pub mod types;

pub use assemble::assemble;
pub use batch::{run_batch, site_for, FailedUrl, ScrapeBatch};
pub use discovery::{classify_item, discover_groups, ItemSignals};
pub use engine::{navigate_with_retry, scrape_product, ProductScrape};
pub use error::{PageError, ScraperError};
pub use outcome::{Extracted, FieldIssue, Outcome, VisitReport};
pub use page::{Bounded, NodeRef, PageAccessor};
pub use select::{select, GroupKind};
pub use settings::ScrapeSettings;
pub use traverse::Traversal;
pub use types::{
    Assignment, Combination, CombinationSnapshot, ItemState, ProductInvariants, Settled,
    Settlement, VariantGroup, VariantItem,
};
