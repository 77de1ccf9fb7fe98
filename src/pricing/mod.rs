//! Market price resolution and batch enrichment.

pub mod enrichment;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use enrichment::enrich_items;
pub use resolver::{MarketSettings, PriceResolver};
