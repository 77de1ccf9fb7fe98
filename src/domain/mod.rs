//! Domain logic for item pricing and craft profit lives here.

pub mod entities;
pub mod evaluation;
pub mod filter;
pub mod manual;

pub use entities::{
    CraftEconomics, HistoryPoint, Item, ItemId, PriceQuote, ProfitPolicy, ResourceRequirement,
    Server, RESOURCE_QUALITY_PREFERENCE, SALE_QUALITY,
};
pub use evaluation::{crafting_profit, representative_price, sort_by_profit};
pub use filter::ItemFilter;
pub use manual::ManualPriceOverride;
