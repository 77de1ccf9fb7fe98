//! Prices a batch of catalog items and ranks them by craft profit.

use std::collections::HashSet;

use tracing::info;

use crate::domain::{crafting_profit, sort_by_profit, Item, ItemId, ProfitPolicy, Server};
use crate::infra::albion::{PriceSource, PriceSourceError};

use super::resolver::{PriceResolver, ResolvedPrices};

/// Sale and resource identifiers of a batch, each deduplicated in first-seen order.
pub fn collect_identifiers(items: &[Item]) -> (Vec<ItemId>, Vec<ItemId>) {
    let mut seen_items = HashSet::new();
    let mut seen_resources = HashSet::new();
    let mut sale_ids = Vec::new();
    let mut resource_ids = Vec::new();

    for item in items {
        if seen_items.insert(item.unique_name.as_str()) {
            sale_ids.push(item.unique_name.clone());
        }
        for resource in &item.resources {
            if seen_resources.insert(resource.unique_name.as_str()) {
                resource_ids.push(resource.unique_name.clone());
            }
        }
    }

    (sale_ids, resource_ids)
}

/// Copy of `item` carrying the resolved prices. Unknown prices stay `None`.
pub fn attach_prices(item: &Item, prices: &ResolvedPrices) -> Item {
    let mut priced = item.clone();
    priced.price = prices.get(&item.unique_name);
    for resource in &mut priced.resources {
        resource.price = prices.get(&resource.unique_name);
    }
    priced.crafting_profit = None;
    priced
}

/// Resolves prices once for the whole batch, computes each item's profit and returns
/// the items sorted by profit, highest first, with unavailable profits last.
pub async fn enrich_items<S>(
    resolver: &PriceResolver<S>,
    server: Server,
    items: &[Item],
    policy: &ProfitPolicy,
) -> Result<Vec<Item>, PriceSourceError>
where
    S: PriceSource,
{
    let (sale_ids, resource_ids) = collect_identifiers(items);
    let prices = resolver.resolve(server, &sale_ids, &resource_ids).await?;

    let mut enriched: Vec<Item> = items
        .iter()
        .map(|item| {
            let mut priced = attach_prices(item, &prices);
            priced.crafting_profit = crafting_profit(&priced, policy);
            priced
        })
        .collect();

    sort_by_profit(&mut enriched);

    let profitable = enriched
        .iter()
        .filter(|item| item.profit().is_some_and(|profit| profit > 0))
        .count();
    info!(items = enriched.len(), profitable, "enrichment pass complete");

    Ok(enriched)
}
