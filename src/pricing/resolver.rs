//! Resolves unit prices for sale items and crafting resources.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{
    evaluation::DEFAULT_HISTORY_WINDOW, representative_price, ItemId, PriceQuote, Server,
    RESOURCE_QUALITY_PREFERENCE, SALE_QUALITY,
};
use crate::infra::albion::{
    fetch_history_batched, HistoryQuery, PriceSource, PriceSourceError, DEFAULT_TIME_SCALE,
};

/// Where and how prices are looked up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    /// Location crafted items are sold at.
    pub sell_location: String,
    /// Location raw materials are bought at.
    pub resource_location: String,
    pub time_scale: u32,
    pub sale_quality: u8,
    pub history_window: usize,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            sell_location: "Blackmarket".to_string(),
            resource_location: "Fortsterling".to_string(),
            time_scale: DEFAULT_TIME_SCALE,
            sale_quality: SALE_QUALITY,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

/// Flat identifier → unit price mapping for one resolution pass.
///
/// Every requested identifier has an entry; `None` marks a price the market could not supply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedPrices {
    prices: HashMap<ItemId, Option<f64>>,
}

impl ResolvedPrices {
    pub fn get(&self, unique_name: &str) -> Option<f64> {
        self.prices.get(unique_name).copied().flatten()
    }

    /// Number of requested identifiers, resolved or not.
    pub fn requested_count(&self) -> usize {
        self.prices.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.prices.values().filter(|price| price.is_some()).count()
    }

    /// A known price is never replaced by an unknown one.
    fn insert(&mut self, unique_name: ItemId, price: Option<f64>) {
        self.prices
            .entry(unique_name)
            .and_modify(|existing| {
                if price.is_some() {
                    *existing = price;
                }
            })
            .or_insert(price);
    }
}

pub struct PriceResolver<S> {
    source: S,
    settings: MarketSettings,
}

impl<S: PriceSource> PriceResolver<S> {
    pub fn new(source: S, settings: MarketSettings) -> Self {
        Self { source, settings }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches both populations concurrently and builds the combined price map.
    /// Any failed request aborts the pass.
    pub async fn resolve(
        &self,
        server: Server,
        sale_ids: &[ItemId],
        resource_ids: &[ItemId],
    ) -> Result<ResolvedPrices, PriceSourceError> {
        let sale_query = HistoryQuery {
            server,
            item_ids: sale_ids,
            location: &self.settings.sell_location,
            quality: Some(self.settings.sale_quality),
            time_scale: self.settings.time_scale,
        };
        let resource_query = HistoryQuery {
            server,
            item_ids: resource_ids,
            location: &self.settings.resource_location,
            quality: None,
            time_scale: self.settings.time_scale,
        };

        info!(
            %server,
            sale_items = sale_ids.len(),
            resources = resource_ids.len(),
            "resolving market prices"
        );

        let (sale_quotes, resource_quotes) = tokio::try_join!(
            fetch_history_batched(&self.source, &sale_query),
            fetch_history_batched(&self.source, &resource_query),
        )?;

        let mut prices = ResolvedPrices::default();
        let sale_prices = self.sale_prices(&sale_quotes);
        for id in sale_ids {
            prices.insert(id.clone(), sale_prices.get(id.as_str()).copied());
        }

        let resource_prices = self.resource_prices(&resource_quotes);
        for id in resource_ids {
            let price = resource_prices.get(id.as_str()).copied();
            if price.is_none() {
                warn!(resource = %id, "no quality 1 or 2 price history for resource");
            }
            prices.insert(id.clone(), price);
        }

        info!(
            resolved = prices.resolved_count(),
            requested = prices.requested_count(),
            "market prices resolved"
        );
        Ok(prices)
    }

    fn sale_prices<'q>(&self, quotes: &'q [PriceQuote]) -> HashMap<&'q str, f64> {
        let mut prices = HashMap::new();
        for quote in quotes {
            if prices.contains_key(quote.item_id.as_str()) {
                continue;
            }
            if let Some(price) = representative_price(&quote.data, self.settings.history_window) {
                prices.insert(quote.item_id.as_str(), price);
            }
        }
        prices
    }

    fn resource_prices<'q>(&self, quotes: &'q [PriceQuote]) -> HashMap<&'q str, f64> {
        let mut by_item: HashMap<&str, Vec<&PriceQuote>> = HashMap::new();
        for quote in quotes {
            by_item.entry(quote.item_id.as_str()).or_default().push(quote);
        }

        by_item
            .into_iter()
            .filter_map(|(id, quotes)| {
                preferred_quality_price(&quotes, self.settings.history_window)
                    .map(|price| (id, price))
            })
            .collect()
    }
}

/// Picks the lowest preferred quality with a non-empty series.
fn preferred_quality_price(quotes: &[&PriceQuote], window: usize) -> Option<f64> {
    RESOURCE_QUALITY_PREFERENCE.iter().find_map(|quality| {
        quotes
            .iter()
            .filter(|quote| quote.quality == *quality)
            .find_map(|quote| representative_price(&quote.data, window))
    })
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use super::*;
    use crate::pricing::testing::{quote, StaticSource};

    fn ids(raw: &[&str]) -> Vec<ItemId> {
        raw.iter().map(|id| id.to_string()).collect()
    }

    #[tokio::test]
    async fn resolves_sale_items_at_fixed_quality() {
        let source = StaticSource::new(vec![
            quote("T4_BAG", "Blackmarket", 2, &[3000.0, 3100.0, 3200.0, 3300.0]),
            quote("T4_BAG", "Blackmarket", 3, &[9999.0]),
        ]);
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let prices = resolver
            .resolve(Server::Europe, &ids(&["T4_BAG"]), &[])
            .await
            .unwrap();

        assert_eq!(prices.get("T4_BAG"), Some(3200.0));
        let calls = resolver.source.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].location, "Blackmarket");
        assert_eq!(calls[0].quality, Some(2));
    }

    #[tokio::test]
    async fn sale_item_without_history_is_unresolved() {
        let source = StaticSource::new(vec![quote("T4_BAG", "Blackmarket", 2, &[])]);
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let prices = resolver
            .resolve(Server::Europe, &ids(&["T4_BAG", "T5_BAG"]), &[])
            .await
            .unwrap();

        assert_eq!(prices.requested_count(), 2);
        assert!(prices.prices.contains_key("T4_BAG"));
        assert_eq!(prices.get("T4_BAG"), None);
        assert_eq!(prices.get("T5_BAG"), None);
        assert_eq!(prices.resolved_count(), 0);
    }

    #[tokio::test]
    async fn resource_falls_back_to_quality_two() {
        let source = StaticSource::new(vec![
            quote("T4_PLANKS", "Fortsterling", 1, &[]),
            quote("T4_PLANKS", "Fortsterling", 2, &[80.0, 90.0, 100.0]),
        ]);
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let prices = resolver
            .resolve(Server::Europe, &[], &ids(&["T4_PLANKS"]))
            .await
            .unwrap();

        assert_eq!(prices.get("T4_PLANKS"), Some(90.0));
        assert_eq!(resolver.source.calls()[0].quality, None);
    }

    #[tokio::test]
    async fn resource_prefers_quality_one() {
        let source = StaticSource::new(vec![
            quote("T4_CLOTH", "Fortsterling", 2, &[500.0]),
            quote("T4_CLOTH", "Fortsterling", 1, &[120.0, 130.0]),
        ]);
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let prices = resolver
            .resolve(Server::Europe, &[], &ids(&["T4_CLOTH"]))
            .await
            .unwrap();

        assert_eq!(prices.get("T4_CLOTH"), Some(125.0));
    }

    #[tokio::test]
    async fn resource_only_at_higher_quality_is_unresolved() {
        let source = StaticSource::new(vec![quote("T4_HIDE", "Fortsterling", 3, &[75.0])]);
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let prices = resolver
            .resolve(Server::Europe, &[], &ids(&["T4_HIDE"]))
            .await
            .unwrap();

        assert_eq!(prices.get("T4_HIDE"), None);
        assert_eq!(prices.requested_count(), 1);
    }

    #[tokio::test]
    async fn known_price_survives_overlapping_identifier() {
        let source = StaticSource::new(vec![quote("T4_BAG", "Blackmarket", 2, &[1000.0])]);
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let prices = resolver
            .resolve(Server::Europe, &ids(&["T4_BAG"]), &ids(&["T4_BAG"]))
            .await
            .unwrap();

        assert_eq!(prices.requested_count(), 1);
        assert_eq!(prices.get("T4_BAG"), Some(1000.0));
    }

    #[tokio::test]
    async fn failure_in_either_pipeline_aborts() {
        let source = StaticSource::new(vec![]).failing_at("Fortsterling");
        let resolver = PriceResolver::new(source, MarketSettings::default());

        let result = resolver
            .resolve(Server::Europe, &ids(&["T4_BAG"]), &ids(&["T4_PLANKS"]))
            .await;

        assert!(result.is_err());
    }

    struct RendezvousSource {
        barrier: Arc<Barrier>,
    }

    #[async_trait]
    impl PriceSource for RendezvousSource {
        async fn fetch_history(
            &self,
            _query: &HistoryQuery<'_>,
        ) -> Result<Vec<PriceQuote>, PriceSourceError> {
            self.barrier.wait().await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn pipelines_run_concurrently() {
        // Each fetch blocks until the other pipeline's fetch has started.
        let source = RendezvousSource {
            barrier: Arc::new(Barrier::new(2)),
        };
        let resolver = PriceResolver::new(source, MarketSettings::default());
        let sale_ids = ids(&["T4_BAG"]);
        let resource_ids = ids(&["T4_PLANKS"]);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            resolver.resolve(Server::East, &sale_ids, &resource_ids),
        )
        .await;

        assert!(result.is_ok(), "sale and resource fetches did not overlap");
    }
}
