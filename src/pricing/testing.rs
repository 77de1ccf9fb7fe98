//! In-memory price source for resolver and enrichment tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{HistoryPoint, ItemId, PriceQuote, Server};
use crate::infra::albion::{HistoryQuery, PriceSource, PriceSourceError};

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    pub server: Server,
    pub location: String,
    pub quality: Option<u8>,
    pub item_ids: Vec<ItemId>,
}

/// Answers from a fixed set of quotes, honouring location and quality filters.
pub struct StaticSource {
    quotes: Vec<PriceQuote>,
    failing_location: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StaticSource {
    pub fn new(quotes: Vec<PriceQuote>) -> Self {
        Self {
            quotes,
            failing_location: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at(mut self, location: &str) -> Self {
        self.failing_location = Some(location.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for StaticSource {
    async fn fetch_history(
        &self,
        query: &HistoryQuery<'_>,
    ) -> Result<Vec<PriceQuote>, PriceSourceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            server: query.server,
            location: query.location.to_string(),
            quality: query.quality,
            item_ids: query.item_ids.to_vec(),
        });

        if self.failing_location.as_deref() == Some(query.location) {
            return Err(PriceSourceError::Api(format!(
                "{} unavailable",
                query.location
            )));
        }

        Ok(self
            .quotes
            .iter()
            .filter(|quote| quote.location.as_deref() == Some(query.location))
            .filter(|quote| query.quality.map_or(true, |q| quote.quality == q))
            .filter(|quote| query.item_ids.contains(&quote.item_id))
            .cloned()
            .collect())
    }
}

pub fn quote(item_id: &str, location: &str, quality: u8, prices: &[f64]) -> PriceQuote {
    PriceQuote {
        item_id: item_id.to_string(),
        location: Some(location.to_string()),
        quality,
        data: prices.iter().copied().map(HistoryPoint::new).collect(),
    }
}
