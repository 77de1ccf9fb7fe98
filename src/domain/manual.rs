//! User-supplied price overrides for a single recomputation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entities::{Item, ItemId, ProfitPolicy};
use super::evaluation::crafting_profit;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManualPriceOverride {
    pub item_price: f64,
    pub resources: HashMap<ItemId, f64>,
    pub return_rate: f64,
}

impl ManualPriceOverride {
    /// Seeds an override from the item's resolved prices and the policy they were evaluated
    /// with. Unknown prices are shown as 0.
    pub fn from_item(item: &Item, policy: &ProfitPolicy) -> Self {
        Self {
            item_price: item.price.unwrap_or(0.0),
            resources: item
                .resources
                .iter()
                .map(|res| (res.unique_name.clone(), res.price.unwrap_or(0.0)))
                .collect(),
            return_rate: policy.return_rate,
        }
    }

    pub fn set_item_price(&mut self, raw: &str) {
        self.item_price = sanitize_price(raw);
    }

    pub fn set_resource_price(&mut self, unique_name: &str, raw: &str) {
        self.resources.insert(unique_name.to_string(), sanitize_price(raw));
    }

    /// Accepts a percentage (`24.8` → 0.248). Empty input means 0, junk keeps the current rate.
    pub fn set_return_rate_percent(&mut self, raw: &str) {
        if let Some(rate) = parse_return_rate_percent(raw) {
            self.return_rate = rate;
        }
    }

    /// Returns a copy of `item` carrying the override prices. Resources missing from the
    /// override keep their resolved price.
    pub fn apply(&self, item: &Item) -> Item {
        let mut modified = item.clone().with_price(self.item_price);
        for resource in &mut modified.resources {
            if let Some(price) = self.resources.get(&resource.unique_name) {
                resource.price = Some(*price);
            }
        }
        modified
    }

    /// Recomputes profit with the override in place of resolved market data.
    pub fn recompute(&self, item: &Item, policy: &ProfitPolicy) -> Item {
        let mut modified = self.apply(item);
        let policy = policy.clone().with_return_rate(self.return_rate);
        modified.crafting_profit = crafting_profit(&modified, &policy);
        modified
    }
}

/// Non-numeric, negative or non-finite input becomes 0.
pub fn sanitize_price(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

pub fn parse_return_rate_percent(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    let percentage = trimmed.parse::<f64>().ok().filter(|value| !value.is_nan())?;
    Some((percentage / 100.0).clamp(0.0, 1.0))
}
