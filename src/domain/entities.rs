use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;

/// Identifier for catalog items and resources (`UniqueName` in the game data).
pub type ItemId = String;

/// Quality tier quoted for crafted items sold on the black market.
pub const SALE_QUALITY: u8 = 2;

/// Resource qualities in order of preference. Lower quality is the cheaper crafting default.
pub const RESOURCE_QUALITY_PREFERENCE: [u8; 2] = [1, 2];

/// Standard non-artifact resource return fraction.
pub const DEFAULT_RETURN_RATE: f64 = 0.248;

/// Flat tax deducted when selling on the open market.
pub const DEFAULT_MARKET_TAX_RATE: f64 = 0.10;

/// Regional game server whose economy is queried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Server {
    #[default]
    Europe,
    West,
    East,
}

impl Server {
    pub const ALL: [Server; 3] = [Server::Europe, Server::West, Server::East];

    /// Subdomain used by the price data API for this server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Server::Europe => "europe",
            Server::West => "west",
            Server::East => "east",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Server::Europe => "Europe",
            Server::West => "Americas",
            Server::East => "Asia",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown server `{0}` (expected europe, west or east)")]
pub struct UnknownServer(String);

impl FromStr for Server {
    type Err = UnknownServer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "europe" | "eu" => Ok(Server::Europe),
            "west" | "americas" | "us" => Ok(Server::West),
            "east" | "asia" => Ok(Server::East),
            _ => Err(UnknownServer(s.to_string())),
        }
    }
}

/// A craftable item from the static catalog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Item {
    pub unique_name: ItemId,
    pub name: String,
    pub slot_type: Option<String>,
    /// Enchantment level given explicitly by the catalog, if any.
    #[serde(skip)]
    pub enchantment_level: Option<u8>,
    pub resources: Vec<ResourceRequirement>,
    /// Resolved sale price. `None` until resolved, or when the market had no data.
    pub price: Option<f64>,
    pub crafting_profit: Option<CraftingProfit>,
}

impl Item {
    pub fn new(unique_name: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            name: name.into(),
            slot_type: None,
            enchantment_level: None,
            resources: Vec::new(),
            price: None,
            crafting_profit: None,
        }
    }

    pub fn with_slot_type(mut self, slot_type: impl Into<String>) -> Self {
        self.slot_type = Some(slot_type.into());
        self
    }

    pub fn with_resource(mut self, resource: ResourceRequirement) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Tier parsed from the `T<n>` prefix of the identifier (e.g. `T4_ARMOR_PLATE_SET1` → 4).
    pub fn tier(&self) -> Option<u8> {
        parse_tier(&self.unique_name)
    }

    /// Enchantment level: the catalog value when present, else the `@<n>` suffix, else 0.
    pub fn enchantment(&self) -> u8 {
        self.enchantment_level
            .or_else(|| parse_enchantment(&self.unique_name))
            .unwrap_or(0)
    }

    /// Net profit if craft economics are available.
    pub fn profit(&self) -> Option<i64> {
        self.crafting_profit.as_ref().and_then(CraftingProfit::profit)
    }
}

/// One raw material line of an item's crafting recipe.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceRequirement {
    pub unique_name: ItemId,
    pub count: u32,
    /// Artifact-class resources are never returned by the resource return mechanic.
    pub is_artifact: bool,
    pub price: Option<f64>,
}

impl ResourceRequirement {
    /// Missing or zero counts are normalised to 1.
    pub fn new(unique_name: impl Into<ItemId>, count: Option<u32>) -> Self {
        Self {
            unique_name: unique_name.into(),
            count: count.unwrap_or(1).max(1),
            is_artifact: false,
            price: None,
        }
    }

    pub fn artifact(mut self) -> Self {
        self.is_artifact = true;
        self
    }

    #[cfg(test)]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

/// One observation series returned by the price history API.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceQuote {
    pub item_id: ItemId,
    pub location: Option<String>,
    pub quality: u8,
    pub data: Vec<HistoryPoint>,
}

/// Average price for one time bucket.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPoint {
    pub avg_price: f64,
    pub item_count: Option<u64>,
    pub timestamp: Option<PrimitiveDateTime>,
}

#[cfg(test)]
impl HistoryPoint {
    pub fn new(avg_price: f64) -> Self {
        Self {
            avg_price,
            item_count: None,
            timestamp: None,
        }
    }
}

/// Outcome of the profit calculation for an item with a sellable price.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CraftingProfit {
    pub item_id: ItemId,
    pub item_price: f64,
    /// `None` when any resource lacked a usable price.
    pub economics: Option<CraftEconomics>,
}

impl CraftingProfit {
    pub fn profit(&self) -> Option<i64> {
        self.economics.as_ref().map(|e| e.profit)
    }
}

/// Rounded craft economics. Always populated together.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CraftEconomics {
    pub total_craft_cost: i64,
    pub return_value: i64,
    pub market_tax: i64,
    pub profit: i64,
}

/// Economic model parameters for the profit calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitPolicy {
    pub return_rate: f64,
    /// Set to 0 to reproduce the tax-free profit variant.
    pub market_tax_rate: f64,
}

impl ProfitPolicy {
    pub fn with_return_rate(mut self, return_rate: f64) -> Self {
        self.return_rate = return_rate.clamp(0.0, 1.0);
        self
    }
}

impl Default for ProfitPolicy {
    fn default() -> Self {
        Self {
            return_rate: DEFAULT_RETURN_RATE,
            market_tax_rate: DEFAULT_MARKET_TAX_RATE,
        }
    }
}

pub fn parse_tier(unique_name: &str) -> Option<u8> {
    let rest = unique_name.strip_prefix('T')?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

pub fn parse_enchantment(unique_name: &str) -> Option<u8> {
    let (_, suffix) = unique_name.rsplit_once('@')?;
    let digits: String = suffix.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}
