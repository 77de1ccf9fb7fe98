//! Narrowing the catalog by slot, tier, enchantment and name.

use std::collections::BTreeSet;

use super::entities::Item;

/// Filter options for catalog items. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub slot_type: Option<String>,
    /// Case-insensitive substring of the display name.
    pub name: Option<String>,
    pub tier: Option<u8>,
    pub enchantment: Option<u8>,
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(slot) = &self.slot_type {
            if item.slot_type.as_deref() != Some(slot.as_str()) {
                return false;
            }
        }

        if let Some(name) = &self.name {
            let needle = name.to_lowercase();
            if !item.name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(tier) = self.tier {
            if item.tier() != Some(tier) {
                return false;
            }
        }

        if let Some(enchantment) = self.enchantment {
            if item.enchantment() != enchantment {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        items.iter().filter(|item| self.matches(item)).collect()
    }

    pub fn apply_owned(&self, items: &[Item]) -> Vec<Item> {
        self.apply(items).into_iter().cloned().collect()
    }
}

/// Parses tier input such as `T4` or `4`.
pub fn parse_tier_input(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('T')
        .or_else(|| trimmed.strip_prefix('t'))
        .unwrap_or(trimmed);
    digits.parse().ok()
}

pub fn slot_types(items: &[Item]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.slot_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn tiers(items: &[Item]) -> Vec<u8> {
    items
        .iter()
        .filter_map(Item::tier)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn enchantments(items: &[Item]) -> Vec<u8> {
    items
        .iter()
        .map(Item::enchantment)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
