use std::cmp::Ordering;

use super::entities::{CraftEconomics, CraftingProfit, HistoryPoint, Item, ProfitPolicy};

/// Number of most recent buckets averaged into a representative price.
pub const DEFAULT_HISTORY_WINDOW: usize = 3;

/// Reduces a price history to one unit price by averaging the last `window` points.
///
/// Returns `None` for an empty series so callers can tell "unknown" apart from zero.
pub fn representative_price(points: &[HistoryPoint], window: usize) -> Option<f64> {
    if points.is_empty() || window == 0 {
        return None;
    }

    let recent = &points[points.len().saturating_sub(window)..];
    let sum: f64 = recent.iter().map(|point| point.avg_price).sum();
    Some(round_half_up(sum / recent.len() as f64))
}

/// Computes craft economics for an item whose prices have been attached.
///
/// - `None` when the item has no sellable price or no recipe.
/// - `Some` with empty economics when any resource price is missing, non-finite or not
///   positive.
pub fn crafting_profit(item: &Item, policy: &ProfitPolicy) -> Option<CraftingProfit> {
    let item_price = item.price.filter(|price| price.is_finite() && *price > 0.0)?;

    if item.resources.is_empty() {
        return None;
    }

    let all_priced = item
        .resources
        .iter()
        .all(|resource| usable_price(resource.price).is_some());

    if !all_priced {
        return Some(CraftingProfit {
            item_id: item.unique_name.clone(),
            item_price,
            economics: None,
        });
    }

    let mut total_cost = 0.0;
    let mut return_base = 0.0;
    for resource in &item.resources {
        let cost = usable_price(resource.price).unwrap_or_default() * f64::from(resource.count);
        total_cost += cost;
        if !resource.is_artifact {
            return_base += cost;
        }
    }

    let return_rate = policy.return_rate.clamp(0.0, 1.0);
    let return_value = return_base * return_rate;
    let market_tax = item_price * policy.market_tax_rate;
    let profit = item_price - total_cost + return_value - market_tax;

    Some(CraftingProfit {
        item_id: item.unique_name.clone(),
        item_price,
        economics: Some(CraftEconomics {
            total_craft_cost: round_half_up(total_cost) as i64,
            return_value: round_half_up(return_value) as i64,
            market_tax: round_half_up(market_tax) as i64,
            profit: round_half_up(profit) as i64,
        }),
    })
}

/// Orders items by profit, highest first. Items without a profit go last.
pub fn sort_by_profit(items: &mut [Item]) {
    items.sort_by(|a, b| compare_profit_desc(a.profit(), b.profit()));
}

fn compare_profit_desc(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn usable_price(price: Option<f64>) -> Option<f64> {
    price.filter(|value| value.is_finite() && *value > 0.0)
}

/// Nearest integer with halves rounded towards positive infinity (-2.5 → -2).
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    // The fractional part is exact, unlike `value + 0.5`.
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ResourceRequirement;

    fn points(prices: &[f64]) -> Vec<HistoryPoint> {
        prices.iter().copied().map(HistoryPoint::new).collect()
    }

    fn plate_armor() -> Item {
        Item::new("T4_ARMOR_PLATE_SET1", "Adept's Soldier Armor")
            .with_price(1000.0)
            .with_resource(ResourceRequirement::new("T4_METALBAR", Some(4)).with_price(100.0))
            .with_resource(
                ResourceRequirement::new("T4_ARTEFACT_ARMOR_PLATE_SET1", Some(2))
                    .artifact()
                    .with_price(50.0),
            )
    }

    #[test]
    fn averages_last_three_points() {
        let series = points(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert_eq!(representative_price(&series, 3), Some(40.0));
    }

    #[test]
    fn short_series_averages_what_is_there() {
        assert_eq!(representative_price(&points(&[10.0, 15.0]), 3), Some(13.0));
    }

    #[test]
    fn empty_series_has_no_price() {
        assert_eq!(representative_price(&[], 3), None);
    }

    #[test]
    fn five_point_window_is_configurable() {
        let series = points(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0]);
        assert_eq!(representative_price(&series, 5), Some(40.0));
    }

    #[test]
    fn end_to_end_profit_matches_reference() {
        let result = crafting_profit(&plate_armor(), &ProfitPolicy::default()).unwrap();
        assert_eq!(result.item_id, "T4_ARMOR_PLATE_SET1");
        assert_eq!(result.item_price, 1000.0);
        assert_eq!(
            result.economics,
            Some(CraftEconomics {
                total_craft_cost: 500,
                return_value: 99,
                market_tax: 100,
                profit: 499,
            })
        );
    }

    #[test]
    fn artifacts_never_enter_return_base() {
        for rate in [0.0, 0.152, 0.248, 0.435, 1.0] {
            let policy = ProfitPolicy::default().with_return_rate(rate);
            let economics = crafting_profit(&plate_armor(), &policy)
                .and_then(|r| r.economics)
                .unwrap();
            assert_eq!(economics.return_value, round_half_up(400.0 * rate) as i64);
        }
    }

    #[test]
    fn any_bad_resource_price_blanks_economics() {
        for bad in [None, Some(0.0), Some(-5.0), Some(f64::NAN)] {
            let mut item = plate_armor();
            item.resources[1].price = bad;
            let result = crafting_profit(&item, &ProfitPolicy::default()).unwrap();
            assert_eq!(result.item_id, "T4_ARMOR_PLATE_SET1");
            assert_eq!(result.item_price, 1000.0);
            assert!(result.economics.is_none());
        }
    }

    #[test]
    fn unpriced_item_or_missing_recipe_gives_no_result() {
        let mut item = plate_armor();
        item.price = None;
        assert!(crafting_profit(&item, &ProfitPolicy::default()).is_none());

        item.price = Some(0.0);
        assert!(crafting_profit(&item, &ProfitPolicy::default()).is_none());

        let bare = Item::new("T4_BAG", "Adept's Bag").with_price(2500.0);
        assert!(crafting_profit(&bare, &ProfitPolicy::default()).is_none());
    }

    #[test]
    fn tax_free_variant_via_policy() {
        let policy = ProfitPolicy {
            market_tax_rate: 0.0,
            ..ProfitPolicy::default()
        };
        let economics = crafting_profit(&plate_armor(), &policy)
            .and_then(|r| r.economics)
            .unwrap();
        assert_eq!(economics.market_tax, 0);
        assert_eq!(economics.profit, 599);
    }

    #[test]
    fn each_output_is_rounded_from_unrounded_terms() {
        // 333 - 3*111 + 0.248*333 - 33.3 = 49.284
        let item = Item::new("T4_OFF_SHIELD", "Adept's Shield")
            .with_price(333.0)
            .with_resource(ResourceRequirement::new("T4_PLANKS", Some(3)).with_price(111.0));
        let economics = crafting_profit(&item, &ProfitPolicy::default())
            .and_then(|r| r.economics)
            .unwrap();
        assert_eq!(economics.total_craft_cost, 333);
        assert_eq!(economics.return_value, 83);
        assert_eq!(economics.market_tax, 33);
        assert_eq!(economics.profit, 49);
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(0.49999999999999994), 0.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(4_503_599_627_370_497.0), 4_503_599_627_370_497.0);
    }

    #[test]
    fn sorting_puts_missing_profit_last() {
        let profit = |id: &str, value: Option<i64>| {
            let mut item = Item::new(id, id);
            item.crafting_profit = Some(CraftingProfit {
                item_id: id.to_string(),
                item_price: 1.0,
                economics: value.map(|profit| CraftEconomics {
                    total_craft_cost: 0,
                    return_value: 0,
                    market_tax: 0,
                    profit,
                }),
            });
            item
        };

        let mut items = vec![
            Item::new("NONE", "none"),
            profit("LOW", Some(-50)),
            profit("BLANK", None),
            profit("HIGH", Some(900)),
            profit("MID", Some(10)),
        ];
        sort_by_profit(&mut items);

        let order: Vec<_> = items.iter().map(|i| i.unique_name.as_str()).collect();
        assert_eq!(order, ["HIGH", "MID", "LOW", "NONE", "BLANK"]);
    }
}
