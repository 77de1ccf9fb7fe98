//! Plain-text rendering of enriched items.

use std::fmt::Write as _;

use crate::domain::{CraftEconomics, Item};

const UNAVAILABLE: &str = "unavailable";

/// Formats a silver amount with thousands separators (`1234567` → `1,234,567`).
pub fn format_silver(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(value) if value > 0.0 => format_silver(value.round() as i64),
        _ => "N/A".to_string(),
    }
}

fn economics_columns(economics: Option<&CraftEconomics>) -> [String; 4] {
    match economics {
        Some(e) => [
            format_silver(e.total_craft_cost),
            format_silver(e.return_value),
            format_silver(e.market_tax),
            format_silver(e.profit),
        ],
        None => std::array::from_fn(|_| UNAVAILABLE.to_string()),
    }
}

/// Tier and enchantment label such as `T4.1`.
pub fn tier_label(item: &Item) -> String {
    match item.tier() {
        Some(tier) => format!("T{tier}.{}", item.enchantment()),
        None => "-".to_string(),
    }
}

pub fn render_table(items: &[Item]) -> String {
    let header = [
        "#", "Item", "Tier", "Price", "Craft cost", "Return", "Tax", "Profit",
    ];

    let rows: Vec<[String; 8]> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let economics = item
                .crafting_profit
                .as_ref()
                .and_then(|profit| profit.economics.as_ref());
            let [cost, ret, tax, profit] = economics_columns(economics);
            [
                (index + 1).to_string(),
                item.name.clone(),
                tier_label(item),
                format_price(item.price),
                cost,
                ret,
                tax,
                profit,
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    write_row(&mut out, &header.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for row in &rows {
        write_row(&mut out, row, &widths);
    }
    out
}

/// Recipe breakdown for a single item.
pub fn render_breakdown(item: &Item, return_rate: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}, {})", item.name, item.unique_name, tier_label(item));
    let _ = writeln!(out, "  Sell price:   {}", format_price(item.price));
    let _ = writeln!(out, "  Return rate:  {:.1}%", return_rate * 100.0);
    let _ = writeln!(out, "  Resources:");
    for resource in &item.resources {
        let line_total = resource
            .price
            .filter(|price| *price > 0.0)
            .map(|price| format_silver((price * f64::from(resource.count)).round() as i64))
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "    {:<40} x{:<4} @ {:>10} = {:>12}{}",
            resource.unique_name,
            resource.count,
            format_price(resource.price),
            line_total,
            if resource.is_artifact { "  (artifact)" } else { "" },
        );
    }

    match item.crafting_profit.as_ref() {
        None => {
            let _ = writeln!(out, "  Profit:       {UNAVAILABLE} (no sell price or recipe)");
        }
        Some(profit) => {
            let [cost, ret, tax, net] = economics_columns(profit.economics.as_ref());
            let _ = writeln!(out, "  Craft cost:   {cost}");
            let _ = writeln!(out, "  Return value: {ret}");
            let _ = writeln!(out, "  Market tax:   {tax}");
            let _ = writeln!(out, "  Profit:       {net}");
        }
    }
    out
}

fn write_row(out: &mut String, cells: &[String; 8], widths: &[usize; 8]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths.iter().copied())
        .enumerate()
        .map(|(column, (cell, width))| {
            // Text columns left aligned, numbers right aligned.
            if column == 1 || column == 2 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
