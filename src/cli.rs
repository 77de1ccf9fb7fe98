//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::Server;

/// Craft profit finder for black market trading.
#[derive(Parser, Debug)]
#[command(name = "craft-scanner")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Regional server to price against (europe, west, east)
    #[arg(long, global = true)]
    pub server: Option<Server>,

    /// Path to the item catalog JSON export
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Price a filtered slice of the catalog and rank it by craft profit
    Scan(ScanArgs),

    /// Price one item, optionally with manual price overrides
    Quote(QuoteArgs),

    /// List the slot types, tiers and enchantments present in the catalog
    Filters,

    /// List the recognised regional servers
    Servers,
}

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Slot type, e.g. armor, head, shoes, mainhand
    #[arg(long)]
    pub slot: Option<String>,

    /// Tier, e.g. T4 or 4
    #[arg(long)]
    pub tier: Option<String>,

    /// Enchantment level
    #[arg(long)]
    pub enchantment: Option<u8>,

    /// Case-insensitive part of the item name
    #[arg(long)]
    pub name: Option<String>,

    /// Only print the first N ranked items
    #[arg(long)]
    pub limit: Option<usize>,

    /// Resource return rate in percent (e.g. 24.8)
    #[arg(long)]
    pub return_rate: Option<String>,

    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Item identifier, e.g. T4_ARMOR_PLATE_SET1
    pub unique_name: String,

    /// Manual sell price
    #[arg(long)]
    pub item_price: Option<String>,

    /// Manual resource price as ID=PRICE (repeatable)
    #[arg(long = "resource", value_name = "ID=PRICE")]
    pub resources: Vec<String>,

    /// Manual return rate in percent
    #[arg(long)]
    pub return_rate: Option<String>,

    /// Emit JSON instead of a breakdown
    #[arg(long)]
    pub json: bool,
}

impl QuoteArgs {
    pub fn has_overrides(&self) -> bool {
        self.item_price.is_some() || !self.resources.is_empty() || self.return_rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_filters() {
        let cli = Cli::parse_from([
            "craft-scanner",
            "--server",
            "west",
            "scan",
            "--slot",
            "armor",
            "--tier",
            "T6",
            "--limit",
            "20",
        ]);
        assert_eq!(cli.server, Some(Server::West));
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.slot.as_deref(), Some("armor"));
        assert_eq!(args.tier.as_deref(), Some("T6"));
        assert_eq!(args.limit, Some(20));
    }

    #[test]
    fn parses_quote_overrides() {
        let cli = Cli::parse_from([
            "craft-scanner",
            "quote",
            "T4_BAG",
            "--item-price",
            "5000",
            "--resource",
            "T4_LEATHER=120",
            "--resource",
            "T4_CLOTH=95",
        ]);
        let Commands::Quote(args) = cli.command else {
            panic!("expected quote");
        };
        assert_eq!(args.unique_name, "T4_BAG");
        assert_eq!(args.resources.len(), 2);
        assert!(args.has_overrides());
    }

    #[test]
    fn parses_filters_with_catalog() {
        let cli = Cli::parse_from(["craft-scanner", "filters", "--catalog", "items.json"]);
        assert!(matches!(cli.command, Commands::Filters));
        assert_eq!(cli.catalog, Some(PathBuf::from("items.json")));
    }
}
