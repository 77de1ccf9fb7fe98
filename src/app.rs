use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::{
    cli::{Cli, Commands, QuoteArgs, ScanArgs},
    domain::{
        filter::{self, parse_tier_input},
        manual::parse_return_rate_percent,
        Item, ItemFilter, ManualPriceOverride, ProfitPolicy, Server,
    },
    infra::{load_catalog, AlbionDataClient},
    pricing::{enrich_items, PriceResolver},
    util::{
        config::{Config, ConfigLoader, ConfigOrigin},
        report,
    },
};

pub async fn run(cli: Cli) -> Result<()> {
    let loader = cli
        .config
        .clone()
        .map(|path| ConfigLoader::with_path(path))
        .unwrap_or_default();
    let (mut config, origin) = loader.load()?;
    config.logging.init()?;
    match origin {
        ConfigOrigin::File => info!("Loaded configuration from {}", loader.path().display()),
        ConfigOrigin::CreatedDefault => info!(
            "Config file not found, wrote defaults to {}",
            loader.path().display()
        ),
    }

    if let Some(server) = cli.server {
        config.server = server;
    }
    if let Some(catalog) = cli.catalog {
        config.catalog_path = Some(catalog);
    }

    match cli.command {
        Commands::Servers => {
            for server in Server::ALL {
                let marker = if server == config.server { "*" } else { " " };
                println!("{marker} {:<8} {}", server.as_str(), server.label());
            }
            Ok(())
        }
        Commands::Filters => {
            let catalog = load_items(&config)?;
            print!("{}", filter_summary(&catalog));
            Ok(())
        }
        Commands::Scan(args) => scan(&config, args).await,
        Commands::Quote(args) => quote(&config, args).await,
    }
}

fn build_resolver(config: &Config) -> Result<PriceResolver<AlbionDataClient>> {
    let client = match &config.base_url {
        Some(base) => AlbionDataClient::with_base_url(base),
        None => AlbionDataClient::new(),
    }
    .context("Failed to initialise price data client")?;
    Ok(PriceResolver::new(client, config.markets.clone()))
}

fn load_items(config: &Config) -> Result<Vec<Item>> {
    let path: &PathBuf = config
        .catalog_path
        .as_ref()
        .context("No item catalog configured; pass --catalog or set catalog_path")?;
    load_catalog(path).with_context(|| format!("Failed to load catalog {}", path.display()))
}

fn policy_with_rate(config: &Config, raw_rate: Option<&str>) -> ProfitPolicy {
    match raw_rate {
        Some(raw) => match parse_return_rate_percent(raw) {
            Some(rate) => config.economy.clone().with_return_rate(rate),
            None => {
                warn!("Ignoring unreadable return rate `{raw}`");
                config.economy.clone()
            }
        },
        None => config.economy.clone(),
    }
}

fn filter_summary(catalog: &[Item]) -> String {
    let join = |values: Vec<String>| values.join(", ");
    let tiers: Vec<String> = filter::tiers(catalog)
        .into_iter()
        .map(|tier| format!("T{tier}"))
        .collect();
    let enchantments: Vec<String> = filter::enchantments(catalog)
        .into_iter()
        .map(|level| level.to_string())
        .collect();
    format!(
        "Slot types:   {}\nTiers:        {}\nEnchantments: {}\n",
        join(filter::slot_types(catalog)),
        join(tiers),
        join(enchantments),
    )
}

fn scan_filter(args: &ScanArgs) -> Result<ItemFilter> {
    let tier = match args.tier.as_deref() {
        Some(raw) => Some(parse_tier_input(raw).with_context(|| format!("Invalid tier `{raw}`"))?),
        None => None,
    };
    Ok(ItemFilter {
        slot_type: args.slot.clone(),
        name: args.name.clone(),
        tier,
        enchantment: args.enchantment,
    })
}

async fn scan(config: &Config, args: ScanArgs) -> Result<()> {
    let catalog = load_items(config)?;
    let items = scan_filter(&args)?.apply_owned(&catalog);
    if items.is_empty() {
        info!("No catalog items match the given filters");
        return Ok(());
    }

    let policy = policy_with_rate(config, args.return_rate.as_deref());
    let resolver = build_resolver(config)?;

    info!(
        server = %config.server,
        items = items.len(),
        "Pricing catalog slice"
    );
    let mut enriched = enrich_items(&resolver, config.server, &items, &policy)
        .await
        .context("Failed to resolve market prices")?;

    if let Some(limit) = args.limit {
        enriched.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&enriched)?);
    } else {
        print!("{}", report::render_table(&enriched));
    }
    Ok(())
}

async fn quote(config: &Config, args: QuoteArgs) -> Result<()> {
    let catalog = load_items(config)?;
    let Some(item) = catalog
        .into_iter()
        .find(|item| item.unique_name == args.unique_name)
    else {
        bail!("Item `{}` is not in the catalog", args.unique_name);
    };

    let resolver = build_resolver(config)?;
    let market = enrich_items(&resolver, config.server, &[item], &config.economy)
        .await
        .context("Failed to resolve market prices")?
        .into_iter()
        .next()
        .context("Enrichment returned no item")?;

    let manual = if args.has_overrides() {
        let manual = manual_override(&market, &config.economy, &args)?;
        Some((manual.recompute(&market, &config.economy), manual.return_rate))
    } else {
        None
    };

    if args.json {
        let payload = serde_json::json!({
            "market": market,
            "manual": manual.as_ref().map(|(item, _)| item),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Market prices ({})", config.server.label());
    print!("{}", report::render_breakdown(&market, config.economy.return_rate));
    if let Some((item, return_rate)) = &manual {
        println!();
        println!("Manual prices");
        print!("{}", report::render_breakdown(item, *return_rate));
    }
    Ok(())
}

fn manual_override(
    item: &Item,
    policy: &ProfitPolicy,
    args: &QuoteArgs,
) -> Result<ManualPriceOverride> {
    let mut manual = ManualPriceOverride::from_item(item, policy);

    if let Some(raw) = &args.item_price {
        manual.set_item_price(raw);
    }
    for entry in &args.resources {
        let Some((unique_name, raw)) = entry.split_once('=') else {
            bail!("Resource override `{entry}` must look like ID=PRICE");
        };
        let unique_name = unique_name.trim();
        if !item.resources.iter().any(|res| res.unique_name == unique_name) {
            warn!("`{unique_name}` is not a resource of {}", item.unique_name);
        }
        manual.set_resource_price(unique_name, raw);
    }
    if let Some(raw) = &args.return_rate {
        manual.set_return_rate_percent(raw);
    }
    Ok(manual)
}
