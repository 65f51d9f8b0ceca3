use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{error, info};

use price_compare::compare::{SortDirection, SortField, SortSpec};
use price_compare::config::Config;
use price_compare::constants::{DEFAULT_CONFIG_PATH, DEFAULT_SHOPIFY_EXPORT};
use price_compare::market::{resolve_exchange_rate, MarketDataSource, StaticMarketSource, SupabaseMarketSource};
use price_compare::merchant::ShopifyClient;
use price_compare::{export, logging, report, ComparisonSession};

#[derive(Parser)]
#[command(name = "price_compare")]
#[command(about = "Compare Shopify prices (CAD) against market prices (USD)")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Csv,
    Api,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare store prices against market prices
    Compare {
        /// Path to the Shopify products export CSV
        #[arg(long, default_value = DEFAULT_SHOPIFY_EXPORT)]
        shopify: PathBuf,
        /// Where to read store prices from
        #[arg(long, value_enum, default_value_t = Source::Csv)]
        source: Source,
        /// Shopify store domain, e.g. mystore.myshopify.com
        #[arg(long)]
        shopify_domain: Option<String>,
        /// Shopify Admin API access token
        #[arg(long)]
        shopify_token: Option<String>,
        /// Shopify Admin API version
        #[arg(long)]
        shopify_api_version: Option<String>,
        /// Read market data from a JSON snapshot instead of Supabase
        #[arg(long)]
        market_json: Option<PathBuf>,
        /// Alert threshold percentage (defaults to the config value)
        #[arg(long)]
        threshold: Option<f64>,
        /// Only show SKUs or titles containing this text
        #[arg(long)]
        filter: Option<String>,
        /// Field to order the filtered table by, e.g. difference-pct or market-margin
        #[arg(long)]
        sort: Option<SortField>,
        /// Sort descending (shows the sorted table even without --sort)
        #[arg(long)]
        desc: bool,
        /// Export results to a CSV file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Show USD prices alongside CAD
        #[arg(long)]
        show_usd: bool,
    },
    /// Print the exchange rate the comparison would use
    Rate {
        #[arg(long)]
        market_json: Option<PathBuf>,
    },
}

/// The table view to print after the report, if any view option was given.
fn view_spec(filter: Option<&str>, sort: Option<SortField>, desc: bool) -> Option<SortSpec> {
    if filter.is_none() && sort.is_none() && !desc {
        return None;
    }
    Some(SortSpec {
        field: sort.unwrap_or(SortField::DifferencePct),
        direction: if desc { SortDirection::Descending } else { SortDirection::Ascending },
    })
}

fn market_source(config: &Config, market_json: Option<&PathBuf>) -> anyhow::Result<Box<dyn MarketDataSource>> {
    match market_json {
        Some(path) => {
            let source = StaticMarketSource::from_json_file(path)
                .with_context(|| format!("reading market snapshot {}", path.display()))?;
            Ok(Box::new(source))
        }
        None => Ok(Box::new(SupabaseMarketSource::new(
            &config.supabase.url,
            &config.supabase.key,
        )?)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Compare {
            shopify,
            source,
            shopify_domain,
            shopify_token,
            shopify_api_version,
            market_json,
            threshold,
            filter,
            sort,
            desc,
            export: export_path,
            show_usd,
        } => {
            config.shopify.apply_overrides(
                shopify_domain.as_deref(),
                shopify_token.as_deref(),
                shopify_api_version.as_deref(),
            );
            let threshold = threshold.unwrap_or(config.compare.threshold_pct);
            let market = market_source(&config, market_json.as_ref())?;
            let mut session = ComparisonSession::new(config.compare.default_exchange_rate);

            match source {
                Source::Csv => {
                    info!("Loading Shopify products: {}", shopify.display());
                    let bytes = std::fs::read(&shopify)
                        .with_context(|| format!("reading Shopify export {}", shopify.display()))?;
                    session.load_export(&String::from_utf8_lossy(&bytes));
                }
                Source::Api => {
                    let client = ShopifyClient::new(
                        &config.shopify.domain,
                        &config.shopify.token,
                        &config.shopify.api_version,
                    )?;
                    match client.fetch_products().await {
                        Ok(products) => session.set_products(products),
                        Err(e) => {
                            error!("Shopify fetch failed: {}", e);
                            session.push_message(e.to_string());
                        }
                    }
                }
            }

            session.refresh_market(market.as_ref()).await;
            for message in session.messages() {
                eprintln!("⚠️  {}", message);
            }

            let today = Utc::now().date_naive();
            let comparison = session.report(threshold, today);
            println!("{}", report::render_report(&comparison, show_usd));

            if let Some(spec) = view_spec(filter.as_deref(), sort, desc) {
                let rows = session.view(filter.as_deref().unwrap_or(""), spec, today);
                println!("\nFILTERED VIEW (sort: {}, {} rows):", spec.field, rows.len());
                println!("{}", report::render_rows(&comparison, &rows, show_usd));
            }

            if let Some(path) = export_path {
                let written = export::write_comparison_csv(&comparison, &path)?;
                println!("✓ Exported {} rows to: {}", written, path.display());
            }
        }
        Commands::Rate { market_json } => {
            let market = market_source(&config, market_json.as_ref())?;
            let resolved = resolve_exchange_rate(market.as_ref(), config.compare.default_exchange_rate).await;
            println!(
                "1 USD = {:.4} CAD (as of {})",
                resolved.rate,
                resolved.recorded_at.as_deref().unwrap_or("unknown")
            );
            if let Some(message) = resolved.message {
                eprintln!("⚠️  {}", message);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desc_alone_shows_descending_view() {
        assert_eq!(view_spec(None, None, false), None);
        assert_eq!(view_spec(None, None, true), Some(SortSpec::descending(SortField::DifferencePct)));
        assert_eq!(
            view_spec(Some("etb"), Some(SortField::Price), false),
            Some(SortSpec::ascending(SortField::Price))
        );
    }

    #[test]
    fn shopify_flags_parse() {
        let cli = Cli::try_parse_from([
            "price_compare",
            "compare",
            "--source",
            "api",
            "--shopify-domain",
            "store.myshopify.com",
            "--shopify-token",
            "shpat_x",
            "--desc",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare { shopify_domain, shopify_token, desc, .. } => {
                assert_eq!(shopify_domain.as_deref(), Some("store.myshopify.com"));
                assert_eq!(shopify_token.as_deref(), Some("shpat_x"));
                assert!(desc);
            }
            Commands::Rate { .. } => panic!("expected compare"),
        }
    }
}
