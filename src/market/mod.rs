//! Sources of market prices and exchange rates.

pub mod supabase;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::UNKNOWN_LABEL;
use crate::error::Result;
use crate::types::{ExchangeRate, MarketIndex, MarketRecord};

pub use supabase::SupabaseMarketSource;

/// Where market records and the USD -> CAD rate come from
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_market_records(&self) -> Result<MarketIndex>;

    /// Latest stored rate, `None` when nothing has been recorded yet
    async fn fetch_exchange_rate(&self) -> Result<Option<ExchangeRate>>;
}

/// A product row as returned by the `products` table with its joined set and type
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub sku: Option<String>,
    pub usd_price: Option<f64>,
    pub last_updated: Option<String>,
    pub sets: Option<SetRow>,
    pub product_types: Option<ProductTypeRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRow {
    pub name: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductTypeRow {
    pub name: Option<String>,
    pub label: Option<String>,
}

impl ProductRow {
    /// Converts the row into a market record; rows without a SKU are dropped.
    pub fn into_record(self) -> Option<MarketRecord> {
        let sku = self.sku.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())?;
        let (set_name, release_date) = match self.sets {
            Some(set) => (set.name, set.release_date),
            None => (None, None),
        };
        let category = self.product_types.and_then(|t| t.label.or(t.name));

        Some(MarketRecord {
            sku,
            market_price: self.usd_price,
            set_name: Some(set_name.unwrap_or_else(|| UNKNOWN_LABEL.to_string())),
            release_date,
            category: Some(category.unwrap_or_else(|| UNKNOWN_LABEL.to_string())),
            last_updated: self.last_updated,
        })
    }
}

/// Builds the SKU index; a later row with the same SKU replaces an earlier one.
pub fn index_rows(rows: Vec<ProductRow>) -> MarketIndex {
    rows.into_iter()
        .filter_map(ProductRow::into_record)
        .map(|record| (record.sku.clone(), record))
        .collect()
}

/// Market data held in memory, e.g. loaded from a JSON snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticMarketSource {
    pub records: MarketIndex,
    pub exchange_rate: Option<ExchangeRate>,
}

#[derive(Debug, Deserialize)]
struct MarketSnapshot {
    #[serde(default)]
    exchange_rate: Option<ExchangeRate>,
    products: Vec<ProductRow>,
}

impl StaticMarketSource {
    pub fn new(records: MarketIndex, exchange_rate: Option<ExchangeRate>) -> Self {
        Self { records, exchange_rate }
    }

    /// Parses a snapshot shaped like `{"exchange_rate": {...}, "products": [...]}`
    /// where each product matches the `products` table rows.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: MarketSnapshot = serde_json::from_str(text)?;
        Ok(Self::new(index_rows(snapshot.products), snapshot.exchange_rate))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[async_trait]
impl MarketDataSource for StaticMarketSource {
    async fn fetch_market_records(&self) -> Result<MarketIndex> {
        Ok(self.records.clone())
    }

    async fn fetch_exchange_rate(&self) -> Result<Option<ExchangeRate>> {
        Ok(self.exchange_rate.clone())
    }
}

/// Exchange rate to use for a run, with a message when it is the fallback
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub rate: f64,
    pub recorded_at: Option<String>,
    pub message: Option<String>,
}

/// Fetches the latest rate, falling back to `default_rate` when the fetch
/// fails or returns something unusable.
pub async fn resolve_exchange_rate(source: &dyn MarketDataSource, default_rate: f64) -> ResolvedRate {
    let fallback = |message: String| {
        warn!("{}; using default exchange rate {:.4}", message, default_rate);
        ResolvedRate {
            rate: default_rate,
            recorded_at: None,
            message: Some(format!("{}. Using default rate {:.2}.", message, default_rate)),
        }
    };

    match source.fetch_exchange_rate().await {
        Ok(Some(rate)) if rate.usd_to_cad.is_finite() && rate.usd_to_cad > 0.0 => {
            info!(
                "Exchange rate: 1 USD = {:.4} CAD (as of {})",
                rate.usd_to_cad,
                rate.recorded_at.as_deref().unwrap_or("unknown")
            );
            ResolvedRate {
                rate: rate.usd_to_cad,
                recorded_at: rate.recorded_at,
                message: None,
            }
        }
        Ok(Some(rate)) => fallback(format!("Stored exchange rate {} is not usable", rate.usd_to_cad)),
        Ok(None) => fallback("No exchange rate found".to_string()),
        Err(e) => fallback(format!("Failed to fetch exchange rate: {}", e)),
    }
}
