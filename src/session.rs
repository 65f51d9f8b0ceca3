use chrono::NaiveDate;
use tracing::{info, warn};

use crate::compare::{compare_prices, derive_rows, filter_and_sort, ComparisonReport, SortSpec};
use crate::market::{resolve_exchange_rate, MarketDataSource};
use crate::parser::parse_product_export;
use crate::types::{ComparisonRow, MarketIndex, ProductCatalog};

/// Current inputs of the dashboard. Every getter recomputes from these, so a
/// new upload or fetch simply replaces the relevant input.
#[derive(Debug, Clone)]
pub struct ComparisonSession {
    products: ProductCatalog,
    market: MarketIndex,
    exchange_rate: Option<f64>,
    default_rate: f64,
    messages: Vec<String>,
}

impl ComparisonSession {
    pub fn new(default_rate: f64) -> Self {
        Self {
            products: ProductCatalog::new(),
            market: MarketIndex::new(),
            exchange_rate: None,
            default_rate,
            messages: Vec::new(),
        }
    }

    /// Replaces the merchant products with the parsed export. A malformed
    /// header leaves an empty catalog and a message instead of failing.
    pub fn load_export(&mut self, text: &str) -> bool {
        match parse_product_export(text) {
            Ok(catalog) => {
                self.products = catalog;
                true
            }
            Err(e) => {
                warn!("Rejected product export: {}", e);
                self.products = ProductCatalog::new();
                self.messages.push(e.to_string());
                false
            }
        }
    }

    pub fn set_products(&mut self, products: ProductCatalog) {
        self.products = products;
    }

    pub fn set_market(&mut self, market: MarketIndex) {
        self.market = market;
    }

    pub fn set_exchange_rate(&mut self, rate: Option<f64>) {
        self.exchange_rate = rate.filter(|r| r.is_finite() && *r > 0.0);
    }

    /// The stored rate, or the default when none is usable
    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate.unwrap_or(self.default_rate)
    }

    pub fn products(&self) -> &ProductCatalog {
        &self.products
    }

    pub fn market(&self) -> &MarketIndex {
        &self.market
    }

    pub fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Refreshes market records and the exchange rate from `source`.
    ///
    /// A failed record fetch leaves an empty market dataset; a failed rate
    /// fetch falls back to the default rate. Both are reported as messages.
    pub async fn refresh_market(&mut self, source: &dyn MarketDataSource) {
        match source.fetch_market_records().await {
            Ok(records) => {
                info!("Loaded {} market records", records.len());
                self.market = records;
            }
            Err(e) => {
                warn!("Market data unavailable: {}", e);
                self.market = MarketIndex::new();
                self.messages.push(format!("Failed to load market prices: {}", e));
            }
        }

        let resolved = resolve_exchange_rate(source, self.default_rate).await;
        self.exchange_rate = resolved.message.is_none().then_some(resolved.rate);
        if let Some(message) = resolved.message {
            self.messages.push(message);
        }
    }

    pub fn rows(&self, today: NaiveDate) -> Vec<ComparisonRow> {
        derive_rows(&self.products, &self.market, self.exchange_rate(), today)
    }

    pub fn view(&self, filter: &str, spec: SortSpec, today: NaiveDate) -> Vec<ComparisonRow> {
        filter_and_sort(&self.rows(today), filter, spec)
    }

    pub fn report(&self, threshold_pct: f64, today: NaiveDate) -> ComparisonReport {
        compare_prices(&self.products, &self.market, self.exchange_rate(), threshold_pct, today)
    }
}
