//! Joins merchant listings with market prices and orders the result.

pub mod derive;
pub mod sort;
pub mod summary;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::types::{ComparisonRow, MarketIndex, MarketRecord, MerchantProduct, ProductCatalog};

pub use derive::{days_elapsed, derive_row, derive_rows, margin, parse_release_date, profit};
pub use sort::{filter_and_sort, sorted_by, SortDirection, SortField, SortSpec, SortValue};
pub use summary::{summarize, ComparisonSummary, PriceStatus};

/// A SKU found in both datasets whose market price is still unknown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnpricedMatch {
    pub product: MerchantProduct,
    pub market: MarketRecord,
    pub merchant_profit: Option<f64>,
    pub merchant_margin: Option<f64>,
}

/// Everything the report and export need from one comparison run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub exchange_rate: f64,
    pub threshold_pct: f64,
    pub rows: Vec<ComparisonRow>,
    pub summary: ComparisonSummary,
    pub no_market_price: Vec<UnpricedMatch>,
    pub merchant_only: Vec<MerchantProduct>,
    pub market_only: Vec<MarketRecord>,
}

impl ComparisonReport {
    pub fn status_of(&self, row: &ComparisonRow) -> Option<PriceStatus> {
        PriceStatus::classify(row.difference_pct, self.threshold_pct)
    }

    pub fn below_market(&self) -> Vec<ComparisonRow> {
        self.with_status(PriceStatus::Below, SortSpec::ascending(SortField::DifferencePct))
    }

    pub fn above_market(&self) -> Vec<ComparisonRow> {
        self.with_status(PriceStatus::Above, SortSpec::descending(SortField::DifferencePct))
    }

    fn with_status(&self, status: PriceStatus, spec: SortSpec) -> Vec<ComparisonRow> {
        let picked: Vec<ComparisonRow> = self
            .rows
            .iter()
            .filter(|row| self.status_of(row) == Some(status))
            .cloned()
            .collect();
        sorted_by(&picked, |row| spec.field.value(row), spec.direction)
    }
}

/// Runs the full comparison: derived rows, counts, and the unmatched buckets.
pub fn compare_prices(
    products: &ProductCatalog,
    market: &MarketIndex,
    exchange_rate: f64,
    threshold_pct: f64,
    today: NaiveDate,
) -> ComparisonReport {
    let rows = derive_rows(products, market, exchange_rate, today);

    let mut no_market_price = Vec::new();
    let mut merchant_only = Vec::new();
    for product in products.iter() {
        match market.get(&product.sku) {
            Some(record) if record.market_price.is_none() => no_market_price.push(UnpricedMatch {
                product: product.clone(),
                market: record.clone(),
                merchant_profit: profit(product.price, product.cost),
                merchant_margin: margin(product.price, product.cost),
            }),
            Some(_) => {}
            None => merchant_only.push(product.clone()),
        }
    }

    let mut market_only: Vec<MarketRecord> = market
        .values()
        .filter(|record| !products.contains(&record.sku))
        .cloned()
        .collect();
    market_only.sort_by(|a, b| a.sku.cmp(&b.sku));

    let summary = summarize(&rows, threshold_pct);
    info!(
        matched = summary.total_matched,
        below = summary.below,
        above = summary.above,
        merchant_only = merchant_only.len(),
        market_only = market_only.len(),
        "Compared merchant prices against market"
    );

    ComparisonReport {
        exchange_rate,
        threshold_pct,
        rows,
        summary,
        no_market_price,
        merchant_only,
        market_only,
    }
}
