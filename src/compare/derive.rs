use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::MS_PER_DAY;
use crate::types::{ComparisonRow, MarketIndex, MarketRecord, MerchantProduct, ProductCatalog};

static DATE_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"));

/// `price - cost` when both are known.
pub fn profit(price: Option<f64>, cost: Option<f64>) -> Option<f64> {
    Some(price? - cost?)
}

/// Profit as a percentage of price; `None` for a zero price.
pub fn margin(price: Option<f64>, cost: Option<f64>) -> Option<f64> {
    let (price, cost) = (price?, cost?);
    if price == 0.0 {
        return None;
    }
    Some((price - cost) / price * 100.0)
}

/// Release date reduced to `YYYY-MM-DD` plus epoch millis at UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseDay {
    pub date: NaiveDate,
    pub epoch_ms: i64,
}

/// Reads the date part of a timestamp such as `2024-01-01T00:00:00` or
/// `2024-01-01 00:00:00+00`.
pub fn parse_release_date(raw: &str) -> Option<ReleaseDay> {
    let date_part = raw.trim().split(['T', ' ']).next().unwrap_or("");
    if !DATE_ONLY.is_match(date_part) {
        return None;
    }
    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    Some(ReleaseDay {
        date,
        epoch_ms: utc_midnight_ms(date),
    })
}

pub fn utc_midnight_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Whole days from release to `today`; releases in the future count as zero.
pub fn days_elapsed(release_ms: i64, today: NaiveDate) -> i64 {
    let diff = utc_midnight_ms(today) - release_ms;
    diff.div_euclid(MS_PER_DAY).max(0)
}

/// Computes every derived figure for one matched SKU.
///
/// Returns `None` when the market record has no price.
pub fn derive_row(
    product: &MerchantProduct,
    market: &MarketRecord,
    exchange_rate: f64,
    today: NaiveDate,
) -> Option<ComparisonRow> {
    let market_price = market.market_price?;
    let market_price_local = market_price * exchange_rate;

    let difference = product.price.map(|price| price - market_price_local);
    let difference_pct = difference
        .filter(|_| market_price_local > 0.0)
        .map(|diff| diff / market_price_local * 100.0);

    let market_profit = profit(Some(market_price_local), product.cost);
    let release = market.release_date.as_deref().and_then(parse_release_date);
    let market_profit_per_day = match (market_profit, release) {
        (Some(p), Some(day)) => {
            let days = days_elapsed(day.epoch_ms, today);
            (days > 0).then(|| p / days as f64)
        }
        _ => None,
    };

    Some(ComparisonRow {
        sku: product.sku.clone(),
        title: product.title.clone(),
        price: product.price,
        cost: product.cost,
        market_price,
        market_price_local,
        difference,
        difference_pct,
        merchant_profit: profit(product.price, product.cost),
        merchant_margin: margin(product.price, product.cost),
        market_profit,
        market_margin: margin(Some(market_price_local), product.cost),
        market_profit_per_day,
        set_name: market.set_name.clone(),
        category: market.category.clone(),
        last_updated: market.last_updated.clone(),
        release_date: release.map(|d| d.date.format("%Y-%m-%d").to_string()),
        release_date_ms: release.map(|d| d.epoch_ms),
    })
}

/// Joins merchant products against market records, in catalog order.
pub fn derive_rows(
    products: &ProductCatalog,
    market: &MarketIndex,
    exchange_rate: f64,
    today: NaiveDate,
) -> Vec<ComparisonRow> {
    products
        .iter()
        .filter_map(|product| {
            let record = market.get(&product.sku)?;
            derive_row(product, record, exchange_rate, today)
        })
        .collect()
}
