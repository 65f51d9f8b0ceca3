use std::io;
use std::path::Path;
use tracing::info;

use crate::compare::{profit, sorted_by, ComparisonReport, SortDirection, SortField};
use crate::error::Result;

const HEADER: [&str; 15] = [
    "SKU",
    "Title",
    "Shopify Price",
    "Shopify Cost",
    "Shopify Profit",
    "Market Price (USD)",
    "Market Price",
    "Market Profit",
    "Difference",
    "Difference (%)",
    "Status",
    "Set",
    "Product Type",
    "Release Date",
    "Exchange Rate",
];

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

/// Writes matched rows (by difference %) followed by unmatched store
/// listings. Returns the number of data rows written.
pub fn write_comparison<W: io::Write>(report: &ComparisonReport, writer: W) -> Result<usize> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)?;

    let rate = format!("{:.4}", report.exchange_rate);
    let rows = sorted_by(&report.rows, |row| SortField::DifferencePct.value(row), SortDirection::Ascending);
    for row in &rows {
        let status = report.status_of(row).map(|s| s.label()).unwrap_or("");
        out.write_record(vec![
            row.sku.clone(),
            row.title.clone(),
            money(row.price),
            money(row.cost),
            money(row.merchant_profit),
            money(Some(row.market_price)),
            money(Some(row.market_price_local)),
            money(row.market_profit),
            money(row.difference),
            row.difference_pct.map(|p| format!("{:.1}", p)).unwrap_or_default(),
            status.to_string(),
            row.set_name.clone().unwrap_or_default(),
            row.category.clone().unwrap_or_default(),
            row.release_date.clone().unwrap_or_default(),
            rate.clone(),
        ])?;
    }

    for item in &report.merchant_only {
        let mut record = vec![
            item.sku.clone(),
            item.title.clone(),
            money(item.price),
            money(item.cost),
            money(profit(item.price, item.cost)),
        ];
        record.extend(std::iter::repeat(String::new()).take(5));
        record.push("NO MATCH".to_string());
        record.extend(std::iter::repeat(String::new()).take(HEADER.len() - record.len()));
        out.write_record(&record)?;
    }

    out.flush()?;
    Ok(rows.len() + report.merchant_only.len())
}

pub fn write_comparison_csv(report: &ComparisonReport, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let written = write_comparison(report, file)?;
    info!("Exported price comparison to: {}", path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_prices;
    use crate::types::{MarketIndex, MarketRecord, MerchantProduct, ProductCatalog};
    use chrono::NaiveDate;

    #[test]
    fn exports_matched_then_unmatched() {
        let catalog: ProductCatalog = vec![
            MerchantProduct {
                sku: "ABC123".into(),
                title: "Widget, large".into(),
                handle: None,
                price: Some(19.99),
                cost: Some(10.0),
            },
            MerchantProduct {
                sku: "SOLO".into(),
                title: "Solo".into(),
                handle: None,
                price: Some(4.0),
                cost: Some(1.0),
            },
        ]
        .into_iter()
        .collect();
        let mut market = MarketIndex::new();
        market.insert(
            "ABC123".into(),
            MarketRecord {
                sku: "ABC123".into(),
                market_price: Some(15.0),
                ..Default::default()
            },
        );
        let report = compare_prices(&catalog, &market, 1.35, 5.0, NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());

        let mut buf = Vec::new();
        let written = write_comparison(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(written, 2);
        assert!(lines[0].starts_with("SKU,Title,Shopify Price"));
        assert_eq!(
            lines[1],
            "ABC123,\"Widget, large\",19.99,10.00,9.99,15.00,20.25,10.25,-0.26,-1.3,OK,,,,1.3500"
        );
        assert_eq!(lines[2], "SOLO,Solo,4.00,1.00,3.00,,,,,,NO MATCH,,,,");
    }
}
