//! Plain-text rendering of a comparison run.

use std::fmt::{self, Write};

use crate::compare::{sorted_by, ComparisonReport, PriceStatus, SortDirection, SortField};
use crate::constants::ABOVE_MARKET_REPORT_LIMIT;
use crate::types::ComparisonRow;

const RULE_WIDTH: usize = 100;

pub fn fmt_currency(value: Option<f64>, width: usize) -> String {
    match value {
        Some(v) => format!("${:>w$.2}", v, w = width.saturating_sub(1)),
        None => format!("{:>width$}", "N/A"),
    }
}

pub fn fmt_signed_currency(value: Option<f64>, width: usize) -> String {
    match value {
        Some(v) => {
            let sign = if v < 0.0 { '-' } else { '+' };
            format!("{}${:>w$.2}", sign, v.abs(), w = width.saturating_sub(2))
        }
        None => format!("{:>width$}", "N/A"),
    }
}

pub fn fmt_percent(value: Option<f64>, width: usize, show_sign: bool) -> String {
    match value {
        Some(v) if show_sign && v >= 0.0 => format!("+{:>w$.1}%", v, w = width.saturating_sub(1)),
        Some(v) => format!("{:>width$.1}%", v),
        None => format!("{:>width$}", "N/A"),
    }
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn status_label(status: Option<PriceStatus>) -> &'static str {
    match status {
        Some(PriceStatus::Below) => "BELOW",
        Some(PriceStatus::Above) => "ABOVE",
        Some(PriceStatus::Ok) => "OK",
        None => "N/A",
    }
}

/// Renders the full report: counts, flagged listings, every match and both
/// margin tables.
pub fn render_report(report: &ComparisonReport, show_usd: bool) -> String {
    let mut out = String::new();
    let _ = write_report(&mut out, report, show_usd);
    out
}

/// Renders one comparison table for an arbitrary (already filtered and
/// sorted) selection of rows, with a status column.
pub fn render_rows(report: &ComparisonReport, rows: &[ComparisonRow], show_usd: bool) -> String {
    let mut out = String::new();
    let thin = "-".repeat(RULE_WIDTH);
    let _ = write_comparison_table(&mut out, rows, show_usd, &thin, |row| {
        status_label(report.status_of(row)).to_string()
    });
    out
}

fn write_report(out: &mut String, report: &ComparisonReport, show_usd: bool) -> fmt::Result {
    let rule = "=".repeat(RULE_WIDTH);
    let thin = "-".repeat(RULE_WIDTH);
    let threshold = report.threshold_pct;
    let summary = &report.summary;

    writeln!(out, "{}", rule)?;
    writeln!(out, "PRICE COMPARISON REPORT - Shopify (CAD) vs Market (USD -> CAD)")?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Exchange Rate:            1 USD = {:.4} CAD", report.exchange_rate)?;
    writeln!(out, "Total matched by SKU:     {}", summary.total_matched)?;
    writeln!(out, "Below market (>{}%):    {}", threshold, summary.below)?;
    writeln!(out, "Above market (>{}%):    {}", threshold, summary.above)?;
    writeln!(out, "Within threshold:         {}", summary.within)?;
    writeln!(out, "Missing cost:             {}", summary.missing_cost)?;
    writeln!(out, "No market price:          {}", report.no_market_price.len())?;
    writeln!(out, "Shopify only (no match):  {}", report.merchant_only.len())?;
    writeln!(out, "Market only (not sold):   {}", report.market_only.len())?;
    writeln!(out, "{}", rule)?;

    let below = report.below_market();
    if !below.is_empty() {
        writeln!(out, "\nBELOW MARKET VALUE - Consider raising prices:")?;
        write_comparison_table(out, &below, show_usd, &thin, |row| truncate(&row.title, 30))?;
    }

    let above = report.above_market();
    if !above.is_empty() {
        writeln!(out, "\nABOVE MARKET VALUE - Competitive pricing:")?;
        let shown: Vec<ComparisonRow> = above.iter().take(ABOVE_MARKET_REPORT_LIMIT).cloned().collect();
        write_comparison_table(out, &shown, show_usd, &thin, |row| truncate(&row.title, 30))?;
        if above.len() > ABOVE_MARKET_REPORT_LIMIT {
            writeln!(out, "  ... and {} more above market", above.len() - ABOVE_MARKET_REPORT_LIMIT)?;
        }
    }

    if !report.rows.is_empty() {
        writeln!(out, "\nALL MATCHED PRODUCTS:")?;
        let all = sorted_by(&report.rows, |row| SortField::DifferencePct.value(row), SortDirection::Ascending);
        write_comparison_table(out, &all, show_usd, &thin, |row| {
            status_label(report.status_of(row)).to_string()
        })?;
    }

    if !report.merchant_only.is_empty() {
        writeln!(out, "\nSHOPIFY PRODUCTS WITHOUT MARKET MATCH:")?;
        writeln!(out, "{}", thin)?;
        for item in &report.merchant_only {
            writeln!(
                out,
                "  {:<25} {} {}  {}",
                item.sku,
                fmt_currency(item.price, 10),
                fmt_currency(item.cost, 10),
                truncate(&item.title, 45)
            )?;
        }
    }

    if !report.no_market_price.is_empty() {
        writeln!(out, "\nMATCHED BUT NO MARKET PRICE (needs price update):")?;
        writeln!(out, "{}", thin)?;
        for item in &report.no_market_price {
            writeln!(
                out,
                "  {:<25} {} {}  {}",
                item.product.sku,
                fmt_currency(item.product.price, 10),
                fmt_currency(item.product.cost, 10),
                truncate(&item.product.title, 40)
            )?;
        }
    }

    if !report.rows.is_empty() {
        write_margin_tables(out, &report.rows, show_usd, &thin)?;
    }

    Ok(())
}

fn write_comparison_table<F>(
    out: &mut String,
    rows: &[ComparisonRow],
    show_usd: bool,
    thin: &str,
    trailer: F,
) -> fmt::Result
where
    F: Fn(&ComparisonRow) -> String,
{
    writeln!(out, "{}", thin)?;
    if show_usd {
        writeln!(
            out,
            "{:<22} {:>12} {:>10} {:>11} {:>11} {:>10} {:>7}",
            "SKU", "Shopify", "Cost", "Market USD", "Market", "Diff", "%"
        )?;
    } else {
        writeln!(
            out,
            "{:<22} {:>12} {:>10} {:>12} {:>10} {:>8}",
            "SKU", "Shopify", "Cost", "Market", "Diff", "Diff %"
        )?;
    }
    writeln!(out, "{}", thin)?;

    for row in rows {
        let market = if show_usd {
            format!(
                "{} {}",
                fmt_currency(Some(row.market_price), 11),
                fmt_currency(Some(row.market_price_local), 11)
            )
        } else {
            fmt_currency(Some(row.market_price_local), 12)
        };
        writeln!(
            out,
            "{:<22} {} {} {} {} {}  {}",
            row.sku,
            fmt_currency(row.price, 12),
            fmt_currency(row.cost, 10),
            market,
            fmt_signed_currency(row.difference, 10),
            fmt_percent(row.difference_pct, 7, true),
            trailer(row)
        )?;
    }
    Ok(())
}

fn write_margin_tables(out: &mut String, rows: &[ComparisonRow], show_usd: bool, thin: &str) -> fmt::Result {
    writeln!(out, "\nSHOPIFY PROFIT SUMMARY (ALL MATCHED PRODUCTS):")?;
    writeln!(out, "{}", thin)?;
    writeln!(out, "{:<22} {:>10} {:>10} {:>10} {:>9}", "SKU", "Shopify", "Cost", "Profit", "Margin")?;
    writeln!(out, "{}", thin)?;
    let by_merchant_margin = sorted_by(rows, |row| SortField::MerchantMargin.value(row), SortDirection::Ascending);
    for row in &by_merchant_margin {
        writeln!(
            out,
            "{:<22} {} {} {} {}",
            row.sku,
            fmt_currency(row.price, 10),
            fmt_currency(row.cost, 10),
            fmt_signed_currency(row.merchant_profit, 10),
            fmt_percent(row.merchant_margin, 9, false)
        )?;
    }

    writeln!(out, "\nMARKET PROFIT SUMMARY (ALL MATCHED PRODUCTS):")?;
    writeln!(out, "{}", thin)?;
    if show_usd {
        writeln!(
            out,
            "{:<22} {:>11} {:>10} {:>10} {:>10} {:>9} {:>10}",
            "SKU", "Market USD", "Market", "Cost", "Profit", "Margin", "Per day"
        )?;
    } else {
        writeln!(
            out,
            "{:<22} {:>10} {:>10} {:>10} {:>9} {:>10}",
            "SKU", "Market", "Cost", "Profit", "Margin", "Per day"
        )?;
    }
    writeln!(out, "{}", thin)?;
    let by_market_margin = sorted_by(rows, |row| SortField::MarketMargin.value(row), SortDirection::Ascending);
    for row in &by_market_margin {
        let market = if show_usd {
            format!(
                "{} {}",
                fmt_currency(Some(row.market_price), 11),
                fmt_currency(Some(row.market_price_local), 10)
            )
        } else {
            fmt_currency(Some(row.market_price_local), 10)
        };
        writeln!(
            out,
            "{:<22} {} {} {} {} {}",
            row.sku,
            market,
            fmt_currency(row.cost, 10),
            fmt_signed_currency(row.market_profit, 10),
            fmt_percent(row.market_margin, 9, false),
            fmt_currency(row.market_profit_per_day, 10)
        )?;
    }
    Ok(())
}
