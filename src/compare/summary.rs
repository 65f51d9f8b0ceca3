use serde::Serialize;

use crate::types::ComparisonRow;

/// Where a listing sits relative to the market price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceStatus {
    Below,
    Above,
    Ok,
}

impl PriceStatus {
    /// Classifies a difference percentage against `threshold_pct`.
    /// Rows without a percentage have no status.
    pub fn classify(difference_pct: Option<f64>, threshold_pct: f64) -> Option<Self> {
        let pct = difference_pct?;
        Some(if pct < -threshold_pct {
            PriceStatus::Below
        } else if pct > threshold_pct {
            PriceStatus::Above
        } else {
            PriceStatus::Ok
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceStatus::Below => "BELOW MARKET",
            PriceStatus::Above => "ABOVE MARKET",
            PriceStatus::Ok => "OK",
        }
    }
}

/// Aggregate counts over matched rows.
///
/// `below`, `above` and `within` skip rows without a difference percentage,
/// and `missing_cost` is counted on its own, so the buckets need not add up
/// to `total_matched`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub total_matched: usize,
    pub below: usize,
    pub above: usize,
    pub within: usize,
    pub missing_cost: usize,
}

pub fn summarize(rows: &[ComparisonRow], threshold_pct: f64) -> ComparisonSummary {
    let mut summary = ComparisonSummary {
        total_matched: rows.len(),
        ..Default::default()
    };
    for row in rows {
        match PriceStatus::classify(row.difference_pct, threshold_pct) {
            Some(PriceStatus::Below) => summary.below += 1,
            Some(PriceStatus::Above) => summary.above += 1,
            Some(PriceStatus::Ok) => summary.within += 1,
            None => {}
        }
        if row.cost.is_none() {
            summary.missing_cost += 1;
        }
    }
    summary
}
