use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::types::ComparisonRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// A comparable value pulled out of a row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortValue::Text(a), SortValue::Text(b)) => compare_text(a, b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Case-insensitive ordering. Values differing only by case compare equal,
/// so the stable sort keeps their input order.
///
/// Known limitation: this folds case per character and compares code points,
/// it is not a locale collation. Accented letters (`é`) sort after `z`.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Orders two optional values. Missing values go last in either direction;
/// the direction only flips the comparison of two present values.
pub fn compare_optional(a: Option<SortValue<'_>>, b: Option<SortValue<'_>>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => direction.apply(x.compare(&y)),
    }
}

/// Returns a stably sorted copy of `items`, keyed by `accessor`.
pub fn sorted_by<T, F>(items: &[T], accessor: F, direction: SortDirection) -> Vec<T>
where
    T: Clone,
    F: for<'a> Fn(&'a T) -> Option<SortValue<'a>>,
{
    let mut out = items.to_vec();
    out.sort_by(|a, b| compare_optional(accessor(a), accessor(b), direction));
    out
}

/// Every column of the comparison and margin tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Sku,
    Title,
    Price,
    Cost,
    MarketPrice,
    MarketPriceLocal,
    Difference,
    DifferencePct,
    MerchantProfit,
    MerchantMargin,
    MarketProfit,
    MarketMargin,
    MarketProfitPerDay,
    SetName,
    Category,
    LastUpdated,
    ReleaseDate,
}

impl SortField {
    pub const ALL: [SortField; 17] = [
        SortField::Sku,
        SortField::Title,
        SortField::Price,
        SortField::Cost,
        SortField::MarketPrice,
        SortField::MarketPriceLocal,
        SortField::Difference,
        SortField::DifferencePct,
        SortField::MerchantProfit,
        SortField::MerchantMargin,
        SortField::MarketProfit,
        SortField::MarketMargin,
        SortField::MarketProfitPerDay,
        SortField::SetName,
        SortField::Category,
        SortField::LastUpdated,
        SortField::ReleaseDate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SortField::Sku => "sku",
            SortField::Title => "title",
            SortField::Price => "price",
            SortField::Cost => "cost",
            SortField::MarketPrice => "market-price",
            SortField::MarketPriceLocal => "market-price-local",
            SortField::Difference => "difference",
            SortField::DifferencePct => "difference-pct",
            SortField::MerchantProfit => "merchant-profit",
            SortField::MerchantMargin => "merchant-margin",
            SortField::MarketProfit => "market-profit",
            SortField::MarketMargin => "market-margin",
            SortField::MarketProfitPerDay => "market-profit-per-day",
            SortField::SetName => "set-name",
            SortField::Category => "category",
            SortField::LastUpdated => "last-updated",
            SortField::ReleaseDate => "release-date",
        }
    }

    pub fn value(self, row: &ComparisonRow) -> Option<SortValue<'_>> {
        fn text(v: &Option<String>) -> Option<SortValue<'_>> {
            v.as_deref().map(SortValue::Text)
        }
        let num = |v: Option<f64>| v.map(SortValue::Number);
        match self {
            SortField::Sku => Some(SortValue::Text(&row.sku)),
            SortField::Title => Some(SortValue::Text(&row.title)),
            SortField::Price => num(row.price),
            SortField::Cost => num(row.cost),
            SortField::MarketPrice => num(Some(row.market_price)),
            SortField::MarketPriceLocal => num(Some(row.market_price_local)),
            SortField::Difference => num(row.difference),
            SortField::DifferencePct => num(row.difference_pct),
            SortField::MerchantProfit => num(row.merchant_profit),
            SortField::MerchantMargin => num(row.merchant_margin),
            SortField::MarketProfit => num(row.market_profit),
            SortField::MarketMargin => num(row.market_margin),
            SortField::MarketProfitPerDay => num(row.market_profit_per_day),
            SortField::SetName => text(&row.set_name),
            SortField::Category => text(&row.category),
            SortField::LastUpdated => text(&row.last_updated),
            SortField::ReleaseDate => row.release_date_ms.map(|ms| SortValue::Number(ms as f64)),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        SortField::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = SortField::ALL.iter().map(|f| f.name()).collect();
                format!("unknown sort field '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: SortField) -> Self {
        Self { field, direction: SortDirection::Ascending }
    }

    pub fn descending(field: SortField) -> Self {
        Self { field, direction: SortDirection::Descending }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::ascending(SortField::DifferencePct)
    }
}

/// Case-insensitive match on SKU or title; an empty filter matches everything.
pub fn matches_filter(row: &ComparisonRow, filter: &str) -> bool {
    let needle = filter.trim().to_lowercase();
    needle.is_empty() || row.sku.to_lowercase().contains(&needle) || row.title.to_lowercase().contains(&needle)
}

/// Filters then sorts, leaving `rows` untouched.
pub fn filter_and_sort(rows: &[ComparisonRow], filter: &str, spec: SortSpec) -> Vec<ComparisonRow> {
    let filtered: Vec<ComparisonRow> = rows.iter().filter(|row| matches_filter(row, filter)).cloned().collect();
    sorted_by(&filtered, |row| spec.field.value(row), spec.direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sku: &str, title: &str, pct: Option<f64>) -> ComparisonRow {
        ComparisonRow {
            sku: sku.to_string(),
            title: title.to_string(),
            price: Some(10.0),
            cost: None,
            market_price: 10.0,
            market_price_local: 10.0,
            difference: pct.map(|p| p / 10.0),
            difference_pct: pct,
            merchant_profit: None,
            merchant_margin: None,
            market_profit: None,
            market_margin: None,
            market_profit_per_day: None,
            set_name: None,
            category: None,
            last_updated: None,
            release_date: None,
            release_date_ms: None,
        }
    }

    fn skus(rows: &[ComparisonRow]) -> Vec<&str> {
        rows.iter().map(|r| r.sku.as_str()).collect()
    }

    fn sample() -> Vec<ComparisonRow> {
        vec![
            row("A", "Elite Trainer Box", Some(5.0)),
            row("B", "booster bundle", None),
            row("C", "Booster Box", Some(-3.0)),
            row("D", "Tin", None),
            row("E", "Collection", Some(12.0)),
        ]
    }

    #[test]
    fn nulls_sort_last_in_both_directions() {
        let rows = sample();
        let asc = filter_and_sort(&rows, "", SortSpec::ascending(SortField::DifferencePct));
        assert_eq!(skus(&asc), vec!["C", "A", "E", "B", "D"]);

        let desc = filter_and_sort(&rows, "", SortSpec::descending(SortField::DifferencePct));
        assert_eq!(skus(&desc), vec!["E", "A", "C", "B", "D"]);
    }

    #[test]
    fn sorting_is_idempotent_and_input_untouched() {
        let rows = sample();
        let spec = SortSpec::descending(SortField::Title);
        let once = filter_and_sort(&rows, "", spec);
        let twice = filter_and_sort(&once, "", spec);
        assert_eq!(once, twice);
        assert_eq!(skus(&rows), vec!["A", "B", "C", "D", "E"]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let rows = sample();
        let asc = filter_and_sort(&rows, "", SortSpec::ascending(SortField::Title));
        assert_eq!(skus(&asc), vec!["C", "B", "E", "A", "D"]);
    }

    #[test]
    fn case_only_differences_keep_input_order() {
        assert_eq!(
            compare_optional(Some(SortValue::Text("box")), Some(SortValue::Text("Box")), SortDirection::Ascending),
            Ordering::Equal
        );

        let rows = vec![
            row("A", "box", None),
            row("B", "Box", None),
            row("C", "BOX", None),
            row("D", "Tin", None),
        ];
        let asc = filter_and_sort(&rows, "", SortSpec::ascending(SortField::Title));
        assert_eq!(skus(&asc), vec!["A", "B", "C", "D"]);

        let desc = filter_and_sort(&rows, "", SortSpec::descending(SortField::Title));
        assert_eq!(skus(&desc), vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn filter_matches_sku_or_title_case_insensitively() {
        let rows = sample();
        let hits = filter_and_sort(&rows, "BOOSTER", SortSpec::ascending(SortField::Sku));
        assert_eq!(skus(&hits), vec!["B", "C"]);

        let by_sku = filter_and_sort(&rows, "e", SortSpec::ascending(SortField::Sku));
        assert_eq!(skus(&by_sku), vec!["A", "B", "C", "E"]);
    }

    #[test]
    fn compare_optional_keeps_ties() {
        assert_eq!(compare_optional(None, None, SortDirection::Descending), Ordering::Equal);
        assert_eq!(
            compare_optional(None, Some(SortValue::Number(1.0)), SortDirection::Descending),
            Ordering::Greater
        );
        assert_eq!(
            compare_optional(Some(SortValue::Number(1.0)), Some(SortValue::Number(2.0)), SortDirection::Descending),
            Ordering::Greater
        );
    }

    #[test]
    fn sort_field_parses_cli_names() {
        assert_eq!("difference-pct".parse::<SortField>().unwrap(), SortField::DifferencePct);
        assert_eq!("market_profit_per_day".parse::<SortField>().unwrap(), SortField::MarketProfitPerDay);
        assert!("volume".parse::<SortField>().is_err());
        for field in SortField::ALL {
            assert_eq!(field.to_string().parse::<SortField>().unwrap(), field);
        }
    }
}
