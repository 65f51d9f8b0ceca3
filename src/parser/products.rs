use std::collections::HashMap;
use tracing::{debug, info};

use crate::constants::{COST_HEADER, HANDLE_HEADER, PRICE_HEADER, REQUIRED_HEADERS, SKU_HEADER, TITLE_HEADER};
use crate::error::MissingColumnsError;
use crate::types::{MerchantProduct, ProductCatalog};

use super::parse_delimited;

/// Parses a trimmed decimal; blanks and non-finite values are absent.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a Shopify product export into a catalog.
pub fn parse_product_export(text: &str) -> Result<ProductCatalog, MissingColumnsError> {
    extract_products(&parse_delimited(text))
}

/// Builds merchant products from parsed rows whose first row is the header.
///
/// Rows with a blank SKU or an unusable price are skipped. A later row with
/// the same SKU replaces the earlier one.
pub fn extract_products(rows: &[Vec<String>]) -> Result<ProductCatalog, MissingColumnsError> {
    let Some((header, body)) = rows.split_first() else {
        return Err(missing_columns());
    };
    let columns = HeaderIndex::new(header);

    let (Some(sku_col), Some(price_col)) = (columns.get(SKU_HEADER), columns.get(PRICE_HEADER)) else {
        return Err(missing_columns());
    };
    let title_col = columns.get(TITLE_HEADER);
    let cost_col = columns.get(COST_HEADER);
    let handle_col = columns.get(HANDLE_HEADER);

    let mut catalog = ProductCatalog::new();
    let mut skipped = 0usize;

    for row in body {
        let cell = |col: Option<usize>| col.and_then(|c| row.get(c)).map(|v| v.trim()).unwrap_or("");

        let sku = cell(Some(sku_col));
        if sku.is_empty() {
            skipped += 1;
            continue;
        }
        let Some(price) = parse_number(cell(Some(price_col))) else {
            skipped += 1;
            continue;
        };

        let title = match cell(title_col) {
            "" => sku,
            t => t,
        };
        let handle = Some(cell(handle_col)).filter(|h| !h.is_empty()).map(str::to_string);

        catalog.insert(MerchantProduct {
            sku: sku.to_string(),
            title: title.to_string(),
            handle,
            price: Some(price),
            cost: parse_number(cell(cost_col)),
        });
    }

    debug!("Skipped {} export rows without SKU or price", skipped);
    info!("Loaded {} merchant products with SKUs", catalog.len());
    Ok(catalog)
}

fn missing_columns() -> MissingColumnsError {
    MissingColumnsError {
        required: REQUIRED_HEADERS.iter().map(|h| h.to_string()).collect(),
    }
}

/// Header name -> column position
struct HeaderIndex(HashMap<String, usize>);

impl HeaderIndex {
    fn new(header: &[String]) -> Self {
        let map = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();
        Self(map)
    }

    fn get(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_shopify_scenario_row() {
        let catalog =
            parse_product_export("Variant SKU,Title,Variant Price,Cost per item\nABC123,Widget,19.99,10.00\n")
                .unwrap();

        assert_eq!(catalog.len(), 1);
        let product = catalog.get("ABC123").unwrap();
        assert_eq!(product.title, "Widget");
        assert_eq!(product.price, Some(19.99));
        assert_eq!(product.cost, Some(10.00));
        assert_eq!(product.handle, None);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = parse_product_export("Variant SKU,Title\nABC,Widget\n").unwrap_err();
        assert_eq!(err.required, vec!["Variant SKU", "Variant Price"]);

        assert!(parse_product_export("").is_err());
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let catalog = parse_product_export("Variant Price,Variant SKU\n5,S1\n").unwrap();
        let product = catalog.get("S1").unwrap();
        assert_eq!(product.title, "S1");
        assert_eq!(product.cost, None);
        assert_eq!(product.price, Some(5.0));
    }

    #[test]
    fn skips_blank_sku_and_bad_price() {
        let text = "Handle,Variant SKU,Title,Variant Price\n\
                    img-row,,,\n\
                    etb,S1,Elite Trainer Box,abc\n\
                    etb,S2,Booster Bundle, 42.50 \n\
                    etb,S3,Tin,NaN\n";
        let catalog = parse_product_export(text).unwrap();

        assert_eq!(catalog.len(), 1);
        let product = catalog.get("S2").unwrap();
        assert_eq!(product.price, Some(42.5));
        assert_eq!(product.handle.as_deref(), Some("etb"));
    }

    #[test]
    fn short_rows_and_bad_cost_degrade_to_none() {
        let text = "Variant SKU,Variant Price,Cost per item,Title\nS1,10,n/a\nS2,12\n";
        let catalog = parse_product_export(text).unwrap();
        assert_eq!(catalog.get("S1").unwrap().cost, None);
        assert_eq!(catalog.get("S2").unwrap().title, "S2");
    }

    #[test]
    fn later_duplicate_wins() {
        let text = "Variant SKU,Variant Price\nS1,10\nS1,11\n";
        let catalog = parse_product_export(text).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("S1").unwrap().price, Some(11.0));
    }

    #[test]
    fn byte_order_mark_on_first_header_is_ignored() {
        let catalog = parse_product_export("\u{feff}Variant SKU,Variant Price\nS1,3\n").unwrap();
        assert!(catalog.contains("S1"));
    }

    #[test]
    fn parse_number_rejects_non_finite() {
        assert_eq!(parse_number(" 1.5 "), Some(1.5));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("12abc"), None);
    }
}
