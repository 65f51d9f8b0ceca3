//! Text parsing for merchant price exports.
//!
//! [`parse_delimited`] turns raw comma-separated text into rows of fields;
//! [`products`] maps those rows onto [`MerchantProduct`](crate::types::MerchantProduct)
//! records.

pub mod products;

pub use products::{extract_products, parse_product_export, parse_number};

/// Splits comma-separated text into rows of fields.
///
/// A double quote opening a field enters quote mode; anywhere else in an
/// unquoted field it is kept as a literal character. Inside quotes `""` is a
/// literal quote, and commas and newlines are kept. Carriage returns are
/// dropped so both line-ending conventions parse the same. A final row is
/// emitted even without a trailing newline.
pub fn parse_delimited(text: &str) -> Vec<Vec<String>> {
    let chars: Vec<char> = text.chars().collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_started = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' if in_quotes => {
                if chars.get(i + 1) == Some(&'"') {
                    field.push('"');
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
            '"' if !field_started => {
                in_quotes = true;
                field_started = true;
            }
            '\r' => {}
            ',' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                field_started = false;
            }
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
                field_started = false;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
        i += 1;
    }

    if field_started || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}
