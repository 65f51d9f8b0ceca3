use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A listing from the merchant's own store, priced in local currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantProduct {
    pub sku: String,
    pub title: String,
    pub handle: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
}

/// Market data for a SKU, priced in the reference currency (USD)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    pub sku: String,
    pub market_price: Option<f64>,
    pub set_name: Option<String>,
    pub release_date: Option<String>,
    pub category: Option<String>,
    pub last_updated: Option<String>,
}

/// Market records keyed by SKU
pub type MarketIndex = HashMap<String, MarketRecord>;

/// Most recent stored USD -> CAD rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub usd_to_cad: f64,
    pub recorded_at: Option<String>,
}

/// One matched SKU with every derived figure the dashboard tables show.
///
/// Monetary fields other than `market_price` are in local currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub sku: String,
    pub title: String,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub market_price: f64,
    pub market_price_local: f64,
    pub difference: Option<f64>,
    pub difference_pct: Option<f64>,
    pub merchant_profit: Option<f64>,
    pub merchant_margin: Option<f64>,
    pub market_profit: Option<f64>,
    pub market_margin: Option<f64>,
    pub market_profit_per_day: Option<f64>,
    pub set_name: Option<String>,
    pub category: Option<String>,
    pub last_updated: Option<String>,
    pub release_date: Option<String>,
    pub release_date_ms: Option<i64>,
}

/// Merchant products keyed by SKU, kept in first-seen order.
///
/// Inserting an existing SKU replaces the stored product in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductCatalog {
    products: Vec<MerchantProduct>,
    index: HashMap<String, usize>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, product: MerchantProduct) {
        match self.index.get(&product.sku) {
            Some(&pos) => self.products[pos] = product,
            None => {
                self.index.insert(product.sku.clone(), self.products.len());
                self.products.push(product);
            }
        }
    }

    pub fn get(&self, sku: &str) -> Option<&MerchantProduct> {
        self.index.get(sku).map(|&pos| &self.products[pos])
    }

    pub fn contains(&self, sku: &str) -> bool {
        self.index.contains_key(sku)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MerchantProduct> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<MerchantProduct> for ProductCatalog {
    fn from_iter<I: IntoIterator<Item = MerchantProduct>>(iter: I) -> Self {
        let mut catalog = ProductCatalog::new();
        for product in iter {
            catalog.insert(product);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sku: &str, price: f64) -> MerchantProduct {
        MerchantProduct {
            sku: sku.to_string(),
            title: sku.to_string(),
            handle: None,
            price: Some(price),
            cost: None,
        }
    }

    #[test]
    fn duplicate_sku_overwrites_in_place() {
        let catalog: ProductCatalog = vec![product("A", 1.0), product("B", 2.0), product("A", 3.0)]
            .into_iter()
            .collect();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("A").unwrap().price, Some(3.0));
        let order: Vec<&str> = catalog.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(order, vec!["A", "B"]);
    }
}
