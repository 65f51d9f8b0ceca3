use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, LINK};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::error::{CompareError, Result};
use crate::parser::parse_number;
use crate::types::{MerchantProduct, ProductCatalog};

const PAGE_LIMIT: &str = "250";
const PRODUCT_FIELDS: &str = "id,title,handle,variants";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
struct ShopifyProduct {
    title: Option<String>,
    handle: Option<String>,
    #[serde(default)]
    variants: Vec<ShopifyVariant>,
}

#[derive(Debug, Deserialize)]
struct ShopifyVariant {
    sku: Option<String>,
    price: Option<Value>,
    cost: Option<Value>,
}

/// Pulls listings straight from the Shopify Admin API instead of an export file.
pub struct ShopifyClient {
    client: reqwest::Client,
    domain: String,
    token: String,
    api_version: String,
}

impl ShopifyClient {
    pub fn new(domain: &str, token: &str, api_version: &str) -> Result<Self> {
        let domain = domain.trim();
        let token = token.trim();
        if domain.is_empty() || token.is_empty() {
            return Err(CompareError::Config(
                "Shopify domain/token missing. Set them via args, env vars, or the [shopify] config section".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            domain: domain.to_string(),
            token: token.to_string(),
            api_version: api_version.trim().to_string(),
        })
    }

    pub fn products_url(&self) -> String {
        format!("https://{}/admin/api/{}/products.json", self.domain, self.api_version)
    }

    /// Walks every page of `products.json`, following the `Link` header.
    #[instrument(skip(self), fields(domain = %self.domain))]
    pub async fn fetch_products(&self) -> Result<ProductCatalog> {
        info!("Fetching Shopify products via Admin API...");
        let mut catalog = ProductCatalog::new();
        let mut url = self.products_url();
        let mut first_page = true;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("X-Shopify-Access-Token", &self.token)
                .header(ACCEPT, "application/json")
                .header(CONTENT_TYPE, "application/json");
            if first_page {
                request = request.query(&[("limit", PAGE_LIMIT), ("fields", PRODUCT_FIELDS)]);
            }

            let resp = request.send().await?;
            let status = resp.status();
            let next = next_page_url(resp.headers());
            let body = resp.text().await?;
            check_status(status, &body, &self.domain, &self.api_version)?;

            let page: ProductsPage = serde_json::from_str(&body)?;
            debug!("Shopify page with {} products", page.products.len());
            for product in page.products {
                for item in variant_products(product) {
                    catalog.insert(item);
                }
            }

            match next {
                Some(next_url) => {
                    url = next_url;
                    first_page = false;
                }
                None => break,
            }
        }

        info!("Fetched {} Shopify products with SKUs via API", catalog.len());
        Ok(catalog)
    }
}

/// One merchant product per variant that has both a SKU and a usable price.
fn variant_products(product: ShopifyProduct) -> Vec<MerchantProduct> {
    let title = product.title.unwrap_or_default().trim().to_string();
    let handle = product.handle.map(|h| h.trim().to_string()).filter(|h| !h.is_empty());

    product
        .variants
        .into_iter()
        .filter_map(|variant| {
            let sku = variant.sku.unwrap_or_default().trim().to_string();
            if sku.is_empty() {
                return None;
            }
            let price = number_field(variant.price.as_ref())?;
            Some(MerchantProduct {
                title: if title.is_empty() { sku.clone() } else { title.clone() },
                sku,
                handle: handle.clone(),
                price: Some(price),
                cost: number_field(variant.cost.as_ref()),
            })
        })
        .collect()
}

/// Shopify sends money as strings ("19.99") but tolerate plain numbers.
fn number_field(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => parse_number(s),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    parse_next_link(link)
}

fn parse_next_link(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        is_next.then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}

fn check_status(status: StatusCode, body: &str, domain: &str, api_version: &str) -> Result<()> {
    let message = match status {
        s if s.is_success() => return Ok(()),
        StatusCode::UNAUTHORIZED => "Shopify API unauthorized (401). Check that the app is installed on the store and the Admin API access token is correct.".to_string(),
        StatusCode::FORBIDDEN => "Shopify API forbidden (403). Ensure the app has read_products/read_inventory scopes and reinstall the app to apply scope changes.".to_string(),
        StatusCode::NOT_FOUND => format!(
            "Shopify API not found (404). Verify the store domain ({}) and API version ({}).",
            domain, api_version
        ),
        other => format!("Shopify request failed: {} - {}", other, body),
    };
    Err(CompareError::Api { message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn follows_next_link_only() {
        let link = r#"<https://shop.myshopify.com/admin/api/2024-07/products.json?page_info=abc&limit=250>; rel="previous", <https://shop.myshopify.com/admin/api/2024-07/products.json?page_info=def&limit=250>; rel="next""#;
        let mut headers = HeaderMap::new();
        headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://shop.myshopify.com/admin/api/2024-07/products.json?page_info=def&limit=250")
        );

        assert_eq!(parse_next_link(r#"<https://x/p?page_info=a>; rel="previous""#), None);
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }

    #[test]
    fn variants_without_sku_or_price_are_skipped() {
        let product: ShopifyProduct = serde_json::from_value(json!({
            "id": 1,
            "title": " Paldea Evolved ETB ",
            "handle": "paldea-etb",
            "variants": [
                {"sku": "PAL-ETB", "price": "59.99", "cost": "41.00"},
                {"sku": "", "price": "10.00"},
                {"sku": "PAL-ETB-2", "price": "n/a"},
                {"sku": "PAL-ETB-3", "price": 60, "cost": "?"}
            ]
        }))
        .unwrap();

        let items = variant_products(product);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Paldea Evolved ETB");
        assert_eq!(items[0].price, Some(59.99));
        assert_eq!(items[0].cost, Some(41.0));
        assert_eq!(items[0].handle.as_deref(), Some("paldea-etb"));
        assert_eq!(items[1].price, Some(60.0));
        assert_eq!(items[1].cost, None);
    }

    #[test]
    fn untitled_product_uses_sku() {
        let product: ShopifyProduct =
            serde_json::from_value(json!({"title": null, "variants": [{"sku": "X1", "price": "1"}]})).unwrap();
        assert_eq!(variant_products(product)[0].title, "X1");
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        assert!(matches!(ShopifyClient::new("", "tok", "2024-07"), Err(CompareError::Config(_))));
    }

    #[test]
    fn auth_errors_explain_the_fix() {
        let err = check_status(StatusCode::NOT_FOUND, "", "shop.myshopify.com", "2024-07").unwrap_err();
        assert!(err.to_string().contains("shop.myshopify.com"));
        assert!(check_status(StatusCode::OK, "", "d", "v").is_ok());
    }
}
