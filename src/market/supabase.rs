use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

use crate::constants::{EXCHANGE_RATES_TABLE, EXCHANGE_RATE_SELECT, PRODUCTS_SELECT, PRODUCTS_TABLE};
use crate::error::{CompareError, Result};
use crate::types::{ExchangeRate, MarketIndex};

use super::{index_rows, MarketDataSource, ProductRow};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Reads market prices and exchange rates from the Supabase REST API.
pub struct SupabaseMarketSource {
    client: reqwest::Client,
    base_url: String,
    key: String,
}

impl SupabaseMarketSource {
    pub fn new(url: &str, key: &str) -> Result<Self> {
        let base_url = url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() || key.trim().is_empty() {
            return Err(CompareError::Config(
                "Supabase url/key missing. Set SUPABASE_URL and SUPABASE_KEY or the [supabase] config section".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url,
            key: key.trim().to_string(),
        })
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.table_url(table);
        debug!("GET {} {:?}", url, query);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        check_status(status, &body)?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Maps a PostgREST response status onto our error type.
fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::PAYMENT_REQUIRED || body.to_lowercase().contains("quota") {
        error!("Supabase storage quota exceeded. Please resolve at https://supabase.help");
        return Err(CompareError::QuotaExceeded);
    }
    Err(CompareError::Api {
        message: format!("Supabase request failed: {} - {}", status, body),
    })
}

#[async_trait]
impl MarketDataSource for SupabaseMarketSource {
    #[instrument(skip(self))]
    async fn fetch_market_records(&self) -> Result<MarketIndex> {
        info!("Fetching market prices from Supabase...");
        let rows: Vec<ProductRow> = self
            .select(PRODUCTS_TABLE, &[("select", PRODUCTS_SELECT), ("sku", "not.is.null")])
            .await?;
        let index = index_rows(rows);
        info!("Fetched {} market products with SKUs", index.len());
        Ok(index)
    }

    #[instrument(skip(self))]
    async fn fetch_exchange_rate(&self) -> Result<Option<ExchangeRate>> {
        info!("Fetching latest USD/CAD exchange rate...");
        let rows: Vec<ExchangeRate> = self
            .select(
                EXCHANGE_RATES_TABLE,
                &[
                    ("select", EXCHANGE_RATE_SELECT),
                    ("order", "recorded_at.desc"),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_credentials() {
        assert!(matches!(SupabaseMarketSource::new("", "key"), Err(CompareError::Config(_))));
        assert!(matches!(
            SupabaseMarketSource::new("https://abc.supabase.co", " "),
            Err(CompareError::Config(_))
        ));
    }

    #[test]
    fn builds_rest_urls_without_double_slash() {
        let source = SupabaseMarketSource::new("https://abc.supabase.co/", "key").unwrap();
        assert_eq!(source.table_url("products"), "https://abc.supabase.co/rest/v1/products");
    }

    #[test]
    fn quota_responses_map_to_quota_error() {
        assert!(matches!(
            check_status(StatusCode::PAYMENT_REQUIRED, ""),
            Err(CompareError::QuotaExceeded)
        ));
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, "Storage Quota exceeded"),
            Err(CompareError::QuotaExceeded)
        ));
        assert!(matches!(
            check_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            Err(CompareError::Api { .. })
        ));
        assert!(check_status(StatusCode::OK, "[]").is_ok());
    }

    #[tokio::test]
    async fn truncated_body_is_an_http_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\n\r\n[")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let source = SupabaseMarketSource::new(&format!("http://{}", addr), "key").unwrap();
        let result = source.fetch_market_records().await;
        assert!(matches!(result, Err(CompareError::Http(_))), "got {:?}", result.err());
    }

    #[test]
    fn exchange_rate_rows_deserialize() {
        let rows: Vec<ExchangeRate> =
            serde_json::from_str(r#"[{"usd_to_cad": 1.3654, "recorded_at": "2024-05-01T12:00:00+00:00"}]"#).unwrap();
        assert_eq!(rows[0].usd_to_cad, 1.3654);
    }
}
