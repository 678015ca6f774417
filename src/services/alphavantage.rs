use crate::constants::ALPHAVANTAGE_BASE_URL;
use crate::error::{Error, Result};
use crate::models::TickerQuery;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Source of raw time series CSV for a query
#[async_trait]
pub trait CsvSource: Send + Sync {
    async fn fetch_csv(&self, query: &TickerQuery) -> Result<Vec<u8>>;
}

/// Client for the Alpha Vantage time series endpoints
pub struct AlphaVantageClient {
    base_url: String,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    /// Create a client against the public endpoint
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(ALPHAVANTAGE_BASE_URL, timeout)
    }

    /// Create a client against `base_url` (a mirror or proxy of the public API)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "Invalid base_url: must start with http:// or https://, got: '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(base_url = %base_url, timeout_s = timeout.as_secs(), "Created Alpha Vantage client");

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CsvSource for AlphaVantageClient {
    async fn fetch_csv(&self, query: &TickerQuery) -> Result<Vec<u8>> {
        let url = query.url(&self.base_url);
        debug!(symbol = query.symbol(), function = query.function(), "Sending request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            // reqwest errors carry the URL, which carries the api key
            .map_err(|e| Error::Fetch(format!("failed to get response from url: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!(
                "returned non-200 status code '{}' and status '{}'",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read data: {}", e.without_url())))?;

        check_for_api_message(&body)?;
        Ok(body.to_vec())
    }
}

/// Alpha Vantage answers rate limiting and unknown symbols with HTTP 200 and a
/// JSON object, even when CSV was requested.
pub fn check_for_api_message(body: &[u8]) -> Result<()> {
    let first = body.iter().find(|b| !b.is_ascii_whitespace());
    if first != Some(&b'{') {
        return Ok(());
    }

    let message = serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(body)
        .ok()
        .and_then(|map| {
            ["Error Message", "Note", "Information"]
                .iter()
                .find_map(|key| map.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| "unexpected JSON response instead of CSV".to_string());

    Err(Error::Fetch(format!("upstream API message: {}", message)))
}
