use std::time::Duration;

use async_trait::async_trait;
use pipeline_core::{PipelineError, QuoteProvider, QuoteSnapshot, SymbolSuggestion};
use reqwest::Client;
use serde::Deserialize;

const BASE_URL: &str = "https://query1.finance.yahoo.com";

/// At most this many suggestions are returned from a search.
const MAX_SUGGESTIONS: usize = 10;

/// Client for the Yahoo Finance quote and search endpoints.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: Client,
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    /// Base URL override, used by tests against a local mock server.
    pub fn with_base_url(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (StockSense)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { base_url, client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, PipelineError> {
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| PipelineError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Transient(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::Transient(e.to_string()))
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, PipelineError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let body: QuoteEnvelope = self.get_json(url, &[("symbols", symbol)]).await?;

        let result = body
            .quote_response
            .and_then(|r| r.result.into_iter().next())
            .ok_or_else(|| {
                PipelineError::Transient(format!("no quote data for symbol {symbol}"))
            })?;

        Ok(QuoteSnapshot {
            symbol: result.symbol.unwrap_or_else(|| symbol.to_uppercase()),
            name: result.short_name,
            price: result.regular_market_price,
            currency: result.currency,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<SymbolSuggestion>, PipelineError> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let body: SearchEnvelope = self.get_json(url, &[("q", query)]).await?;

        // Entries without both a symbol and a short name are index/fund noise
        // the suggestions dropdown can't render.
        Ok(body
            .quotes
            .into_iter()
            .filter_map(|q| {
                Some(SymbolSuggestion {
                    symbol: q.symbol?,
                    name: q.shortname?,
                })
            })
            .take(MAX_SUGGESTIONS)
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: Option<QuoteResponse>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<QuoteResult>,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    symbol: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
}
