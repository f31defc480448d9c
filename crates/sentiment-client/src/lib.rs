use std::time::Duration;

use async_trait::async_trait;
use pipeline_core::{PipelineError, SentimentLabel, SentimentScorer, SentimentVerdict};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// The scoring model truncates anyway; sending more is wasted bandwidth.
const MAX_TEXT_CHARS: usize = 10_000;

const FALLBACK_TICKER: &str = "GENERAL MARKET";

/// Client for the FinBERT-style sentiment microservice.
///
/// One endpoint: `POST <base>/analyze` with `{text, ticker}`, answering
/// `{sentiment, sentiment_score}`. The HTTP client carries a hard request
/// timeout so a wedged model service can never stall a caller indefinitely.
#[derive(Clone)]
pub struct SentimentClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    text: String,
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    sentiment_score: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl SentimentClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, base_url }
    }

    /// Score `text` in the context of `ticker`.
    ///
    /// Empty text is rejected before any network call. Everything else that
    /// goes wrong (transport, timeout, non-success status, unparseable body)
    /// is a `Transient` failure; degrading it to neutral is the enrichment
    /// stage's decision, not this client's.
    pub async fn analyze_sentiment(
        &self,
        text: &str,
        ticker: &str,
    ) -> Result<SentimentVerdict, PipelineError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::Validation("Text cannot be empty".to_string()));
        }

        let clean_text: String = trimmed.chars().take(MAX_TEXT_CHARS).collect();
        let clean_ticker = {
            let t = ticker.trim();
            if t.is_empty() {
                FALLBACK_TICKER.to_string()
            } else {
                t.to_uppercase()
            }
        };

        tracing::debug!(
            ticker = %clean_ticker,
            chars = clean_text.len(),
            "analyzing sentiment"
        );

        let response = self
            .client
            .post(format!("{}/analyze", self.base_url))
            .json(&AnalyzeRequest {
                text: clean_text,
                ticker: clean_ticker,
            })
            .send()
            .await
            .map_err(|e| PipelineError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Transient(format!(
                "sentiment service HTTP {}",
                response.status()
            )));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Transient(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(PipelineError::Transient(format!(
                "sentiment service error: {err}"
            )));
        }

        let label = match body.sentiment.as_deref() {
            Some("positive") => SentimentLabel::Positive,
            Some("negative") => SentimentLabel::Negative,
            Some("neutral") => SentimentLabel::Neutral,
            other => {
                return Err(PipelineError::Transient(format!(
                    "unrecognized sentiment label: {other:?}"
                )))
            }
        };

        // The model reports a signed score; direction already lives in the
        // label, so only the magnitude is kept.
        let score = body.sentiment_score.unwrap_or(0.0).abs();

        Ok(SentimentVerdict::new(label, score))
    }
}

#[async_trait]
impl SentimentScorer for SentimentClient {
    async fn analyze(&self, text: &str, ticker: &str) -> Result<SentimentVerdict, PipelineError> {
        self.analyze_sentiment(text, ticker).await
    }
}
