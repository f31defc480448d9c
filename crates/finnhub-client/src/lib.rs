use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pipeline_core::{NewsItem, NewsProvider, PipelineError};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests,
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let wait_until = ts.front().copied().map(|f| f + self.window).unwrap_or(now);
            let sleep_dur = wait_until.duration_since(now) + Duration::from_millis(50);
            drop(ts);
            tracing::debug!(
                "Rate limiter: waiting {:.1}s for Finnhub API slot",
                sleep_dur.as_secs_f64()
            );
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Client for the Finnhub news endpoints.
#[derive(Clone)]
pub struct FinnhubClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        // Free tier allows 60 req/min. Paid users can raise FINNHUB_RATE_LIMIT.
        let rate_limit: usize = std::env::var("FINNHUB_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self::with_base_url(api_key, BASE_URL.to_string(), rate_limit)
    }

    /// Base URL override, used by tests against a local mock server.
    pub fn with_base_url(api_key: String, base_url: String, rate_limit: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url,
            client,
            rate_limiter: RateLimiter::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, PipelineError> {
        let request = builder
            .build()
            .map_err(|e| PipelineError::Transient(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| PipelineError::Transient("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| PipelineError::Transient(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            let wait_secs = 5u64;
            tracing::warn!(
                "Finnhub 429 rate limited, waiting {}s before retry {}/3",
                wait_secs,
                attempt + 1
            );
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(PipelineError::Transient(
            "Rate limited by Finnhub after 3 retries".to_string(),
        ))
    }

    async fn fetch_news(&self, url: String, query: Vec<(&str, String)>) -> Result<Vec<NewsItem>, PipelineError> {
        let response = self
            .send_request(self.client.get(&url).query(&query))
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::Transient(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let articles: Vec<FinnhubArticle> = response
            .json()
            .await
            .map_err(|e| PipelineError::Transient(e.to_string()))?;

        Ok(articles.into_iter().map(FinnhubArticle::into_news_item).collect())
    }
}

#[async_trait]
impl NewsProvider for FinnhubClient {
    async fn latest_by_category(&self, category: &str) -> Result<Vec<NewsItem>, PipelineError> {
        let url = format!("{}/news", self.base_url);
        self.fetch_news(
            url,
            vec![
                ("category", category.to_string()),
                ("token", self.api_key.clone()),
            ],
        )
        .await
    }

    async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsItem>, PipelineError> {
        let url = format!("{}/company-news", self.base_url);
        self.fetch_news(
            url,
            vec![
                ("symbol", symbol.to_uppercase()),
                ("from", from.format("%Y-%m-%d").to_string()),
                ("to", to.format("%Y-%m-%d").to_string()),
                ("token", self.api_key.clone()),
            ],
        )
        .await
    }
}

// Finnhub wire format. `related` is a comma-separated symbol list and `id`
// is numeric; both are normalized on the way in.
#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    related: Option<String>,
}

impl FinnhubArticle {
    fn into_news_item(self) -> NewsItem {
        NewsItem {
            id: self.id.map(|n| n.to_string()),
            headline: self.headline.filter(|s| !s.is_empty()),
            summary: self.summary.filter(|s| !s.is_empty()),
            source: self.source.unwrap_or_else(|| "Finnhub".to_string()),
            datetime: self.datetime,
            url: self.url.filter(|s| !s.is_empty()),
            image: self.image.filter(|s| !s.is_empty()),
            category: self.category,
            related: self
                .related
                .map(|r| {
                    r.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_uppercase())
                        .collect()
                })
                .unwrap_or_default(),
            sentiment: None,
        }
    }
}
