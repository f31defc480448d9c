use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use pipeline_core::{NewsItem, NewsProvider, PipelineError, TickerFailure};
use serde::Serialize;

/// Pagination increment for "load more".
pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Look-back window for per-ticker fetches.
    pub window_days: i64,
    /// Upper bound on a single provider call. One hung ticker must not stall
    /// the whole batch; a fetch that exceeds this becomes a per-ticker
    /// failure like any other.
    pub fetch_timeout: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            fetch_timeout: Duration::from_secs(15),
        }
    }
}

/// A merged, time-ordered, deduplicated batch of news with a pagination
/// cursor and the per-ticker fetch outcomes that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedNews {
    pub items: Vec<NewsItem>,
    /// Tickers whose fetch failed. These degrade the batch, they don't fail
    /// it; the batch as a whole errors only when every fetch failed.
    pub failed: Vec<TickerFailure>,
    visible: usize,
}

impl AggregatedNews {
    fn new(items: Vec<NewsItem>, failed: Vec<TickerFailure>) -> Self {
        let visible = PAGE_SIZE.min(items.len());
        Self {
            items,
            failed,
            visible,
        }
    }

    pub fn visible_count(&self) -> usize {
        self.visible
    }

    /// The currently-paged prefix of the batch.
    pub fn visible_items(&self) -> &[NewsItem] {
        &self.items[..self.visible]
    }

    /// Advance the pagination cursor by one page, capped at the batch length.
    ///
    /// This pages through the already-fetched batch only. If the provider
    /// truncated its response there is nothing further to reveal and no
    /// refetch is attempted.
    pub fn load_more(&mut self) {
        self.visible = (self.visible + PAGE_SIZE).min(self.items.len());
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Fans per-ticker news fetches out to the provider and folds the results
/// into one [`AggregatedNews`].
pub struct NewsAggregator {
    provider: Arc<dyn NewsProvider>,
    config: AggregatorConfig,
}

impl NewsAggregator {
    pub fn new(provider: Arc<dyn NewsProvider>) -> Self {
        Self::with_config(provider, AggregatorConfig::default())
    }

    pub fn with_config(provider: Arc<dyn NewsProvider>, config: AggregatorConfig) -> Self {
        Self { provider, config }
    }

    /// Aggregate news for a set of tickers.
    ///
    /// One fetch per distinct ticker, issued concurrently; each may fail
    /// independently. Results are flattened in ticker order, sorted by
    /// `datetime` descending (stable, so equal timestamps keep fetch order)
    /// and deduplicated on the (headline, source, datetime) triple.
    pub async fn fetch_for_tickers(
        &self,
        tickers: &[String],
    ) -> Result<AggregatedNews, PipelineError> {
        let tickers = dedupe_tickers(tickers);
        if tickers.is_empty() {
            return Err(PipelineError::Validation(
                "At least one ticker is required.".to_string(),
            ));
        }

        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(self.config.window_days);

        let fetches = tickers.iter().map(|ticker| {
            let provider = Arc::clone(&self.provider);
            async move {
                match tokio::time::timeout(
                    self.config.fetch_timeout,
                    provider.company_news(ticker, from, to),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::Transient(format!(
                        "news fetch for {ticker} timed out"
                    ))),
                }
            }
        });

        let mut items = Vec::new();
        let mut failed = Vec::new();
        for (ticker, outcome) in tickers.iter().zip(join_all(fetches).await) {
            match outcome {
                Ok(batch) => items.extend(batch),
                Err(e) => {
                    tracing::warn!(%ticker, error = %e, "per-ticker news fetch failed");
                    failed.push(TickerFailure {
                        ticker: ticker.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if failed.len() == tickers.len() {
            return Err(PipelineError::Transient(format!(
                "all {} news fetches failed: {}",
                tickers.len(),
                failed[0].error
            )));
        }

        Ok(AggregatedNews::new(normalize(items), failed))
    }

    /// Single-fetch market/category news. An empty result is an empty
    /// success, not an error; the consumer shows its own "no news" state.
    pub async fn fetch_market_news(
        &self,
        category: &str,
    ) -> Result<AggregatedNews, PipelineError> {
        let category = category.trim();
        if category.is_empty() {
            return Err(PipelineError::Validation(
                "A news category is required.".to_string(),
            ));
        }

        let items = match tokio::time::timeout(
            self.config.fetch_timeout,
            self.provider.latest_by_category(category),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(PipelineError::Transient(format!(
                    "market news fetch for {category} timed out"
                )))
            }
        };

        Ok(AggregatedNews::new(normalize(items), Vec::new()))
    }
}

/// Uppercase, drop blanks, keep first occurrence in caller order.
fn dedupe_tickers(tickers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers
        .iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Sort by recency (stable) and drop exact-triple duplicates, keeping the
/// first occurrence after the sort.
fn normalize(mut items: Vec<NewsItem>) -> Vec<NewsItem> {
    items.sort_by(|a, b| b.datetime.cmp(&a.datetime));

    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(item.key()));
    items
}
