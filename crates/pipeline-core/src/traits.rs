use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{NewsItem, PipelineError, QuoteSnapshot, SentimentVerdict, SymbolSuggestion};

/// Trait for news sources (Finnhub in production).
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Latest market news for a category ("general", "business", ...).
    async fn latest_by_category(&self, category: &str) -> Result<Vec<NewsItem>, PipelineError>;

    /// Company news for one symbol within a date window (inclusive).
    async fn company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsItem>, PipelineError>;
}

/// Trait for quote/search sources (Yahoo Finance in production).
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, PipelineError>;

    async fn search(&self, query: &str) -> Result<Vec<SymbolSuggestion>, PipelineError>;
}

/// Trait for sentiment scoring backends (the FinBERT microservice in
/// production).
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    /// Score `text` in the context of `ticker`. Implementations apply their
    /// own bounded timeout; callers decide how to degrade on failure.
    async fn analyze(&self, text: &str, ticker: &str) -> Result<SentimentVerdict, PipelineError>;
}
