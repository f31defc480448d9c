//! Hand-rolled provider fakes with call counters, shared by the module tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use pipeline_core::{
    NewsItem, NewsProvider, PipelineError, QuoteProvider, QuoteSnapshot, SentimentLabel,
    SentimentScorer, SentimentVerdict, SymbolSuggestion,
};

pub fn item(headline: &str, source: &str, datetime: i64) -> NewsItem {
    NewsItem {
        id: None,
        headline: Some(headline.to_string()),
        summary: None,
        source: source.to_string(),
        datetime,
        url: None,
        image: None,
        category: None,
        related: vec![],
        sentiment: None,
    }
}

#[derive(Default)]
pub struct MockNewsProvider {
    company: HashMap<String, Vec<NewsItem>>,
    market: HashMap<String, Vec<NewsItem>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    pub company_calls: Arc<AtomicUsize>,
}

impl MockNewsProvider {
    pub fn with_company_news(mut self, ticker: &str, items: Vec<NewsItem>) -> Self {
        self.company.insert(ticker.to_uppercase(), items);
        self
    }

    pub fn with_market_news(mut self, category: &str, items: Vec<NewsItem>) -> Self {
        self.market.insert(category.to_string(), items);
        self
    }

    pub fn with_failure(mut self, ticker: &str) -> Self {
        self.failing.insert(ticker.to_uppercase());
        self
    }

    pub fn with_hang(mut self, ticker: &str) -> Self {
        self.hanging.insert(ticker.to_uppercase());
        self
    }
}

#[async_trait]
impl NewsProvider for MockNewsProvider {
    async fn latest_by_category(&self, category: &str) -> Result<Vec<NewsItem>, PipelineError> {
        self.market
            .get(category)
            .cloned()
            .ok_or_else(|| PipelineError::Transient(format!("no fixture for {category}")))
    }

    async fn company_news(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<NewsItem>, PipelineError> {
        self.company_calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.contains(symbol) {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if self.failing.contains(symbol) {
            return Err(PipelineError::Transient(format!("{symbol} fetch refused")));
        }
        Ok(self.company.get(symbol).cloned().unwrap_or_default())
    }
}

/// Scripted sentiment scorer. Counts calls; optionally fails or stalls to
/// let tests provoke fallback and overlap.
pub struct MockScorer {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
    pub delay: Option<Duration>,
    pub verdict: SentimentVerdict,
    pub seen: Mutex<Vec<(String, String)>>,
}

impl Default for MockScorer {
    fn default() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
            delay: None,
            verdict: SentimentVerdict::new(SentimentLabel::Positive, 0.9),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SentimentScorer for MockScorer {
    async fn analyze(&self, text: &str, ticker: &str) -> Result<SentimentVerdict, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((text.to_string(), ticker.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(PipelineError::Transient("scorer unreachable".to_string()));
        }
        Ok(self.verdict)
    }
}

#[derive(Default)]
pub struct MockQuoteProvider {
    names: HashMap<String, String>,
    pub quote_calls: Arc<AtomicUsize>,
}

impl MockQuoteProvider {
    pub fn with_name(mut self, symbol: &str, name: &str) -> Self {
        self.names.insert(symbol.to_uppercase(), name.to_string());
        self
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn quote(&self, symbol: &str) -> Result<QuoteSnapshot, PipelineError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        match self.names.get(&symbol.to_uppercase()) {
            Some(name) => Ok(QuoteSnapshot {
                symbol: symbol.to_uppercase(),
                name: Some(name.clone()),
                price: Some(100.0),
                currency: Some("USD".to_string()),
            }),
            None => Err(PipelineError::Transient(format!("unknown symbol {symbol}"))),
        }
    }

    async fn search(&self, _query: &str) -> Result<Vec<SymbolSuggestion>, PipelineError> {
        Ok(Vec::new())
    }
}
