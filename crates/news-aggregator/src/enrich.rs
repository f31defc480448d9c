use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures_util::future::join_all;
use pipeline_core::{ArticleKey, NewsItem, SentimentScorer, SentimentVerdict};
use tokio::sync::OnceCell;

/// Ticker context used when an article has no related tickers and the caller
/// supplied no symbol.
const GENERAL_CONTEXT: &str = "general market";

/// Memo table bounds for a long-lived server process. Articles age out with
/// the news look-back window; the cap is a hard stop regardless of age.
const DEFAULT_MEMO_CAP: usize = 4096;
const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

struct MemoEntry {
    cell: Arc<OnceCell<SentimentVerdict>>,
    inserted: Instant,
}

/// Attaches sentiment verdicts to news items, memoized per article.
///
/// Memoization is keyed on the content hash ([`NewsItem::key`]), so a
/// refetched copy of an already-scored article reuses the stored verdict
/// instead of paying for a second model call. Each key is scored at most
/// once at a time: concurrent callers for the same article await the first
/// in-flight analysis rather than racing it.
///
/// The memo table is bounded: expired entries are swept and the oldest
/// evicted once an insert would exceed the cap, so the table never grows
/// with total news volume over the process lifetime.
pub struct SentimentEnricher {
    scorer: Arc<dyn SentimentScorer>,
    verdicts: DashMap<ArticleKey, MemoEntry>,
    memo_cap: usize,
    memo_ttl: Duration,
}

impl SentimentEnricher {
    pub fn new(scorer: Arc<dyn SentimentScorer>) -> Self {
        Self::with_limits(scorer, DEFAULT_MEMO_CAP, DEFAULT_MEMO_TTL)
    }

    pub fn with_limits(
        scorer: Arc<dyn SentimentScorer>,
        memo_cap: usize,
        memo_ttl: Duration,
    ) -> Self {
        Self {
            scorer,
            verdicts: DashMap::new(),
            memo_cap,
            memo_ttl,
        }
    }

    /// Ensure `item` carries a sentiment verdict, returning it.
    ///
    /// Idempotent: an already-scored item is returned as-is, no second
    /// upstream call. A scorer failure degrades to the neutral verdict; the
    /// surrounding news view must keep rendering, so enrichment never
    /// errors. The degradation is logged at warn level because a forced
    /// neutral and a genuine model neutral are different things even though
    /// the consumer sees the same value.
    pub async fn ensure_sentiment(
        &self,
        item: &mut NewsItem,
        fallback_symbol: Option<&str>,
    ) -> SentimentVerdict {
        if let Some(existing) = item.sentiment {
            return existing;
        }

        let key = item.key();
        let cell = {
            if !self.verdicts.contains_key(&key) && self.verdicts.len() >= self.memo_cap {
                self.evict();
            }
            let entry = self.verdicts.entry(key.clone()).or_insert_with(|| MemoEntry {
                cell: Arc::new(OnceCell::new()),
                inserted: Instant::now(),
            });
            Arc::clone(&entry.cell)
        };

        let verdict = *cell
            .get_or_init(|| async {
                let text = item.analysis_text();
                let ticker = item
                    .related
                    .first()
                    .map(String::as_str)
                    .or(fallback_symbol)
                    .unwrap_or(GENERAL_CONTEXT);

                match self.scorer.analyze(&text, ticker).await {
                    Ok(verdict) => verdict,
                    Err(e) => {
                        tracing::warn!(
                            article = %key,
                            error = %e,
                            "sentiment scoring failed, degrading to neutral"
                        );
                        SentimentVerdict::neutral()
                    }
                }
            })
            .await;

        item.sentiment = Some(verdict);
        verdict
    }

    /// Drop expired entries, then the oldest until a new insert fits under
    /// the cap. Callers already holding a cell keep their in-flight
    /// computation; only the memo is lost. Concurrent inserts can overshoot
    /// by a few entries; the bound is reapplied on the next insert.
    fn evict(&self) {
        let ttl = self.memo_ttl;
        self.verdicts.retain(|_, entry| entry.inserted.elapsed() < ttl);
        if self.verdicts.len() < self.memo_cap {
            return;
        }

        let mut by_age: Vec<(ArticleKey, Instant)> = self
            .verdicts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().inserted))
            .collect();
        by_age.sort_by_key(|(_, inserted)| *inserted);

        let excess = by_age.len() + 1 - self.memo_cap;
        for (key, _) in by_age.into_iter().take(excess) {
            self.verdicts.remove(&key);
        }
    }

    #[cfg(test)]
    fn memo_len(&self) -> usize {
        self.verdicts.len()
    }

    /// Batch variant used on the server-side aggregation path: score every
    /// item concurrently before the response goes out. Per-item failures
    /// degrade that item to neutral and never fail the batch.
    pub async fn enrich_all(
        &self,
        items: Vec<NewsItem>,
        fallback_symbol: Option<&str>,
    ) -> Vec<NewsItem> {
        let futures = items.into_iter().map(|mut item| async move {
            self.ensure_sentiment(&mut item, fallback_symbol).await;
            item
        });
        join_all(futures).await
    }
}
