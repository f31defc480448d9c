use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single news article as surfaced to consumers.
///
/// `datetime` is Unix seconds and is the sole sort key for aggregated lists.
/// `sentiment` is absent until the enrichment stage attaches a verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Upstream identifier, kept verbatim for display when the provider sends
    /// one. Never used for memoization; see [`NewsItem::key`].
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub source: String,
    pub datetime: i64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentVerdict>,
}

impl NewsItem {
    /// Stable content-derived identity: hash of (headline, source, datetime).
    ///
    /// Two fetches of the same underlying article always produce the same
    /// key, which is what sentiment memoization and deduplication are keyed
    /// off. Upstream ids are unreliable for this: some providers omit them
    /// entirely.
    pub fn key(&self) -> ArticleKey {
        let mut hasher = Sha256::new();
        hasher.update(self.headline.as_deref().unwrap_or(""));
        hasher.update([0u8]);
        hasher.update(&self.source);
        hasher.update([0u8]);
        hasher.update(self.datetime.to_be_bytes());
        ArticleKey(hex::encode(hasher.finalize()))
    }

    /// Text handed to the sentiment scorer: headline and summary joined with
    /// ". ", skipping whichever is absent.
    pub fn analysis_text(&self) -> String {
        match (self.headline.as_deref(), self.summary.as_deref()) {
            (Some(h), Some(s)) => format!("{}. {}", h, s),
            (Some(h), None) => h.to_string(),
            (None, Some(s)) => s.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// Content-hash identity of an article, stable across refetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArticleKey(pub String);

impl std::fmt::Display for ArticleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Polarity classification for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

/// A {label, score} sentiment classification. The score is a confidence
/// magnitude in [0, 1]; direction is carried by the label.
///
/// Verdicts are immutable values. Re-analysis produces a new verdict, never
/// an in-place mutation, so concurrent enrichment of the same item can't
/// observe a half-written result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    #[serde(rename = "sentiment")]
    pub label: SentimentLabel,
    #[serde(rename = "sentiment_score")]
    pub score: f64,
}

impl SentimentVerdict {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        Self {
            label,
            score: score.clamp(0.0, 1.0),
        }
    }

    /// The degradation value used when the scorer is unreachable.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }
}

/// Point-in-time quote for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
}

/// One row of a symbol-search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSuggestion {
    pub symbol: String,
    pub name: String,
}

/// Outcome of a single per-ticker fetch inside an aggregation batch.
#[derive(Debug, Clone, Serialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(headline: &str, source: &str, datetime: i64) -> NewsItem {
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

    #[test]
    fn key_is_stable_across_refetches() {
        let a = item("Apple beats estimates", "Reuters", 1_700_000_000);
        let mut b = item("Apple beats estimates", "Reuters", 1_700_000_000);
        // Upstream id differs between fetches; the key must not.
        b.id = Some("volatile-123".to_string());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_distinguishes_content() {
        let a = item("Apple beats estimates", "Reuters", 1_700_000_000);
        let b = item("Apple beats estimates", "Reuters", 1_700_000_001);
        let c = item("Apple beats estimates", "Bloomberg", 1_700_000_000);
        assert_ne!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn analysis_text_skips_absent_parts() {
        let mut it = item("Headline", "src", 0);
        assert_eq!(it.analysis_text(), "Headline");
        it.summary = Some("Summary".to_string());
        assert_eq!(it.analysis_text(), "Headline. Summary");
        it.headline = None;
        assert_eq!(it.analysis_text(), "Summary");
    }

    #[test]
    fn verdict_score_is_clamped() {
        assert_eq!(SentimentVerdict::new(SentimentLabel::Positive, 1.7).score, 1.0);
        assert_eq!(SentimentVerdict::new(SentimentLabel::Negative, -0.3).score, 0.0);
    }

    #[test]
    fn verdict_serializes_with_wire_names() {
        let v = SentimentVerdict::new(SentimentLabel::Positive, 0.91);
        let json = serde_json::to_value(v).unwrap();
        assert_eq!(json["sentiment"], "positive");
        assert!((json["sentiment_score"].as_f64().unwrap() - 0.91).abs() < 1e-9);
    }
}
